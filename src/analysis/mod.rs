//! Outcome analysis: pattern mining and prediction heuristics
//!
//! One analysis pass is a pure function of the outcome log:
//!
//! ```text
//! outcome log ──► PatternMiner ──► patterns ─┐
//!      │                                     ▼
//!      └────────────────────────────► HeuristicSet ──► candidates ──► SignalAggregator ──► Signal
//! ```

pub mod heuristics;
pub mod miner;
pub mod vote;


pub use heuristics::{
    AnalysisContext, Alternating, FrequencyGap, Heuristic, HeuristicSet, PatternSequence,
    StreakReversal, WhiteGap, RECENT_WINDOW,
};
pub use miner::PatternMiner;
pub use vote::Tally;

use crate::config::{MinerConfig, StrategyConfig};
use crate::strategy::SignalAggregator;
use crate::types::{CandidatePrediction, Color, Outcome, Pattern, Signal};

/// Result of one analysis pass
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub patterns: Vec<Pattern>,
    pub candidates: Vec<CandidatePrediction>,
    pub signal: Signal,
}

/// Mining, heuristics and aggregation wired together
pub struct Analyzer {
    miner: PatternMiner,
    heuristics: HeuristicSet,
    aggregator: SignalAggregator,
}

impl Analyzer {
    pub fn new(miner: MinerConfig, strategy: StrategyConfig) -> Self {
        Self {
            miner: PatternMiner::new(miner),
            heuristics: HeuristicSet::standard(),
            aggregator: SignalAggregator::new(strategy),
        }
    }

    /// Replace the heuristic set (mainly for experiments)
    pub fn with_heuristics(mut self, heuristics: HeuristicSet) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Run a full pass over a snapshot of the log
    pub fn run(&self, history: &[Outcome]) -> Analysis {
        let patterns = self.miner.mine(history);
        let colors: Vec<Color> = history.iter().map(|o| o.color).collect();
        let ctx = AnalysisContext::new(&colors, &patterns);
        let candidates = self.heuristics.evaluate(&ctx);
        let signal = self.aggregator.aggregate(&candidates);

        Analysis {
            patterns,
            candidates,
            signal,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(MinerConfig::default(), StrategyConfig::default())
    }
}
