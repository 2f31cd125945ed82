//! Signal aggregation
//!
//! Turns the ranked candidate list of one analysis pass into a single
//! bet/wait decision using consensus on the top candidate's color.


use crate::analysis::Tally;
use crate::config::StrategyConfig;
use crate::types::{CandidatePrediction, EntryDelay, Signal, SignalAction, SignalStrategy};

/// Consensus-based signal generator
#[derive(Debug, Clone)]
pub struct SignalAggregator {
    config: StrategyConfig,
}

impl SignalAggregator {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    /// Aggregate candidates sorted by confidence, highest first
    pub fn aggregate(&self, candidates: &[CandidatePrediction]) -> Signal {
        let Some(top) = candidates.first() else {
            return Signal::insufficient_data();
        };

        let target = top.color;
        let agreeing: Vec<&CandidatePrediction> =
            candidates.iter().filter(|c| c.color == target).collect();
        let consensus = agreeing.len();
        let average = agreeing.iter().map(|c| c.confidence).sum::<f64>() / consensus as f64;

        let mut delays = Tally::seeded(EntryDelay::ALL);
        delays.extend(agreeing.iter().map(|c| c.entry_delay));
        let entry_delay = delays
            .winner()
            .map(|(delay, _)| delay)
            .unwrap_or(EntryDelay::Immediate);

        let sources = agreeing
            .iter()
            .map(|c| c.source.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let strategy = if average >= self.config.high_confidence && consensus >= self.config.min_consensus {
            SignalStrategy::HighConfidence
        } else if average >= self.config.medium_confidence {
            SignalStrategy::MediumConfidence
        } else {
            SignalStrategy::LowConfidence
        };

        match strategy {
            SignalStrategy::HighConfidence | SignalStrategy::MediumConfidence => Signal {
                action: SignalAction::Bet,
                color: Some(target),
                confidence: average,
                strategy,
                reason: format!(
                    "{} of {} heuristics agree on {} ({}): {}",
                    consensus,
                    candidates.len(),
                    target,
                    sources,
                    top.reason
                ),
                entry_delay,
                wait_rounds: entry_delay.rounds(),
                source: Some(top.source),
                consensus,
            },
            _ => Signal {
                action: SignalAction::Wait,
                color: None,
                confidence: average,
                strategy,
                reason: format!(
                    "Average confidence {:.1} for {} is below {:.0}",
                    average, target, self.config.medium_confidence
                ),
                entry_delay: EntryDelay::Immediate,
                wait_rounds: 0,
                source: Some(top.source),
                consensus,
            },
        }
    }
}

impl Default for SignalAggregator {
    fn default() -> Self {
        Self::new(StrategyConfig::default())
    }
}
