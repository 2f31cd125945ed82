//! Decision engine
//!
//! Owns the outcome log snapshot and everything derived from it. All
//! mutation goes through `&mut self`, so scoring a new round against the
//! signal that preceded it cannot interleave with another writer.

#[cfg(test)]
mod tests;

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::data::{validate, FeedInspector, FeedReport, RawOutcome};
use crate::error::{PredictorError, Result};
use crate::scoring::OutcomeScorer;
use crate::storage::OutcomeStore;
use crate::types::{CandidatePrediction, Outcome, Pattern, RunningStats, Settlement, Signal};
use std::collections::HashSet;
use std::sync::Arc;

/// What happened to an accepted round
#[derive(Debug, Clone)]
pub struct Recorded {
    pub outcome: Outcome,
    /// Present when the prior signal was a bet
    pub settlement: Option<Settlement>,
}

pub struct Engine {
    analyzer: Analyzer,
    scorer: OutcomeScorer,
    inspector: FeedInspector,
    store: Arc<dyn OutcomeStore>,
    history: Vec<Outcome>,
    seen: HashSet<String>,
    patterns: Vec<Pattern>,
    candidates: Vec<CandidatePrediction>,
    signal: Signal,
}

impl Engine {
    pub fn new(config: &Config, store: Arc<dyn OutcomeStore>) -> Self {
        Self {
            analyzer: Analyzer::new(config.miner.clone(), config.strategy.clone()),
            scorer: OutcomeScorer::new(config.scoring.clone()),
            inspector: FeedInspector::new(config.anomaly.clone()),
            store,
            history: Vec::new(),
            seen: HashSet::new(),
            patterns: Vec::new(),
            candidates: Vec::new(),
            signal: Signal::insufficient_data(),
        }
    }

    /// Load persisted state. Anything that fails to load starts empty.
    pub async fn restore(&mut self) {
        match self.store.load_outcomes().await {
            Ok(outcomes) => {
                self.seen = outcomes.iter().map(|o| o.id.clone()).collect();
                self.history = outcomes;
            }
            Err(e) => tracing::warn!("Failed to load outcomes: {}", e),
        }

        match self.store.load_patterns().await {
            Ok(patterns) => self.patterns = patterns,
            Err(e) => tracing::warn!("Failed to load patterns: {}", e),
        }

        match self.store.load_stats().await {
            Ok(Some(stats)) => self.scorer.restore_stats(stats),
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load stats: {}", e),
        }

        match self.store.load_settlements().await {
            Ok(settlements) => self.scorer.restore_settlements(settlements),
            Err(e) => tracing::warn!("Failed to load settlements: {}", e),
        }

        tracing::info!(
            "Restored {} outcomes, {} patterns, {} scored signals",
            self.history.len(),
            self.patterns.len(),
            self.scorer.stats().total
        );
    }

    /// Validate a raw round and append it
    pub async fn record(&mut self, raw: RawOutcome) -> Result<Recorded> {
        let label = raw.display_id();
        let outcome = validate(raw).map_err(|e| {
            tracing::warn!("Rejected round {}: {}", label, e);
            e
        })?;
        self.append(outcome).await
    }

    /// Append a validated round, then score it against the current signal
    pub async fn append(&mut self, outcome: Outcome) -> Result<Recorded> {
        if self.seen.contains(&outcome.id) {
            return Err(PredictorError::DuplicateOutcome(outcome.id));
        }

        if let Some(last) = self.history.last() {
            if outcome.timestamp < last.timestamp {
                let err = PredictorError::OutOfOrder {
                    id: outcome.id,
                    timestamp: outcome.timestamp,
                    latest: last.timestamp,
                };
                tracing::warn!("{}", err);
                return Err(err);
            }
        }

        self.seen.insert(outcome.id.clone());
        self.history.push(outcome);

        let (outcome, settlement) = match self.history.last_mut() {
            Some(appended) => {
                let settlement = self.scorer.score(&self.signal, appended);
                (appended.clone(), settlement)
            }
            None => return Err(PredictorError::Internal("outcome log empty after append".to_string())),
        };

        match &settlement {
            Some(s) => tracing::info!(
                "Round {} {} | predicted {} | {} | accuracy {:.1}% ({} signals)",
                outcome.id,
                outcome.color,
                s.predicted,
                if s.correct { "GREEN" } else { "RED" },
                self.scorer.stats().accuracy,
                self.scorer.stats().total
            ),
            None => tracing::debug!("Round {} {} recorded", outcome.id, outcome.color),
        }

        self.persist(&outcome, settlement.as_ref()).await;

        Ok(Recorded {
            outcome,
            settlement,
        })
    }

    async fn persist(&self, outcome: &Outcome, settlement: Option<&Settlement>) {
        if let Err(e) = self.store.save_outcomes(std::slice::from_ref(outcome)).await {
            tracing::warn!("Failed to save outcome {}: {}", outcome.id, e);
        }

        if let Some(settlement) = settlement {
            if let Err(e) = self.store.append_settlement(settlement).await {
                tracing::warn!("Failed to save settlement for {}: {}", outcome.id, e);
            }
            if let Err(e) = self.store.save_stats(self.scorer.stats()).await {
                tracing::warn!("Failed to save stats: {}", e);
            }
        }
    }

    /// Run an analysis pass over the current log and replace the signal
    pub async fn analyze(&mut self) -> &Signal {
        let analysis = self.analyzer.run(&self.history);

        self.patterns = analysis.patterns;
        self.candidates = analysis.candidates;
        self.signal = analysis.signal;

        tracing::info!(
            "Analysis over {} rounds: {} patterns, {} candidates -> {} {} ({:.1}%, {})",
            self.history.len(),
            self.patterns.len(),
            self.candidates.len(),
            self.signal.action,
            self.signal
                .color
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.signal.confidence,
            self.signal.strategy
        );

        if let Err(e) = self.store.save_patterns(&self.patterns).await {
            tracing::warn!("Failed to save patterns: {}", e);
        }

        &self.signal
    }

    /// Record a round and immediately re-analyze
    pub async fn ingest(&mut self, raw: RawOutcome) -> Result<Recorded> {
        let recorded = self.record(raw).await?;
        self.analyze().await;
        Ok(recorded)
    }

    /// Anomaly check over the newest `window` rounds
    pub fn inspect_feed(&self, window: usize) -> FeedReport {
        let start = self.history.len().saturating_sub(window);
        let report = self.inspector.inspect(&self.history[start..]);

        for anomaly in &report.anomalies {
            tracing::warn!("Feed anomaly: {}", anomaly);
        }

        report
    }

    pub fn history(&self) -> &[Outcome] {
        &self.history
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn candidates(&self) -> &[CandidatePrediction] {
        &self.candidates
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn stats(&self) -> &RunningStats {
        self.scorer.stats()
    }

    pub fn recent_settlements(&self) -> impl Iterator<Item = &Settlement> {
        self.scorer.recent()
    }
}
