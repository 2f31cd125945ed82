//! Signal scoring with running accuracy, streak and simulated profit


use crate::config::ScoringConfig;
use crate::types::{Outcome, RunningStats, Settlement, Signal};
use std::collections::VecDeque;

/// Reconciles bet signals against the rounds that follow them
#[derive(Debug, Clone)]
pub struct OutcomeScorer {
    config: ScoringConfig,
    stats: RunningStats,
    /// Most recent settlements, newest last
    recent: VecDeque<Settlement>,
}

impl OutcomeScorer {
    pub fn new(config: ScoringConfig) -> Self {
        let capacity = config.recent_settlements;
        Self {
            config,
            stats: RunningStats::default(),
            recent: VecDeque::with_capacity(capacity),
        }
    }

    /// Score `outcome` against the signal that was current before it arrived.
    ///
    /// Returns `None` and leaves the outcome untagged when the prior signal was
    /// not a bet.
    pub fn score(&mut self, prior: &Signal, outcome: &mut Outcome) -> Option<Settlement> {
        let predicted = prior.bet_color()?;

        if outcome.was_scored.is_some() {
            tracing::warn!("Outcome {} already scored, skipping", outcome.id);
            return None;
        }

        let correct = predicted == outcome.color;
        outcome.was_scored = Some(true);
        outcome.was_correct = Some(correct);

        self.record(correct);

        let settlement = Settlement {
            outcome_id: outcome.id.clone(),
            predicted,
            actual: outcome.color,
            confidence: prior.confidence,
            source: prior.source,
            correct,
            entry_delay: prior.entry_delay,
            settled_at: outcome.timestamp,
        };

        self.push_recent(settlement.clone());
        Some(settlement)
    }

    fn record(&mut self, correct: bool) {
        let stats = &mut self.stats;
        stats.total += 1;

        if correct {
            stats.correct += 1;
            stats.greens += 1;
            stats.streak += 1;
            stats.profit += self.config.win_credit;
        } else {
            stats.reds += 1;
            stats.streak = 0;
            stats.profit -= self.config.loss_debit;
        }

        stats.best_streak = stats.best_streak.max(stats.streak);
        stats.accuracy = stats.correct as f64 / stats.total as f64 * 100.0;
    }

    fn push_recent(&mut self, settlement: Settlement) {
        if self.config.recent_settlements == 0 {
            return;
        }
        while self.recent.len() >= self.config.recent_settlements {
            self.recent.pop_front();
        }
        self.recent.push_back(settlement);
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    /// Recent settlements, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &Settlement> {
        self.recent.iter()
    }

    /// Restore persisted stats
    pub fn restore_stats(&mut self, stats: RunningStats) {
        self.stats = stats;
    }

    /// Restore persisted settlements (oldest first), keeping only the newest
    pub fn restore_settlements(&mut self, settlements: Vec<Settlement>) {
        self.recent.clear();
        for settlement in settlements {
            self.push_recent(settlement);
        }
    }

    pub fn reset(&mut self) {
        self.stats = RunningStats::default();
        self.recent.clear();
    }
}

impl Default for OutcomeScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}
