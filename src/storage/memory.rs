//! In-process store used by the simulator and tests

use super::OutcomeStore;
use crate::error::Result;
use crate::types::{Outcome, Pattern, RunningStats, Settlement};
use async_trait::async_trait;
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct State {
    outcomes: Vec<Outcome>,
    patterns: Vec<Pattern>,
    stats: Option<RunningStats>,
    settlements: Vec<Settlement>,
}

/// Volatile store with the same semantics as [`super::Database`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with an outcome log
    pub fn with_outcomes(outcomes: Vec<Outcome>) -> Self {
        Self {
            state: RwLock::new(State {
                outcomes,
                ..State::default()
            }),
        }
    }

    pub fn outcome_count(&self) -> usize {
        self.state.read().outcomes.len()
    }
}

#[async_trait]
impl OutcomeStore for MemoryStore {
    async fn load_outcomes(&self) -> Result<Vec<Outcome>> {
        Ok(self.state.read().outcomes.clone())
    }

    async fn save_outcomes(&self, outcomes: &[Outcome]) -> Result<()> {
        let mut state = self.state.write();
        for outcome in outcomes {
            match state.outcomes.iter_mut().rev().find(|o| o.id == outcome.id) {
                Some(existing) => {
                    existing.was_scored = outcome.was_scored;
                    existing.was_correct = outcome.was_correct;
                }
                None => state.outcomes.push(outcome.clone()),
            }
        }
        Ok(())
    }

    async fn load_patterns(&self) -> Result<Vec<Pattern>> {
        Ok(self.state.read().patterns.clone())
    }

    async fn save_patterns(&self, patterns: &[Pattern]) -> Result<()> {
        self.state.write().patterns = patterns.to_vec();
        Ok(())
    }

    async fn load_stats(&self) -> Result<Option<RunningStats>> {
        Ok(self.state.read().stats.clone())
    }

    async fn save_stats(&self, stats: &RunningStats) -> Result<()> {
        self.state.write().stats = Some(stats.clone());
        Ok(())
    }

    async fn append_settlement(&self, settlement: &Settlement) -> Result<()> {
        self.state.write().settlements.push(settlement.clone());
        Ok(())
    }

    async fn load_settlements(&self) -> Result<Vec<Settlement>> {
        Ok(self.state.read().settlements.clone())
    }
}
