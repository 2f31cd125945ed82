//! Synthetic round feed
//!
//! Rolls are uniform over 1..=14 except for the rare White (roll 0), which
//! comes up with the configured probability.

use super::OutcomeSource;
use crate::config::SimulationConfig;
use crate::data::RawOutcome;
use crate::error::{PredictorError, Result};
use crate::types::Color;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct SimState {
    rng: StdRng,
    /// Timestamp of the next live round
    clock: DateTime<Utc>,
    generated: u64,
}

/// Offline stand-in for the live feed
pub struct SimulatedSource {
    white_probability: f64,
    step: Duration,
    state: Mutex<SimState>,
}

impl SimulatedSource {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            white_probability: config.white_probability.clamp(0.0, 1.0),
            step: Duration::seconds(config.round_secs.clamp(1, i64::MAX / 1000)),
            state: Mutex::new(SimState {
                rng,
                clock: Utc::now(),
                generated: 0,
            }),
        }
    }

    /// Start the simulated clock at a fixed instant
    pub fn starting_at(self, at: DateTime<Utc>) -> Self {
        self.state.lock().clock = at;
        self
    }

    /// Rounds produced so far
    pub fn generated(&self) -> u64 {
        self.state.lock().generated
    }

    fn roll(&self, state: &mut SimState, at: DateTime<Utc>) -> RawOutcome {
        let roll = if state.rng.random_bool(self.white_probability) {
            0
        } else {
            state.rng.random_range(1..=14u8)
        };
        let color = Color::from_roll(roll).unwrap_or(Color::White);
        state.generated += 1;

        RawOutcome::from_parts(&uuid::Uuid::new_v4().to_string(), color, roll, at)
    }
}

#[async_trait]
impl OutcomeSource for SimulatedSource {
    fn name(&self) -> &'static str {
        "simulated"
    }

    /// History ends one step before the live clock and leaves the clock alone
    async fn fetch_history(&self, limit: usize) -> Result<Vec<RawOutcome>> {
        let mut state = self.state.lock();
        let steps = i32::try_from(limit).ok();
        let start = steps
            .and_then(|n| self.step.checked_mul(n))
            .and_then(|span| state.clock.checked_sub_signed(span))
            .ok_or_else(|| {
                PredictorError::SourceUnavailable(format!(
                    "cannot backfill {} simulated rounds of {}s",
                    limit,
                    self.step.num_seconds()
                ))
            })?;

        let rounds = (0..steps.unwrap_or_default())
            .map(|i| {
                let at = start + self.step * i;
                self.roll(&mut state, at)
            })
            .collect();

        Ok(rounds)
    }

    async fn fetch_latest(&self) -> Result<Option<RawOutcome>> {
        let mut state = self.state.lock();
        let at = state.clock;
        state.clock = at + self.step;
        Ok(Some(self.roll(&mut state, at)))
    }

    async fn check_availability(&self) -> bool {
        true
    }
}
