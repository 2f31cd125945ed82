//! Test Data Generators
//!
//! Utilities for generating outcome logs

use crate::data::RawOutcome;
use crate::types::{Color, Outcome};
use chrono::{DateTime, Duration, Utc};

/// Parse compact color text such as `"RBRW"`. Unknown characters are skipped.
pub fn colors(text: &str) -> Vec<Color> {
    text.chars()
        .filter_map(|c| match c.to_ascii_uppercase() {
            'R' => Some(Color::Red),
            'B' => Some(Color::Black),
            'W' => Some(Color::White),
            _ => None,
        })
        .collect()
}

/// Generator for test outcomes with increasing timestamps
pub struct OutcomeGenerator {
    counter: u32,
    clock: DateTime<Utc>,
    step: Duration,
}

impl OutcomeGenerator {
    /// Starts at 2024-01-01T00:00:00Z, 30 seconds per round
    pub fn new() -> Self {
        Self {
            counter: 0,
            clock: DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default(),
            step: Duration::seconds(30),
        }
    }

    pub fn with_step_secs(mut self, secs: i64) -> Self {
        self.step = Duration::seconds(secs);
        self
    }

    pub fn starting_at(mut self, at: DateTime<Utc>) -> Self {
        self.clock = at;
        self
    }

    /// A plausible roll for a color
    pub fn roll_for(&self, color: Color) -> u8 {
        match color {
            Color::White => 0,
            Color::Red => (self.counter % 7) as u8 + 1,
            Color::Black => (self.counter % 7) as u8 + 8,
        }
    }

    /// Generate one outcome
    pub fn outcome(&mut self, color: Color) -> Outcome {
        self.counter += 1;
        self.clock += self.step;
        Outcome::new(
            format!("round_{}", self.counter),
            color,
            self.roll_for(color),
            self.clock,
        )
    }

    /// Generate one raw feed round
    pub fn raw(&mut self, color: Color) -> RawOutcome {
        let outcome = self.outcome(color);
        RawOutcome::from_parts(&outcome.id, outcome.color, outcome.roll, outcome.timestamp)
    }

    /// Generate outcomes for a color sequence
    pub fn outcomes(&mut self, colors: &[Color]) -> Vec<Outcome> {
        colors.iter().map(|&c| self.outcome(c)).collect()
    }

    /// Generate outcomes from compact color text
    pub fn from_text(&mut self, text: &str) -> Vec<Outcome> {
        self.outcomes(&colors(text))
    }

    /// Generate raw rounds from compact color text
    pub fn raw_from_text(&mut self, text: &str) -> Vec<RawOutcome> {
        colors(text).into_iter().map(|c| self.raw(c)).collect()
    }
}

impl Default for OutcomeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
