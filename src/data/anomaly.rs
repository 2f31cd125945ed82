//! Feed anomaly detection
//!
//! Advisory checks over a window of rounds. Findings are reported and
//! logged, they never change what the engine decides.

use crate::types::{Color, Outcome};
use serde::{Deserialize, Serialize};

/// Thresholds for the anomaly check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Rounds required before white frequency is judged
    pub min_samples: usize,
    /// White share above this percentage is suspicious
    pub white_high_pct: f64,
    /// White share below this percentage is suspicious
    pub white_low_pct: f64,
    /// Longest acceptable run of one color
    pub max_run: usize,
    /// Consecutive rounds closer than this are implausible
    pub min_interval_secs: i64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_samples: 100,
            white_high_pct: 5.0,
            white_low_pct: 0.5,
            max_run: 15,
            min_interval_secs: 10,
        }
    }
}

/// Type of anomaly detected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Anomaly {
    /// White share outside the expected band
    WhiteFrequency { pct: f64, samples: usize },
    /// Too many identical colors in a row
    LongRun { color: Color, length: usize, ending_id: String },
    /// Two rounds implausibly close together
    TimestampsTooClose { id: String, gap_millis: i64 },
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::WhiteFrequency { pct, samples } => {
                write!(f, "white frequency {:.2}% over {} rounds", pct, samples)
            }
            Anomaly::LongRun { color, length, ending_id } => {
                write!(f, "{} rounds of {} ending at {}", length, color, ending_id)
            }
            Anomaly::TimestampsTooClose { id, gap_millis } => {
                write!(f, "round {} only {}ms after the previous one", id, gap_millis)
            }
        }
    }
}

/// Result of inspecting a window of rounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedReport {
    pub samples: usize,
    pub white_pct: Option<f64>,
    pub anomalies: Vec<Anomaly>,
}

impl FeedReport {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// Stateless feed inspector
#[derive(Debug, Clone, Default)]
pub struct FeedInspector {
    config: AnomalyConfig,
}

impl FeedInspector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Inspect rounds ordered oldest to newest
    pub fn inspect(&self, outcomes: &[Outcome]) -> FeedReport {
        let mut anomalies = Vec::new();

        let white_pct = if outcomes.is_empty() {
            None
        } else {
            let whites = outcomes.iter().filter(|o| o.color.is_rare()).count();
            Some(whites as f64 / outcomes.len() as f64 * 100.0)
        };

        if let Some(pct) = white_pct {
            if outcomes.len() >= self.config.min_samples
                && (pct > self.config.white_high_pct || pct < self.config.white_low_pct)
            {
                anomalies.push(Anomaly::WhiteFrequency {
                    pct,
                    samples: outcomes.len(),
                });
            }
        }

        anomalies.extend(self.long_runs(outcomes));

        let min_gap = self.config.min_interval_secs * 1000;
        for pair in outcomes.windows(2) {
            let gap_millis = (pair[1].timestamp - pair[0].timestamp).num_milliseconds();
            if gap_millis < min_gap {
                anomalies.push(Anomaly::TimestampsTooClose {
                    id: pair[1].id.clone(),
                    gap_millis,
                });
            }
        }

        FeedReport {
            samples: outcomes.len(),
            white_pct,
            anomalies,
        }
    }

    fn long_runs(&self, outcomes: &[Outcome]) -> Vec<Anomaly> {
        let mut found = Vec::new();
        let mut start = 0;

        for end in 1..=outcomes.len() {
            let run_ends = end == outcomes.len() || outcomes[end].color != outcomes[start].color;
            if !run_ends {
                continue;
            }
            let length = end - start;
            if length > self.config.max_run {
                found.push(Anomaly::LongRun {
                    color: outcomes[start].color,
                    length,
                    ending_id: outcomes[end - 1].id.clone(),
                });
            }
            start = end;
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::OutcomeGenerator;

    #[test]
    fn test_anomaly_config_default() {
        let config = AnomalyConfig::default();
        assert_eq!(config.min_samples, 100);
        assert_eq!(config.max_run, 15);
        assert_eq!(config.min_interval_secs, 10);
    }

    #[test]
    fn test_clean_feed() {
        let mut gen = OutcomeGenerator::new();
        // 2 whites in 100 rounds, alternating otherwise
        let mut colors = Vec::new();
        for i in 0..100 {
            colors.push(if i == 30 || i == 70 {
                Color::White
            } else if i % 2 == 0 {
                Color::Red
            } else {
                Color::Black
            });
        }
        let outcomes = gen.outcomes(&colors);

        let report = FeedInspector::default().inspect(&outcomes);
        assert!(report.is_clean(), "{:?}", report.anomalies);
        assert_eq!(report.samples, 100);
        assert!((report.white_pct.unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_white_frequency_needs_enough_samples() {
        let mut gen = OutcomeGenerator::new();
        let outcomes = gen.from_text("RBRBRBRBRB");
        let report = FeedInspector::default().inspect(&outcomes);
        assert!(report.is_clean());
        assert_eq!(report.white_pct, Some(0.0));
    }

    #[test]
    fn test_white_frequency_too_low() {
        let mut gen = OutcomeGenerator::new();
        let text: String = "RB".repeat(60);
        let outcomes = gen.from_text(&text);

        let report = FeedInspector::default().inspect(&outcomes);
        assert!(report
            .anomalies
            .iter()
            .any(|a| matches!(a, Anomaly::WhiteFrequency { samples: 120, .. })));
    }

    #[test]
    fn test_white_frequency_too_high() {
        let mut gen = OutcomeGenerator::new();
        let text: String = "RBRBRBRBRW".repeat(10);
        let outcomes = gen.from_text(&text);

        let report = FeedInspector::default().inspect(&outcomes);
        let found = report.anomalies.iter().find_map(|a| match a {
            Anomaly::WhiteFrequency { pct, .. } => Some(*pct),
            _ => None,
        });
        assert!((found.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_run_detected() {
        let mut gen = OutcomeGenerator::new();
        let text = format!("B{}B", "R".repeat(16));
        let outcomes = gen.from_text(&text);

        let report = FeedInspector::default().inspect(&outcomes);
        assert_eq!(report.anomalies.len(), 1);
        match &report.anomalies[0] {
            Anomaly::LongRun { color, length, ending_id } => {
                assert_eq!(*color, Color::Red);
                assert_eq!(*length, 16);
                assert_eq!(ending_id, &outcomes[16].id);
            }
            other => panic!("unexpected anomaly {:?}", other),
        }
    }

    #[test]
    fn test_run_of_fifteen_is_fine() {
        let mut gen = OutcomeGenerator::new();
        let outcomes = gen.from_text(&"B".repeat(15));
        assert!(FeedInspector::default().inspect(&outcomes).is_clean());
    }

    #[test]
    fn test_timestamps_too_close() {
        let mut gen = OutcomeGenerator::new().with_step_secs(30);
        let mut outcomes = gen.from_text("RBR");
        outcomes[2].timestamp = outcomes[1].timestamp + chrono::Duration::seconds(4);

        let report = FeedInspector::default().inspect(&outcomes);
        assert_eq!(
            report.anomalies,
            vec![Anomaly::TimestampsTooClose {
                id: outcomes[2].id.clone(),
                gap_millis: 4000,
            }]
        );
    }
}
