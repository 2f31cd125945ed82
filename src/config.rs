//! Configuration management

use crate::data::AnomalyConfig;
use crate::error::PredictorError;
use chrono::Duration;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub miner: MinerConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Shortest window mined
    pub min_window: usize,
    /// Longest window mined
    pub max_window: usize,
    /// Minimum observations of a window before it can become a pattern
    pub min_occurrences: usize,
    /// Patterns must beat this accuracy (percent, strict)
    pub min_accuracy: f64,
    /// Retained pattern count
    pub max_patterns: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Average confidence for a "High Confidence" bet
    pub high_confidence: f64,
    /// Average confidence for a "Medium Confidence" bet
    pub medium_confidence: f64,
    /// Agreeing candidates required for a "High Confidence" bet
    pub min_consensus: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Simulated profit credited on a correct signal
    pub win_credit: Decimal,
    /// Simulated loss debited on an incorrect signal
    pub loss_debit: Decimal,
    /// Settlements kept in memory for display
    pub recent_settlements: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Round feed base URL
    pub base_url: String,
    /// Path returning the most recent rounds
    pub recent_path: String,
    /// Path returning paged history
    pub history_path: String,
    /// HTTP timeout
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between polls of the round feed
    pub poll_interval_secs: u64,
    /// Pause between recording a round and analyzing it
    pub analysis_delay_ms: u64,
    /// Rounds fetched on startup
    pub backfill_limit: usize,
    /// Run the feed anomaly check every N ingested rounds (0 disables)
    pub anomaly_every: u64,
    /// Rounds inspected by each anomaly check
    pub anomaly_window: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Probability of a white round
    pub white_probability: f64,
    /// Simulated seconds between rounds
    pub round_secs: i64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&path))
            .add_source(config::Environment::with_prefix("DOUBLE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), PredictorError> {
        let miner = &self.miner;
        if miner.min_window == 0 {
            return Err(PredictorError::Config(
                "miner.min_window must be at least 1".to_string(),
            ));
        }
        if miner.min_window > miner.max_window {
            return Err(PredictorError::Config(format!(
                "miner.min_window ({}) exceeds miner.max_window ({})",
                miner.min_window, miner.max_window
            )));
        }
        if !(0.0..=100.0).contains(&miner.min_accuracy) {
            return Err(PredictorError::Config(format!(
                "miner.min_accuracy must be a percentage, got {}",
                miner.min_accuracy
            )));
        }

        if self.strategy.medium_confidence > self.strategy.high_confidence {
            return Err(PredictorError::Config(format!(
                "strategy.medium_confidence ({}) exceeds strategy.high_confidence ({})",
                self.strategy.medium_confidence, self.strategy.high_confidence
            )));
        }

        if self.scoring.win_credit.is_sign_negative() || self.scoring.loss_debit.is_sign_negative() {
            return Err(PredictorError::Config(
                "scoring.win_credit and scoring.loss_debit must not be negative".to_string(),
            ));
        }

        let simulation = &self.simulation;
        if !(0.0..=1.0).contains(&simulation.white_probability) {
            return Err(PredictorError::Config(format!(
                "simulation.white_probability must be within [0, 1], got {}",
                simulation.white_probability
            )));
        }
        if simulation.round_secs < 1 || Duration::try_seconds(simulation.round_secs).is_none() {
            return Err(PredictorError::Config(format!(
                "simulation.round_secs out of range: {}",
                simulation.round_secs
            )));
        }

        Ok(())
    }

    /// Load from default locations, falling back to built-in defaults
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = ["config.toml", "config.yaml", "~/.config/double-signal/config.toml"];

        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            min_window: 3,
            max_window: 10,
            min_occurrences: 5,
            min_accuracy: 65.0,
            max_patterns: 30,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            high_confidence: 75.0,
            medium_confidence: 65.0,
            min_consensus: 2,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            win_credit: Decimal::new(100, 2), // +1.00 unit
            loss_debit: Decimal::new(50, 2),  // -0.50 unit
            recent_settlements: 100,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://blaze.com/api".to_string(),
            recent_path: "roulette_games/recent".to_string(),
            history_path: "roulette_games/history".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "double_signal.db".to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            analysis_delay_ms: 1500,
            backfill_limit: 300,
            anomaly_every: 50,
            anomaly_window: 500,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            white_probability: 0.02,
            round_secs: 30,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_match_engine_constants() {
        let config = Config::default();
        assert_eq!(config.miner.min_window, 3);
        assert_eq!(config.miner.max_window, 10);
        assert_eq!(config.miner.min_occurrences, 5);
        assert_eq!(config.miner.max_patterns, 30);
        assert_eq!(config.strategy.high_confidence, 75.0);
        assert_eq!(config.strategy.medium_confidence, 65.0);
        assert_eq!(config.strategy.min_consensus, 2);
        assert!(config.scoring.win_credit > config.scoring.loss_debit);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scoring]
            win_credit = "2.0"
            loss_debit = "1.0"

            [database]
            path = "/tmp/rounds.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.scoring.win_credit, dec!(2.0));
        assert_eq!(config.scoring.loss_debit, dec!(1.0));
        assert_eq!(config.scoring.recent_settlements, 100);
        assert_eq!(config.database.path, "/tmp/rounds.db");
        assert_eq!(config.miner.min_accuracy, 65.0);
        assert_eq!(config.monitor.poll_interval_secs, 5);
    }

    #[test]
    fn test_simulation_seed_optional() {
        let config: Config = toml::from_str(
            r#"
            [simulation]
            white_probability = 0.05
            seed = 42
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.simulation.white_probability, 0.05);
        assert_eq!(config.simulation.round_secs, 30);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_windows() {
        let config: Config = toml::from_str(
            r#"
            [miner]
            min_window = 6
            max_window = 4
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, PredictorError::Config(ref msg) if msg.contains("max_window")));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.miner.min_window = 0;
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_swapped_thresholds() {
        let mut config = Config::default();
        config.strategy.medium_confidence = 80.0;
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_negative_payoff() {
        let mut config = Config::default();
        config.scoring.loss_debit = dec!(-0.5);
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));
    }

    #[test]
    fn test_validate_simulation_bounds() {
        let mut config = Config::default();
        config.simulation.white_probability = 1.5;
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));

        config.simulation.white_probability = f64::NAN;
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));

        let mut config = Config::default();
        config.simulation.round_secs = 0;
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));

        config.simulation.round_secs = i64::MAX;
        assert!(matches!(config.validate(), Err(PredictorError::Config(_))));
    }

    #[test]
    fn test_load_validates_file() {
        let path = std::env::temp_dir().join(format!("double-signal-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[strategy]\nhigh_confidence = 60.0\n").unwrap();

        let result = Config::load(&path);
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PredictorError>(),
            Some(PredictorError::Config(_))
        ));
    }
}
