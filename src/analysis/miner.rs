//! Sliding-window pattern mining
//!
//! Every window of `min_window..=max_window` consecutive colors is keyed by
//! its exact sequence and votes for the color that immediately follows it.
//! Windows seen often enough whose plurality follower is reliable enough
//! become [`Pattern`]s. Mining is pure and recomputed from scratch.

use super::vote::Tally;
use crate::config::MinerConfig;
use crate::types::{Color, Outcome, Pattern};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Followers observed for one window sequence
struct WindowGroup<'a> {
    sequence: &'a [Color],
    followers: Tally<Color>,
    last_seen: DateTime<Utc>,
}

impl<'a> WindowGroup<'a> {
    fn new(sequence: &'a [Color], first_seen: DateTime<Utc>) -> Self {
        Self {
            sequence,
            followers: Tally::new(),
            last_seen: first_seen,
        }
    }

    fn record(&mut self, follower: Color, at: DateTime<Utc>) {
        self.followers.add(follower);
        if at > self.last_seen {
            self.last_seen = at;
        }
    }

    fn into_pattern(self, config: &MinerConfig) -> Option<Pattern> {
        let occurrences = self.followers.total();
        if occurrences < config.min_occurrences {
            return None;
        }

        let (next, hits) = self.followers.winner()?;
        let accuracy = hits as f64 / occurrences as f64 * 100.0;
        if accuracy <= config.min_accuracy {
            return None;
        }

        Some(Pattern {
            sequence: self.sequence.to_vec(),
            occurrences,
            accuracy,
            next,
            last_seen: self.last_seen,
        })
    }
}

/// Pattern miner over the outcome log
#[derive(Debug, Clone)]
pub struct PatternMiner {
    config: MinerConfig,
}

impl PatternMiner {
    pub fn new(config: MinerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Mine the retained pattern set from a log ordered oldest to newest
    pub fn mine(&self, history: &[Outcome]) -> Vec<Pattern> {
        let colors: Vec<Color> = history.iter().map(|o| o.color).collect();
        let mut patterns = Vec::new();

        for window in self.config.min_window.max(1)..=self.config.max_window {
            // a window needs at least one follower
            if colors.len() <= window {
                break;
            }

            let mut groups: Vec<WindowGroup<'_>> = Vec::new();
            let mut index: HashMap<&[Color], usize> = HashMap::new();

            for start in 0..colors.len() - window {
                let key = &colors[start..start + window];
                let follower_at = start + window;
                let timestamp = history[follower_at].timestamp;

                let slot = match index.get(key) {
                    Some(&slot) => slot,
                    None => {
                        groups.push(WindowGroup::new(key, timestamp));
                        index.insert(key, groups.len() - 1);
                        groups.len() - 1
                    }
                };
                groups[slot].record(colors[follower_at], timestamp);
            }

            patterns.extend(groups.into_iter().filter_map(|g| g.into_pattern(&self.config)));
        }

        // stable sort keeps shorter windows and earlier groups first on ties
        patterns.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
        patterns.truncate(self.config.max_patterns);

        tracing::debug!(
            "Mined {} patterns from {} outcomes",
            patterns.len(),
            history.len()
        );

        patterns
    }
}

impl Default for PatternMiner {
    fn default() -> Self {
        Self::new(MinerConfig::default())
    }
}
