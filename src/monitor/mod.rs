//! Live round monitor
//!
//! Drives the engine from an [`OutcomeSource`]:
//! 1. Backfill recent history on startup
//! 2. Poll for the newest round every interval
//! 3. Analyze after a short "thinking" delay
//! 4. Run the feed anomaly check every N rounds

#[cfg(test)]
mod tests;

use crate::client::OutcomeSource;
use crate::config::MonitorConfig;
use crate::engine::{Engine, Recorded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Counters since the monitor was created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub backfilled: u64,
    pub ingested: u64,
    pub rejected: u64,
    pub fetch_failures: u64,
}

pub struct LiveMonitor {
    engine: Arc<Mutex<Engine>>,
    source: Arc<dyn OutcomeSource>,
    config: MonitorConfig,
    backfilled: AtomicU64,
    ingested: AtomicU64,
    rejected: AtomicU64,
    fetch_failures: AtomicU64,
}

impl LiveMonitor {
    pub fn new(engine: Arc<Mutex<Engine>>, source: Arc<dyn OutcomeSource>, config: MonitorConfig) -> Self {
        Self {
            engine,
            source,
            config,
            backfilled: AtomicU64::new(0),
            ingested: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        Arc::clone(&self.engine)
    }

    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            backfilled: self.backfilled.load(Ordering::Relaxed),
            ingested: self.ingested.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }

    /// Load recent history from the source, then analyze once.
    /// Returns the number of rounds added to the log.
    pub async fn backfill(&self) -> u64 {
        if !self.source.check_availability().await {
            warn!("[Monitor] Source '{}' unavailable, skipping backfill", self.source.name());
            return 0;
        }

        let rounds = match self.source.fetch_history(self.config.backfill_limit).await {
            Ok(rounds) => rounds,
            Err(e) => {
                warn!("[Monitor] Backfill failed: {}", e);
                self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                return 0;
            }
        };

        let mut engine = self.engine.lock().await;
        let mut added = 0;
        for raw in rounds {
            match engine.record(raw).await {
                Ok(_) => added += 1,
                Err(e) if e.is_duplicate() => {}
                Err(_) => {
                    self.rejected.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        engine.analyze().await;

        self.backfilled.fetch_add(added, Ordering::Relaxed);
        info!("[Monitor] Backfilled {} rounds from '{}'", added, self.source.name());
        added
    }

    /// Fetch the newest round and, if it is new, record and analyze it
    pub async fn poll_once(&self) -> Option<Recorded> {
        let raw = match self.source.fetch_latest().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("[Monitor] Fetch failed: {}", e);
                self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        let recorded = {
            let mut engine = self.engine.lock().await;
            match engine.record(raw).await {
                Ok(recorded) => recorded,
                Err(e) if e.is_duplicate() => {
                    debug!("[Monitor] {}", e);
                    return None;
                }
                Err(_) => {
                    self.rejected.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        };

        if self.config.analysis_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.analysis_delay_ms)).await;
        }

        let ingested = self.ingested.fetch_add(1, Ordering::Relaxed) + 1;
        let mut engine = self.engine.lock().await;
        engine.analyze().await;

        if self.config.anomaly_every > 0 && ingested % self.config.anomaly_every == 0 {
            let report = engine.inspect_feed(self.config.anomaly_window);
            if report.is_clean() {
                debug!("[Monitor] Feed check clean over {} rounds", report.samples);
            }
        }

        Some(recorded)
    }

    /// Backfill, then poll until `shutdown` flips to true or its sender drops
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> MonitorStats {
        info!(
            "[Monitor] Starting on '{}', poll every {}s",
            self.source.name(),
            self.config.poll_interval_secs
        );

        self.backfill().await;

        let mut ticker = interval(Duration::from_secs(self.config.poll_interval_secs.max(1)));

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let stats = self.stats();
        info!(
            "[Monitor] Stopped: {} ingested, {} rejected, {} fetch failures",
            stats.ingested, stats.rejected, stats.fetch_failures
        );
        stats
    }
}
