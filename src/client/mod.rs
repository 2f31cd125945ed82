//! Round feed clients
//!
//! This module provides the sources the engine pulls rounds from:
//! - HTTP: the public round history of the live game
//! - Simulated: seeded synthetic rounds for offline runs

mod http;
mod simulated;

pub use http::HttpSource;
pub use simulated::SimulatedSource;

use crate::data::RawOutcome;
use crate::error::Result;
use async_trait::async_trait;

/// Producer of unvalidated rounds
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutcomeSource: Send + Sync {
    /// Short label for logs
    fn name(&self) -> &'static str;

    /// Up to `limit` past rounds, oldest first
    async fn fetch_history(&self, limit: usize) -> Result<Vec<RawOutcome>>;

    /// Newest round, if the feed has one
    async fn fetch_latest(&self) -> Result<Option<RawOutcome>>;

    async fn check_availability(&self) -> bool;
}
