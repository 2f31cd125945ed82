//! Error types for the signal engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),

    #[error("Duplicate outcome: {0}")]
    DuplicateOutcome(String),

    #[error("Out of order outcome {id}: {timestamp} is older than {latest}")]
    OutOfOrder {
        id: String,
        timestamp: chrono::DateTime<chrono::Utc>,
        latest: chrono::DateTime<chrono::Utc>,
    },

    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PredictorError {
    /// Rejections that only mean "already seen", expected while polling
    pub fn is_duplicate(&self) -> bool {
        matches!(self, PredictorError::DuplicateOutcome(_))
    }
}

pub type Result<T> = std::result::Result<T, PredictorError>;
