//! Feed data hygiene
//!
//! - Boundary validation of raw rounds before they reach the outcome log
//! - Advisory anomaly detection over the received feed

pub mod anomaly;
pub mod cleaning;

pub use anomaly::{Anomaly, AnomalyConfig, FeedInspector, FeedReport};
pub use cleaning::{validate, RawOutcome};
