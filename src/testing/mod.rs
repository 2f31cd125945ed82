//! Testing helpers for the signal engine
//!
//! Provides test data generators for building outcome logs from color
//! sequences.

pub mod generators;

pub use generators::{colors, OutcomeGenerator};
