//! Double Signal
//!
//! Pattern-mining signal engine for Double-style color rounds: mines recurring
//! color sequences, runs a set of prediction heuristics, aggregates them into
//! a bet/wait signal and scores every bet against the round that follows.

pub mod analysis;
pub mod client;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod scoring;
pub mod storage;
pub mod strategy;
pub mod testing;
pub mod types;
