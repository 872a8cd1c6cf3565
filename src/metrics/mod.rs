//! Metrics
//!
//! Atomic counters for the dispatch hot path.

mod counters;

pub use counters::*;
