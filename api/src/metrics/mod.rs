//! Prometheus exposition of the sample store.
//!
//! This module provides the collector invoked on every scrape and the liveness
//! marker recording when Domoticz last pushed a reading.

pub mod collector;
pub mod liveness;

pub use collector::{SampleCollector, LAST_PUSH_HELP, LAST_PUSH_METRIC};
pub use liveness::LastPush;
