//! Storage traits and implementations.
//!
//! This module provides the keyed sample store shared by the update worker
//! (the only writer) and the scrape path (readers).

pub mod sample_store;

pub use sample_store::{InMemorySampleStore, SampleStore};
