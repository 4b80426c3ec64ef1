//! Sample storage trait and implementations.
//!
//! Provides the `SampleStore` trait for the latest-value-per-device store and an
//! `InMemorySampleStore` implementation guarded by a single mutex.
//!
//! The store never filters on read: expired samples stay visible to `snapshot_all`
//! until a sweep removes them, and readers are expected to check
//! [`Sample::is_expired_at`] themselves.

use crate::models::Sample;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Trait for sample storage implementations.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait SampleStore: Send + Sync {
    /// Inserts a sample, fully replacing any record with the same id.
    fn upsert(&self, sample: Sample);

    /// Returns an independent copy of every record currently held, in no particular order.
    fn snapshot_all(&self) -> Vec<Sample>;

    /// Removes every record whose expiry is at or before `now`.
    ///
    /// Returns the number of records removed.
    fn sweep_expired(&self, now: DateTime<Utc>) -> usize;

    /// Returns the number of records physically held, expired or not.
    fn len(&self) -> usize;

    /// Returns true if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory sample store keyed by device id.
#[derive(Debug, Default)]
pub struct InMemorySampleStore {
    samples: Mutex<HashMap<u32, Sample>>,
}

impl InMemorySampleStore {
    /// Creates a new empty in-memory sample store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(HashMap::new()),
        }
    }

    // Every mutation is a single map operation, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Sample>> {
        self.samples.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!("Sample store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl SampleStore for InMemorySampleStore {
    fn upsert(&self, sample: Sample) {
        self.lock().insert(sample.id, sample);
    }

    fn snapshot_all(&self) -> Vec<Sample> {
        let samples = self.lock();
        samples.values().cloned().collect()
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut samples = self.lock();
        let before = samples.len();
        samples.retain(|_, sample| !sample.is_expired_at(now));
        before - samples.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
