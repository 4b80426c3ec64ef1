//! Liveness marker for incoming pushes.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Timestamp of the most recent successfully decoded push.
///
/// The stored value only moves forward: a push handler that read the clock
/// earlier but finishes later cannot roll it back.
#[derive(Debug, Default)]
pub struct LastPush {
    nanos: AtomicI64,
}

impl LastPush {
    /// Creates a marker that has never seen a push.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a push received at `at`.
    pub fn mark(&self, at: DateTime<Utc>) {
        // Out of the i64 nanosecond range only past the year 2262.
        let nanos = at.timestamp_nanos_opt().unwrap_or(i64::MAX);
        self.nanos.fetch_max(nanos, Ordering::AcqRel);
    }

    /// Returns the Unix timestamp of the last push in seconds, or `0.0` if none.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        // Sub-microsecond precision loss is irrelevant for a liveness timestamp.
        #[allow(clippy::cast_precision_loss)]
        let nanos = self.nanos.load(Ordering::Acquire) as f64;
        nanos / 1e9
    }
}
