//! Sample data model.
//!
//! Defines the `Sample` record held by the sample store for each Domoticz device.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::naming::MetricIdentity;

/// How a sample's value is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// A value that only accumulates (e.g. an energy meter).
    Counter,
    /// A value that can go up or down (e.g. a temperature).
    Gauge,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Counter => write!(f, "counter"),
            Self::Gauge => write!(f, "gauge"),
        }
    }
}

impl Default for ValueKind {
    fn default() -> Self {
        Self::Gauge
    }
}

/// The latest exported state of one Domoticz device.
///
/// A sample is replaced as a whole on every push for its `id`; no field is ever
/// merged with a previous record.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use shared::models::{Sample, ValueKind};
/// use shared::naming::MetricIdentity;
///
/// let now = Utc::now();
/// let identity = MetricIdentity::new("domoticz_5_counter_energy", "help", ValueKind::Counter);
/// let sample = Sample::new(5, identity, 12.3, now + Duration::minutes(10));
///
/// assert!(!sample.is_expired_at(now));
/// assert!(sample.is_expired_at(now + Duration::minutes(10)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Domoticz device index, the upsert key.
    pub id: u32,

    /// Exported metric name.
    pub name: String,

    /// Exported help text.
    pub help: String,

    /// Latest reading.
    pub value: f64,

    /// Exported value kind.
    pub kind: ValueKind,

    /// Constant labels attached at export time.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Instant from which the sample must no longer be exported.
    pub expiry: DateTime<Utc>,
}

impl Sample {
    /// Creates a sample from an exported identity.
    #[must_use]
    pub fn new(id: u32, identity: MetricIdentity, value: f64, expiry: DateTime<Utc>) -> Self {
        Self {
            id,
            name: identity.name,
            help: identity.help,
            value,
            kind: identity.kind,
            labels: BTreeMap::new(),
            expiry,
        }
    }

    /// Adds a constant label to the sample.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Returns true once `now` has reached the sample's expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}
