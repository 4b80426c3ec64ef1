//! Naming policy for exported metrics.
//!
//! Maps a Domoticz [`Report`] to the metric name, help text, and value kind it is
//! exported under. Policies are pure: the same report always yields the same identity.

use crate::models::{Report, ValueKind};

/// Default prefix for exported sensor metrics.
pub const DEFAULT_PREFIX: &str = "domoticz";

/// Device types whose readings accumulate and are exported as counters.
pub const COUNTER_TYPES: [&str; 2] = ["counter", "derive"];

/// The exported identity of a sensor metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricIdentity {
    /// Exported metric name.
    pub name: String,
    /// Exported help text.
    pub help: String,
    /// Exported value kind.
    pub kind: ValueKind,
}

impl MetricIdentity {
    /// Creates a new metric identity.
    #[must_use]
    pub fn new(name: impl Into<String>, help: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
        }
    }
}

/// Trait for naming policies.
///
/// Implementations must be pure and thread-safe (Send + Sync); they are called
/// concurrently from every push handler.
pub trait NamingPolicy: Send + Sync {
    /// Computes the exported identity for a report.
    fn identify(&self, report: &Report) -> MetricIdentity;
}

/// The Domoticz naming scheme: `{prefix}_{id}_{type}_{subtype}`.
///
/// # Example
///
/// ```
/// use shared::models::{Report, ValueKind};
/// use shared::naming::{DomoticzNaming, NamingPolicy};
///
/// let report = Report::new(5, "counter", "energy", "kWh", 12.3).with_unit("kWh");
/// let identity = DomoticzNaming::default().identify(&report);
///
/// assert_eq!(identity.name, "domoticz_5_counter_energy");
/// assert_eq!(identity.kind, ValueKind::Counter);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomoticzNaming {
    prefix: String,
}

impl DomoticzNaming {
    /// Creates a naming policy with a custom prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for DomoticzNaming {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl NamingPolicy for DomoticzNaming {
    fn identify(&self, report: &Report) -> MetricIdentity {
        MetricIdentity {
            name: metric_name(&self.prefix, report),
            help: metric_help(report),
            kind: value_kind(&report.sensor_type),
        }
    }
}

/// Builds the exported metric name for a report.
#[must_use]
pub fn metric_name(prefix: &str, report: &Report) -> String {
    format!(
        "{prefix}_{}_{}_{}",
        report.id, report.sensor_type, report.subtype
    )
}

/// Builds the help text for a report.
#[must_use]
pub fn metric_help(report: &Report) -> String {
    format!(
        "Domoticz exporter: Type: '{}' Dstype: '{}' Dsname: '{}' Unit: '{}'",
        report.sensor_type, report.subtype, report.name, report.unit
    )
}

/// Derives the value kind from a Domoticz device type.
///
/// Matching is exact; anything that is not an accumulation marker is a gauge.
#[must_use]
pub fn value_kind(sensor_type: &str) -> ValueKind {
    if COUNTER_TYPES.contains(&sensor_type) {
        ValueKind::Counter
    } else {
        ValueKind::Gauge
    }
}
