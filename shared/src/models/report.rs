//! Push payload model.
//!
//! Defines the JSON report Domoticz posts for a single device reading.

use serde::{Deserialize, Serialize};

/// A single reading pushed by Domoticz.
///
/// The wire keys are `id`, `type`, `sType`, `name`, `value`, `time` and `unit`.
/// `time` and `unit` may be omitted; every other key is required.
///
/// # Example
///
/// ```
/// use shared::models::Report;
///
/// let report: Report = serde_json::from_str(
///     r#"{"id": 5, "type": "counter", "sType": "energy", "name": "kWh", "value": 12.3}"#,
/// )
/// .unwrap();
///
/// assert_eq!(report.id, 5);
/// assert_eq!(report.subtype, "energy");
/// assert!(report.unit.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Domoticz device index.
    #[serde(alias = "Id")]
    pub id: u32,

    /// Device type as reported by Domoticz (e.g. "counter", "Temp").
    #[serde(rename = "type", alias = "Type")]
    pub sensor_type: String,

    /// Device subtype.
    #[serde(rename = "sType", alias = "SType", alias = "stype")]
    pub subtype: String,

    /// Name of the reported value.
    #[serde(alias = "Name")]
    pub name: String,

    /// The reading.
    #[serde(alias = "Value")]
    pub value: f64,

    /// Source timestamp. Carried through but not used for expiry.
    #[serde(default, alias = "Time")]
    pub time: String,

    /// Unit of the reading.
    #[serde(default, alias = "Unit")]
    pub unit: String,
}

impl Report {
    /// Creates a report with empty `time` and `unit`.
    #[must_use]
    pub fn new(
        id: u32,
        sensor_type: impl Into<String>,
        subtype: impl Into<String>,
        name: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            id,
            sensor_type: sensor_type.into(),
            subtype: subtype.into(),
            name: name.into(),
            value,
            time: String::new(),
            unit: String::new(),
        }
    }

    /// Sets the unit of the report.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Sets the source timestamp of the report.
    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }
}
