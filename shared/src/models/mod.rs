//! Data models for the Domoticz exporter.
//!
//! This module contains the push payload sent by Domoticz and the stored sample record.

pub mod report;
pub mod sample;

pub use report::Report;
pub use sample::{Sample, ValueKind};
