//! Domoticz Exporter Shared Library
//!
//! This crate contains the sample model, the naming policy, and the sample store
//! used by the Domoticz exporter server.
//!
//! # Modules
//!
//! - [`models`] - The Domoticz push payload and the stored sample record
//! - [`naming`] - Mapping from a push payload to an exported metric identity
//! - [`storage`] - The keyed, self-expiring sample store
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use shared::models::{Report, Sample};
//! use shared::naming::{DomoticzNaming, NamingPolicy};
//! use shared::storage::{InMemorySampleStore, SampleStore};
//!
//! let report = Report::new(5, "counter", "energy", "kWh", 12.3);
//! let identity = DomoticzNaming::default().identify(&report);
//!
//! let store = InMemorySampleStore::new();
//! let expiry = Utc::now() + Duration::minutes(10);
//! store.upsert(Sample::new(report.id, identity, report.value, expiry));
//!
//! assert_eq!(store.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod models;
pub mod naming;
pub mod storage;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
