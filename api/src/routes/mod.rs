//! API route definitions.
//!
//! This module organizes all HTTP routes of the exporter.

mod health;
mod push;
mod scrape;

pub use health::health_routes;
pub use push::push_routes;
pub use scrape::scrape_routes;
