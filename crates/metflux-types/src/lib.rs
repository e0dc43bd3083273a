//! Public API types for metflux.
//!
//! This crate holds the serializable configuration of a reporter and the
//! data model of what it writes to the time-series store: [`Point`]s grouped
//! into a [`BatchPoints`].  It has no runtime behavior of its own.

pub mod config;
pub mod point;
pub mod transport;

pub use config::{ReporterSettings, DEFAULT_INTERVAL, DEFAULT_PING_INTERVAL};
pub use point::{BatchPoints, FieldValue, Point, Tags};
pub use transport::influxdb::InfluxDbConfig;
