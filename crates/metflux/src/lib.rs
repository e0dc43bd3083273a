//! Periodic export of in-process metrics to InfluxDB.
//!
//! A [`Reporter`] reads every metric of a [`Registry`] on a fixed interval,
//! turns each one into a [`Point`](metflux_types::Point), and writes the
//! whole set as one batch.  On a second, independent interval it pings the
//! store and reconnects if the ping fails.
//!
//! ```no_run
//! use std::sync::Arc;
//! use metflux::{MetricsRegistry, Reporter, ReporterConfig};
//! use metflux_types::{InfluxDbConfig, ReporterSettings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(MetricsRegistry::new());
//! let requests = registry.counter("requests")?;
//!
//! let settings = ReporterSettings::new(
//!     InfluxDbConfig::new("http://localhost:8086", "metrics").with_tag("env", "prod"),
//! );
//! let reporter = Reporter::with_influxdb(ReporterConfig::new(settings, registry))?;
//! reporter.start();
//!
//! requests.inc(1);
//! # Ok(())
//! # }
//! ```
//!
//! Built-in metric kinds and the fields they are exported with are listed
//! in [`convert`].  Other kinds can be exported with
//! [`custom::CustomMetric`] rules.

pub mod convert;
pub mod custom;
mod error;
pub mod registry;
mod reporter;
pub mod store;

pub use custom::{CustomMetric, CustomMetrics};
pub use error::ReporterError;
pub use registry::{Metric, MetricKind, MetricsRegistry, Registry};
pub use reporter::{
    Callback, PanicHandler, PanicReport, PingOutcome, Reporter, ReporterConfig,
};
pub use store::{StoreConnection, StoreConnector};
