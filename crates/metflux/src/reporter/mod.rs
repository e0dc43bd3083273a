//! The reporter: a background task that periodically exports a metrics
//! registry to InfluxDB and keeps the connection healthy.
//!
//! ```text
//!                 export tick                          ping tick
//!                      │                                   │
//!                      ▼                                   ▼
//!  registry ──► convert / custom ──► callbacks ──► write   ping ──(failure)──► connect
//!                                                    │      │                    │
//!                                                    └──────┴── current handle ◄─┘
//! ```
//!
//! Both ticks are served by the same task, one at a time.  The connection
//! handle is the only state shared between the two: the health check swaps
//! in a new handle after a failed ping, and the export cycle picks up
//! whichever handle is current when it writes.
//!
//! The task is started at most once per reporter and never stopped.  A
//! panic anywhere inside it (including in a callback or a custom metric
//! rule) is caught, logged and passed to the panic handlers, after which the
//! task ends and nothing more is exported.

use crate::custom::CustomMetrics;
use crate::error::ReporterError;
use crate::registry::Registry;
use crate::store::{ConnectionHandle, InfluxConnector, StoreConnector};
use arc_swap::ArcSwap;
use metflux_types::{InfluxDbConfig, ReporterSettings, Tags};
use once_cell::sync::Lazy;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

mod config;
mod export;
mod health;
mod panic;
mod scheduler;


pub use config::{Callback, PanicHandler, ReporterConfig};
pub use health::PingOutcome;
pub use panic::PanicReport;

/// Runtime for reporters started outside of a tokio runtime.
static TOKIO: Lazy<Runtime> = Lazy::new(|| {
    Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("metflux-reporter")
        .enable_all()
        .build()
        .unwrap()
});

struct ReporterInner {
    influxdb: InfluxDbConfig,
    interval: Duration,
    ping_interval: Duration,
    tags: Tags,
    registry: Arc<dyn Registry>,
    custom_metrics: CustomMetrics,
    callbacks: Vec<Callback>,
    panic_handlers: Vec<PanicHandler>,
    connector: Arc<dyn StoreConnector>,
    connection: ArcSwap<ConnectionHandle>,
    /// Generation of the most recently opened connection.  Not derived from
    /// `connection`: concurrent `ping` calls may both reconnect from the
    /// same handle, and each new handle must still get its own generation.
    generation: AtomicU64,
    task: OnceLock<JoinHandle<()>>,
}

/// Exports a metrics registry to InfluxDB.
///
/// Cloning a reporter yields another handle to the same reporter.
#[derive(Clone)]
pub struct Reporter(Arc<ReporterInner>);

impl Reporter {
    /// Validate `config` and open the initial connection with `connector`.
    pub fn new(
        config: ReporterConfig,
        connector: Arc<dyn StoreConnector>,
    ) -> Result<Self, ReporterError> {
        let ReporterConfig {
            settings,
            registry,
            custom_metrics,
            callbacks,
            panic_handlers,
        } = config;

        let settings: ReporterSettings = settings.resolved();
        let influxdb = settings
            .influxdb
            .clone()
            .ok_or(ReporterError::MissingStoreConfig)?;

        if let Err(source) = url::Url::parse(&influxdb.url) {
            tracing::error!("unable to parse InfluxDB url '{}': {source}", influxdb.url);
            return Err(ReporterError::InvalidUrl {
                url: influxdb.url.clone(),
                source,
            });
        }

        let connection = connector
            .connect(&influxdb)
            .map_err(ReporterError::Connect)?;

        Ok(Self(Arc::new(ReporterInner {
            tags: Arc::new(influxdb.tags.clone()),
            interval: settings.interval(),
            ping_interval: settings.ping_interval(),
            influxdb,
            registry,
            custom_metrics: CustomMetrics::new(custom_metrics),
            callbacks,
            panic_handlers,
            connector,
            connection: ArcSwap::from_pointee(ConnectionHandle::new(0, connection)),
            generation: AtomicU64::new(0),
            task: OnceLock::new(),
        })))
    }

    /// [`Reporter::new`] with the built-in InfluxDB HTTP client.
    pub fn with_influxdb(config: ReporterConfig) -> Result<Self, ReporterError> {
        Self::new(config, Arc::new(InfluxConnector))
    }

    /// Start the background task.
    ///
    /// Only the first call on a reporter (or any of its clones) starts the
    /// task; it returns `true`.  Later calls do nothing and return `false`.
    /// The task runs on the current tokio runtime if there is one, and on a
    /// shared runtime with a single worker thread otherwise.
    pub fn start(&self) -> bool {
        let mut started = false;
        self.0.task.get_or_init(|| {
            started = true;
            let task = self.clone().run_contained();
            match Handle::try_current() {
                Ok(handle) => handle.spawn(task),
                Err(_) => TOKIO.spawn(task),
            }
        });
        started
    }

    /// `true` between [`Reporter::start`] and the end of the background
    /// task, which only happens after a panic.
    pub fn is_running(&self) -> bool {
        self.0.task.get().is_some_and(|task| !task.is_finished())
    }

    pub fn interval(&self) -> Duration {
        self.0.interval
    }

    pub fn ping_interval(&self) -> Duration {
        self.0.ping_interval
    }

    pub fn database(&self) -> &str {
        &self.0.influxdb.database
    }

    pub fn tags(&self) -> &Tags {
        &self.0.tags
    }

    /// Generation of the current connection: 0 until the first reconnect.
    pub fn connection_generation(&self) -> u64 {
        self.0.connection.load().generation()
    }
}
