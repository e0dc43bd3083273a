use super::panic::PanicReport;
use super::Reporter;
use crate::custom::CustomMetric;
use crate::registry::{Metric, Registry};
use metflux_types::ReporterSettings;
use std::sync::Arc;

/// Called with every metric that was exported, after each export cycle's
/// conversion pass.
pub type Callback = Arc<dyn Fn(&Metric) + Send + Sync>;

/// Called when the reporter's background task panics.
pub type PanicHandler = Arc<dyn Fn(&Reporter, &PanicReport) + Send + Sync>;

/// Everything needed to build a [`Reporter`].
///
/// The configuration is consumed by [`Reporter::new`]; the reporter works
/// with its own resolved copy.
#[derive(Clone)]
pub struct ReporterConfig {
    /// Connection settings and intervals.
    pub settings: ReporterSettings,

    /// Metrics to export.
    pub registry: Arc<dyn Registry>,

    /// Rules for exporting [`Metric::Other`] values, tried in order.
    pub custom_metrics: Vec<CustomMetric>,

    /// Invoked, in order, for every exported metric.
    pub callbacks: Vec<Callback>,

    /// Invoked, in order, if the background task panics.
    pub panic_handlers: Vec<PanicHandler>,
}

impl ReporterConfig {
    pub fn new(settings: ReporterSettings, registry: Arc<dyn Registry>) -> Self {
        Self {
            settings,
            registry,
            custom_metrics: Vec::new(),
            callbacks: Vec::new(),
            panic_handlers: Vec::new(),
        }
    }

    pub fn with_custom_metric(mut self, rule: CustomMetric) -> Self {
        self.custom_metrics.push(rule);
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Metric) + Send + Sync + 'static,
    {
        self.callbacks.push(Arc::new(callback));
        self
    }

    pub fn with_panic_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Reporter, &PanicReport) + Send + Sync + 'static,
    {
        self.panic_handlers.push(Arc::new(handler));
        self
    }
}
