//! The metrics registry the reporter reads from.
//!
//! The reporter only needs to enumerate `(name, metric)` pairs; that is the
//! [`Registry`] trait.  Applications that already keep their metrics
//! somewhere else implement it for their own container.  [`MetricsRegistry`]
//! is a ready-made in-memory implementation, and the [`standard`] module
//! provides thread-safe implementations of every built-in metric kind.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, RwLock};
use thiserror::Error;

pub mod sample;
pub mod standard;

pub use sample::{SampleSnapshot, UniformSample};
pub use standard::{
    StandardCounter, StandardGauge, StandardGaugeF64, StandardHistogram, StandardMeter,
    StandardTimer,
};

/// A monotonically adjusted count.
pub trait Counter: Send + Sync {
    fn count(&self) -> i64;
}

/// An integer instantaneous value.
pub trait Gauge: Send + Sync {
    fn value(&self) -> i64;
}

/// A floating point instantaneous value.
pub trait GaugeF64: Send + Sync {
    fn value(&self) -> f64;
}

/// A distribution of integer samples.
pub trait Histogram: Send + Sync {
    fn snapshot(&self) -> SampleSnapshot;
}

/// A rate of events.
pub trait Meter: Send + Sync {
    fn snapshot(&self) -> RateSnapshot;
}

/// A distribution of durations together with the rate at which they occur.
pub trait Timer: Send + Sync {
    fn snapshot(&self) -> TimerSnapshot;
}

/// Point-in-time view of a [`Meter`].  Rates are events per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateSnapshot {
    pub count: i64,
    /// One-minute exponentially weighted moving average.
    pub rate1: f64,
    /// Five-minute exponentially weighted moving average.
    pub rate5: f64,
    /// Fifteen-minute exponentially weighted moving average.
    pub rate15: f64,
    /// Mean rate since the meter was created.
    pub rate_mean: f64,
}

/// Point-in-time view of a [`Timer`].  Samples are in nanoseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerSnapshot {
    pub samples: SampleSnapshot,
    pub rates: RateSnapshot,
}

/// A registered metric.
///
/// The built-in kinds are closed; anything else is carried as
/// [`Metric::Other`] and can only be exported through a custom metric rule
/// (see [`crate::custom`]).
#[derive(Clone)]
pub enum Metric {
    Counter(Arc<dyn Counter>),
    Gauge(Arc<dyn Gauge>),
    GaugeF64(Arc<dyn GaugeF64>),
    Histogram(Arc<dyn Histogram>),
    Meter(Arc<dyn Meter>),
    Timer(Arc<dyn Timer>),
    Other(Arc<dyn Any + Send + Sync>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    GaugeF64,
    Histogram,
    Meter,
    Timer,
    Other,
}

impl MetricKind {
    /// Measurement name suffix for points of this kind, `None` for
    /// [`MetricKind::Other`].
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Counter => Some("count"),
            Self::Gauge | Self::GaugeF64 => Some("gauge"),
            Self::Histogram => Some("histogram"),
            Self::Meter => Some("meter"),
            Self::Timer => Some("timer"),
            Self::Other => None,
        }
    }
}

impl Metric {
    /// Wrap a value of a kind the reporter does not know about.
    pub fn other<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::Other(Arc::new(value))
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::Gauge(_) => MetricKind::Gauge,
            Self::GaugeF64(_) => MetricKind::GaugeF64,
            Self::Histogram(_) => MetricKind::Histogram,
            Self::Meter(_) => MetricKind::Meter,
            Self::Timer(_) => MetricKind::Timer,
            Self::Other(_) => MetricKind::Other,
        }
    }

    /// Returns the wrapped value if this is a [`Metric::Other`] of type `T`.
    pub fn downcast_other<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Other(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl Debug for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Metric::{:?}", self.kind())
    }
}

/// A collection of named metrics.
pub trait Registry: Send + Sync {
    /// Call `f` once for every metric currently in the registry.
    ///
    /// No particular order is required.
    fn each(&self, f: &mut dyn FnMut(&str, &Metric));
}

impl Registry for Vec<(String, Metric)> {
    fn each(&self, f: &mut dyn FnMut(&str, &Metric)) {
        for (name, metric) in self {
            f(name, metric)
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a metric named '{0}' is already registered")]
    DuplicateMetric(String),
}

/// In-memory [`Registry`], iterated in name order.
#[derive(Default)]
pub struct MetricsRegistry {
    metrics: RwLock<BTreeMap<String, Metric>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, metric: Metric) -> Result<(), RegistryError> {
        let name = name.into();
        let mut metrics = self.metrics.write().unwrap();
        if metrics.contains_key(&name) {
            return Err(RegistryError::DuplicateMetric(name));
        }
        metrics.insert(name, metric);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics.read().unwrap().get(name).cloned()
    }

    pub fn unregister(&self, name: &str) -> Option<Metric> {
        self.metrics.write().unwrap().remove(name)
    }

    pub fn len(&self) -> usize {
        self.metrics.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.read().unwrap().is_empty()
    }

    pub fn counter(&self, name: impl Into<String>) -> Result<Arc<StandardCounter>, RegistryError> {
        let counter = Arc::new(StandardCounter::new());
        self.register(name, Metric::Counter(counter.clone()))?;
        Ok(counter)
    }

    pub fn gauge(&self, name: impl Into<String>) -> Result<Arc<StandardGauge>, RegistryError> {
        let gauge = Arc::new(StandardGauge::new());
        self.register(name, Metric::Gauge(gauge.clone()))?;
        Ok(gauge)
    }

    pub fn gauge_f64(
        &self,
        name: impl Into<String>,
    ) -> Result<Arc<StandardGaugeF64>, RegistryError> {
        let gauge = Arc::new(StandardGaugeF64::new());
        self.register(name, Metric::GaugeF64(gauge.clone()))?;
        Ok(gauge)
    }

    pub fn histogram(
        &self,
        name: impl Into<String>,
    ) -> Result<Arc<StandardHistogram>, RegistryError> {
        let histogram = Arc::new(StandardHistogram::new());
        self.register(name, Metric::Histogram(histogram.clone()))?;
        Ok(histogram)
    }

    pub fn meter(&self, name: impl Into<String>) -> Result<Arc<StandardMeter>, RegistryError> {
        let meter = Arc::new(StandardMeter::new());
        self.register(name, Metric::Meter(meter.clone()))?;
        Ok(meter)
    }

    pub fn timer(&self, name: impl Into<String>) -> Result<Arc<StandardTimer>, RegistryError> {
        let timer = Arc::new(StandardTimer::new());
        self.register(name, Metric::Timer(timer.clone()))?;
        Ok(timer)
    }
}

impl Registry for MetricsRegistry {
    fn each(&self, f: &mut dyn FnMut(&str, &Metric)) {
        // Don't hold the lock while calling out: `f` may touch the registry.
        let entries: Vec<(String, Metric)> = self
            .metrics
            .read()
            .unwrap()
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect();

        for (name, metric) in &entries {
            f(name, metric);
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Metric, MetricKind, MetricsRegistry, Registry, RegistryError};
    use std::sync::Arc;

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = MetricsRegistry::new();
        registry.counter("requests").unwrap();

        assert_eq!(
            registry.gauge("requests").unwrap_err(),
            RegistryError::DuplicateMetric("requests".to_string())
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("requests").unwrap().kind(), MetricKind::Counter);
    }

    #[test]
    fn each_visits_every_metric_once() {
        let registry = MetricsRegistry::new();
        registry.counter("b").unwrap();
        registry.meter("a").unwrap();
        registry.register("c", Metric::other(42u32)).unwrap();

        let mut seen = Vec::new();
        registry.each(&mut |name: &str, metric: &Metric| seen.push((name.to_string(), metric.kind())));

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), MetricKind::Meter),
                ("b".to_string(), MetricKind::Counter),
                ("c".to_string(), MetricKind::Other),
            ]
        );
    }

    #[test]
    fn each_does_not_hold_the_lock() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.counter("requests").unwrap();

        let inner = registry.clone();
        registry.each(&mut |name: &str, _: &Metric| {
            inner.unregister(name);
        });
        assert!(registry.is_empty());
    }

    #[test]
    fn downcast_other() {
        let metric = Metric::other(String::from("queue"));
        assert_eq!(metric.downcast_other::<String>().map(String::as_str), Some("queue"));
        assert!(metric.downcast_other::<u64>().is_none());
        assert_eq!(metric.kind().suffix(), None);
        assert_eq!(MetricKind::GaugeF64.suffix(), Some("gauge"));
    }
}
