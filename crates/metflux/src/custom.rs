//! Custom metric rules: exporting metric kinds the reporter does not know.
//!
//! A [`CustomMetric`] pairs a predicate with a point builder.  The reporter
//! only consults the rules for entries the built-in conversion did not
//! recognize, and stops at the first rule whose predicate matches.

use crate::registry::Metric;
use metflux_types::Point;
use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub type Applicable = Arc<dyn Fn(&Metric) -> bool + Send + Sync>;
/// Builds the point for a metric the rule applies to.  `None` when the
/// metric turns out not to be one the rule can read.
pub type PointBuilder = Arc<dyn Fn(&Metric) -> Option<Point> + Send + Sync>;

#[derive(Clone)]
pub struct CustomMetric {
    is_applicable: Applicable,
    point: PointBuilder,
}

impl CustomMetric {
    pub fn new<A, P>(is_applicable: A, point: P) -> Self
    where
        A: Fn(&Metric) -> bool + Send + Sync + 'static,
        P: Fn(&Metric) -> Point + Send + Sync + 'static,
    {
        Self {
            is_applicable: Arc::new(is_applicable),
            point: Arc::new(move |metric: &Metric| Some(point(metric))),
        }
    }

    /// A rule for [`Metric::Other`] values of type `T`.
    pub fn for_type<T, P>(point: P) -> Self
    where
        T: Any,
        P: Fn(&T) -> Point + Send + Sync + 'static,
    {
        Self {
            is_applicable: Arc::new(|metric: &Metric| metric.downcast_other::<T>().is_some()),
            point: Arc::new(move |metric: &Metric| metric.downcast_other::<T>().map(&point)),
        }
    }

    pub fn is_applicable(&self, metric: &Metric) -> bool {
        (self.is_applicable)(metric)
    }

    /// The point for `metric`.  Callers check [`Self::is_applicable`]
    /// first; a rule built with [`Self::for_type`] returns `None` for values
    /// of any other type.
    pub fn point(&self, metric: &Metric) -> Option<Point> {
        (self.point)(metric)
    }
}

impl Debug for CustomMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("CustomMetric")
    }
}

/// Ordered list of custom metric rules.
#[derive(Clone, Debug, Default)]
pub struct CustomMetrics {
    rules: Vec<CustomMetric>,
}

impl CustomMetrics {
    pub fn new(rules: Vec<CustomMetric>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Point from the first rule that applies to `metric`, if any.
    pub fn resolve(&self, metric: &Metric) -> Option<Point> {
        self.rules
            .iter()
            .find(|rule| rule.is_applicable(metric))
            .and_then(|rule| rule.point(metric))
    }
}

impl From<Vec<CustomMetric>> for CustomMetrics {
    fn from(rules: Vec<CustomMetric>) -> Self {
        Self::new(rules)
    }
}
