//! Conversion of registry entries into points.
//!
//! Each built-in metric kind maps to exactly one point with a fixed field
//! set, written to the measurement `<metric name>.<kind suffix>`:
//!
//! | kind      | suffix       | fields |
//! |-----------|--------------|--------|
//! | counter   | `.count`     | `value` |
//! | gauge     | `.gauge`     | `value` |
//! | histogram | `.histogram` | `count max mean min stddev variance p50 p75 p95 p99 p999 p9999` |
//! | meter     | `.meter`     | `count m1 m5 m15 mean` |
//! | timer     | `.timer`     | histogram fields and `m1 m5 m15 meanrate` |
//!
//! [`Metric::Other`] is not recognized here and is left to the custom metric
//! rules.

use crate::registry::{Metric, RateSnapshot, SampleSnapshot};
use chrono::{DateTime, Utc};
use metflux_types::{FieldValue, Point, Tags};
use std::collections::BTreeMap;

/// Quantiles reported for histograms and timers, in field order.
pub const PERCENTILES: [f64; 6] = [0.5, 0.75, 0.95, 0.99, 0.999, 0.9999];

const PERCENTILE_FIELDS: [&str; 6] = ["p50", "p75", "p95", "p99", "p999", "p9999"];

/// Build the point for `metric`, or `None` if it is not a built-in kind.
pub fn convert(name: &str, metric: &Metric, tags: &Tags, time: DateTime<Utc>) -> Option<Point> {
    let suffix = metric.kind().suffix()?;
    let mut fields = BTreeMap::new();

    match metric {
        Metric::Counter(counter) => {
            fields.insert("value".to_string(), FieldValue::Integer(counter.count()));
        }
        Metric::Gauge(gauge) => {
            fields.insert("value".to_string(), FieldValue::Integer(gauge.value()));
        }
        Metric::GaugeF64(gauge) => {
            fields.insert("value".to_string(), FieldValue::Float(gauge.value()));
        }
        Metric::Histogram(histogram) => {
            sample_fields(&histogram.snapshot(), &mut fields);
        }
        Metric::Meter(meter) => {
            let rates = meter.snapshot();
            fields.insert("count".to_string(), FieldValue::Integer(rates.count));
            rate_fields(&rates, "mean", &mut fields);
        }
        Metric::Timer(timer) => {
            let snapshot = timer.snapshot();
            sample_fields(&snapshot.samples, &mut fields);
            rate_fields(&snapshot.rates, "meanrate", &mut fields);
        }
        Metric::Other(_) => return None,
    }

    Some(Point {
        measurement: format!("{name}.{suffix}"),
        tags: tags.clone(),
        fields,
        time: Some(time),
    })
}

fn sample_fields(snapshot: &SampleSnapshot, fields: &mut BTreeMap<String, FieldValue>) {
    fields.insert("count".to_string(), FieldValue::Integer(snapshot.count()));
    fields.insert("max".to_string(), FieldValue::Integer(snapshot.max()));
    fields.insert("mean".to_string(), FieldValue::Float(snapshot.mean()));
    fields.insert("min".to_string(), FieldValue::Integer(snapshot.min()));
    fields.insert("stddev".to_string(), FieldValue::Float(snapshot.std_dev()));
    fields.insert("variance".to_string(), FieldValue::Float(snapshot.variance()));

    for (field, value) in PERCENTILE_FIELDS
        .iter()
        .zip(snapshot.percentiles(&PERCENTILES))
    {
        fields.insert(field.to_string(), FieldValue::Float(value));
    }
}

fn rate_fields(rates: &RateSnapshot, mean_field: &str, fields: &mut BTreeMap<String, FieldValue>) {
    fields.insert("m1".to_string(), FieldValue::Float(rates.rate1));
    fields.insert("m5".to_string(), FieldValue::Float(rates.rate5));
    fields.insert("m15".to_string(), FieldValue::Float(rates.rate15));
    fields.insert(mean_field.to_string(), FieldValue::Float(rates.rate_mean));
}
