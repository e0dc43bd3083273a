use super::Reporter;
use crate::convert::convert;
use crate::registry::Metric;
use anyhow::{Context, Result as AnyResult};
use chrono::Utc;
use metflux_types::BatchPoints;

impl Reporter {
    /// Run one export cycle: snapshot every metric in the registry, notify
    /// the callbacks, and write the batch to the current connection.
    ///
    /// An empty registry still results in a (empty) write.  Panics raised
    /// by callbacks or custom metric rules are not caught here.
    pub async fn send(&self) -> AnyResult<()> {
        let inner = &self.0;
        let now = Utc::now();
        let mut batch = BatchPoints::new(inner.influxdb.database.clone());
        let mut exported: Vec<Metric> = Vec::new();

        inner.registry.each(&mut |name: &str, metric: &Metric| {
            let point = convert(name, metric, &inner.tags, now).or_else(|| {
                inner.custom_metrics.resolve(metric).map(|mut point| {
                    point.time.get_or_insert(now);
                    point
                })
            });

            if let Some(point) = point {
                batch.points.push(point);
                if !inner.callbacks.is_empty() {
                    exported.push(metric.clone());
                }
            }
        });

        for metric in &exported {
            for callback in &inner.callbacks {
                callback(metric);
            }
        }

        // Load the handle only now, so that a reconnect that happened while
        // the batch was being built is picked up.
        let handle = inner.connection.load_full();
        tracing::debug!(
            points = batch.len(),
            generation = handle.generation(),
            "writing batch to InfluxDB"
        );
        handle
            .connection()
            .write(&batch)
            .await
            .with_context(|| format!("failed to write {} points", batch.len()))
    }
}
