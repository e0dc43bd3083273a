use super::Reporter;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{info, info_span, warn, Instrument};

/// A periodic timer whose first tick fires one period from now.
fn ticker(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

impl Reporter {
    /// Body of the background task.  Returns only after a panic, which it
    /// reports to the panic handlers.
    pub(super) async fn run_contained(self) {
        let span = info_span!("metflux_reporter", database = self.0.influxdb.database.as_str());

        let result = AssertUnwindSafe(self.run())
            .catch_unwind()
            .instrument(span)
            .await;

        if let Err(payload) = result {
            self.handle_panic(payload);
        }
    }

    async fn run(&self) {
        let mut export = ticker(self.0.interval);
        let mut ping = ticker(self.0.ping_interval);

        info!(
            interval = ?self.0.interval,
            ping_interval = ?self.0.ping_interval,
            "metflux reporter started"
        );

        loop {
            tokio::select! {
                _ = export.tick() => {
                    if let Err(error) = self.send().await {
                        warn!("unable to send metrics to InfluxDB: {error:#}");
                    }
                }
                _ = ping.tick() => {
                    self.ping().await;
                }
            }
        }
    }
}
