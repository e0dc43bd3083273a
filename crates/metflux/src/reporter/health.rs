use super::Reporter;
use crate::store::ConnectionHandle;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    /// The store answered; carries the round-trip time.
    Alive(Duration),

    /// The ping failed and a new connection replaced the old one.
    Reconnected { generation: u64 },

    /// The ping failed and so did reconnecting.  The old connection stays
    /// current until the next health check.
    ReconnectFailed,
}

impl Reporter {
    /// Check the current connection and replace it if the store does not
    /// answer.
    pub async fn ping(&self) -> PingOutcome {
        let inner = &self.0;
        let handle = inner.connection.load_full();

        let error = match handle.connection().ping().await {
            Ok(rtt) => {
                debug!(generation = handle.generation(), ?rtt, "InfluxDB ping");
                return PingOutcome::Alive(rtt);
            }
            Err(error) => error,
        };

        warn!("got error while sending a ping to InfluxDB, trying to recreate client: {error:#}");
        match inner.connector.connect(&inner.influxdb) {
            Ok(connection) => {
                let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                inner
                    .connection
                    .store(Arc::new(ConnectionHandle::new(generation, connection)));
                info!(generation, "reconnected to InfluxDB");
                PingOutcome::Reconnected { generation }
            }
            Err(error) => {
                error!("unable to make InfluxDB client: {error:#}");
                PingOutcome::ReconnectFailed
            }
        }
    }
}
