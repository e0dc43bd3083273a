//! The time-series store the reporter writes to.
//!
//! A [`StoreConnector`] opens [`StoreConnection`]s from the static
//! connection settings.  The reporter keeps exactly one connection current
//! at a time, wrapped in a [`ConnectionHandle`], and replaces the whole
//! handle when the health check reconnects.

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use metflux_types::{BatchPoints, InfluxDbConfig};
use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

pub mod influx;
pub mod line_protocol;

pub use influx::{InfluxConnection, InfluxConnector};

/// Opens connections to the store.
#[cfg_attr(test, automock)]
pub trait StoreConnector: Send + Sync {
    fn connect(&self, config: &InfluxDbConfig) -> AnyResult<Box<dyn StoreConnection>>;
}

/// A live link to the store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// Check that the store is reachable.  Returns the round-trip time.
    async fn ping(&self) -> AnyResult<Duration>;

    /// Write all points in `batch` to `batch.database`.
    async fn write(&self, batch: &BatchPoints) -> AnyResult<()>;
}

/// The connection the reporter currently uses, tagged with how many times the
/// reporter has connected before it.
pub struct ConnectionHandle {
    generation: u64,
    connection: Box<dyn StoreConnection>,
}

impl ConnectionHandle {
    pub fn new(generation: u64, connection: Box<dyn StoreConnection>) -> Self {
        Self {
            generation,
            connection,
        }
    }

    /// 0 for the connection opened at construction, incremented by every
    /// successful reconnect.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn connection(&self) -> &dyn StoreConnection {
        self.connection.as_ref()
    }
}

impl Debug for ConnectionHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
