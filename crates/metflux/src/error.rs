use thiserror::Error;

/// Reasons a [`Reporter`](crate::Reporter) cannot be constructed.
///
/// This is the only error surfaced to the caller directly; failures of the
/// running reporter are logged.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// The configuration has no store connection settings.
    #[error("no influxdb configuration found")]
    MissingStoreConfig,

    /// The store URL does not parse.
    #[error("unable to parse InfluxDB url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The initial connection could not be opened.
    #[error("unable to make InfluxDB client: {0:#}")]
    Connect(anyhow::Error),
}
