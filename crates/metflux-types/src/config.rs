//! Reporter configuration.
//!
//! [`ReporterSettings`] is the serializable part of a reporter's
//! configuration: where to connect and how often to export and ping.  The
//! parts that can only be expressed in code (the registry, custom metric
//! rules, callbacks, panic handlers) live next to the reporter itself.

use crate::transport::influxdb::InfluxDbConfig;
use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Export interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Ping interval used when none is configured.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReporterSettings {
    /// Store connection settings.  Required; a reporter cannot be built
    /// without it.
    pub influxdb: Option<InfluxDbConfig>,

    /// Time between two consecutive exports, in milliseconds.
    ///
    /// 0 selects [`DEFAULT_INTERVAL`].
    pub interval_ms: u64,

    /// Time between two consecutive liveness checks of the store
    /// connection, in milliseconds.  A failed check triggers a reconnect.
    ///
    /// 0 selects [`DEFAULT_PING_INTERVAL`].
    pub ping_interval_ms: u64,
}

impl ReporterSettings {
    pub fn new(influxdb: InfluxDbConfig) -> Self {
        Self {
            influxdb: Some(influxdb),
            ..Default::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = duration_to_millis(interval);
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval_ms = duration_to_millis(interval);
        self
    }

    /// Returns a copy of these settings with zero intervals replaced by
    /// their defaults.
    pub fn resolved(&self) -> Self {
        Self {
            influxdb: self.influxdb.clone(),
            interval_ms: non_zero_or(self.interval_ms, DEFAULT_INTERVAL),
            ping_interval_ms: non_zero_or(self.ping_interval_ms, DEFAULT_PING_INTERVAL),
        }
    }

    /// Export interval, with the default applied.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(non_zero_or(self.interval_ms, DEFAULT_INTERVAL))
    }

    /// Ping interval, with the default applied.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(non_zero_or(self.ping_interval_ms, DEFAULT_PING_INTERVAL))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reporter config '{}'", path.display()))?;
        Self::from_yaml_str(&yaml)
            .with_context(|| format!("failed to parse reporter config '{}'", path.display()))
    }
}

/// Whole milliseconds in `duration`, rounded up so that only the zero
/// duration maps to 0.  Saturates at `u64::MAX`.
fn duration_to_millis(duration: Duration) -> u64 {
    if duration.is_zero() {
        return 0;
    }
    let millis = duration.as_nanos().div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

fn non_zero_or(millis: u64, default: Duration) -> u64 {
    if millis == 0 {
        duration_to_millis(default)
    } else {
        millis
    }
}

#[cfg(test)]
mod test {
    use super::{ReporterSettings, DEFAULT_INTERVAL, DEFAULT_PING_INTERVAL};
    use crate::InfluxDbConfig;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn zero_intervals_resolve_to_defaults() {
        let settings = ReporterSettings::new(InfluxDbConfig::new("http://localhost:8086", "db"));
        let resolved = settings.resolved();

        assert_eq!(resolved.interval(), DEFAULT_INTERVAL);
        assert_eq!(resolved.ping_interval(), DEFAULT_PING_INTERVAL);
        assert_eq!(resolved.interval_ms, 10_000);
        assert_eq!(resolved.ping_interval_ms, 5_000);

        // The input is left alone.
        assert_eq!(settings.interval_ms, 0);
        assert_eq!(settings.ping_interval_ms, 0);
    }

    #[test]
    fn explicit_intervals_are_kept() {
        let settings = ReporterSettings::new(InfluxDbConfig::new("http://localhost:8086", "db"))
            .with_interval(Duration::from_secs(60))
            .with_ping_interval(Duration::from_millis(250))
            .resolved();

        assert_eq!(settings.interval(), Duration::from_secs(60));
        assert_eq!(settings.ping_interval(), Duration::from_millis(250));
    }

    #[test]
    fn sub_millisecond_intervals_round_up() {
        let settings = ReporterSettings::new(InfluxDbConfig::new("http://localhost:8086", "db"))
            .with_interval(Duration::from_micros(500))
            .with_ping_interval(Duration::from_micros(1500));

        assert_eq!(settings.interval(), Duration::from_millis(1));
        assert_eq!(settings.ping_interval(), Duration::from_millis(2));
        assert_eq!(settings.resolved().interval_ms, 1);

        let settings = settings
            .with_interval(Duration::ZERO)
            .with_ping_interval(Duration::MAX);
        assert_eq!(settings.interval(), DEFAULT_INTERVAL);
        assert_eq!(settings.ping_interval_ms, u64::MAX);
    }

    #[test]
    fn parse_yaml() {
        let yaml = r#"
influxdb:
  url: http://influx.internal:8086
  database: telemetry
  username: writer
  password: secret
  tags:
    env: prod
    region: eu-west-1
interval_ms: 30000
"#;
        let settings = ReporterSettings::from_yaml_str(yaml).unwrap();
        let influxdb = settings.influxdb.as_ref().unwrap();

        assert_eq!(influxdb.url, "http://influx.internal:8086");
        assert_eq!(influxdb.database, "telemetry");
        assert_eq!(influxdb.username.as_deref(), Some("writer"));
        assert_eq!(influxdb.password.as_deref(), Some("secret"));
        assert_eq!(influxdb.tags.get("env").map(String::as_str), Some("prod"));
        assert_eq!(influxdb.tags.len(), 2);
        assert_eq!(settings.interval(), Duration::from_secs(30));
        assert_eq!(settings.ping_interval(), DEFAULT_PING_INTERVAL);
    }

    #[test]
    fn parse_yaml_without_store() {
        let settings = ReporterSettings::from_yaml_str("ping_interval_ms: 1000").unwrap();
        assert!(settings.influxdb.is_none());
        assert_eq!(settings.ping_interval(), Duration::from_secs(1));
    }

    #[test]
    fn parse_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "influxdb:\n  url: http://localhost:8086\n  database: metrics"
        )
        .unwrap();

        let settings = ReporterSettings::from_yaml_file(file.path()).unwrap();
        assert_eq!(settings.influxdb.unwrap().database, "metrics");
    }

    #[test]
    fn missing_yaml_file() {
        let err = ReporterSettings::from_yaml_file("/nonexistent/metflux.yaml").unwrap_err();
        assert!(err.to_string().contains("failed to read reporter config"));
    }
}
