use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Connection settings for an InfluxDB (1.x HTTP API) server.
#[derive(Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct InfluxDbConfig {
    /// Base URL of the server, e.g. `http://localhost:8086`.
    pub url: String,

    /// Database every batch is written to.
    pub database: String,

    /// User name for basic authentication.
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication.
    #[serde(default)]
    pub password: Option<String>,

    /// Tags attached to every point written by the reporter.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Timeout of a single HTTP request, in milliseconds.
    ///
    /// `None` leaves requests unbounded.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl InfluxDbConfig {
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            username: None,
            password: None,
            tags: BTreeMap::new(),
            request_timeout_ms: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

// Hand-written so that the password never ends up in logs.
impl fmt::Debug for InfluxDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluxDbConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("tags", &self.tags)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}
