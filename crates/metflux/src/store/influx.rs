//! InfluxDB 1.x HTTP client: `GET /ping` and `POST /write`.

use super::line_protocol::encode_batch;
use super::{StoreConnection, StoreConnector};
use anyhow::{anyhow, bail, Context, Result as AnyResult};
use async_trait::async_trait;
use metflux_types::{BatchPoints, InfluxDbConfig};
use reqwest::{Client, RequestBuilder};
use std::time::{Duration, Instant};
use url::Url;

/// Parse and validate the server URL from `config`.
pub fn parse_url(config: &InfluxDbConfig) -> AnyResult<Url> {
    let url = Url::parse(&config.url)
        .with_context(|| format!("invalid InfluxDB url '{}'", config.url))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => bail!(
            "invalid InfluxDB url '{}': unsupported scheme '{scheme}'",
            config.url
        ),
    }
    if url.cannot_be_a_base() {
        bail!("invalid InfluxDB url '{}': not a base url", config.url);
    }
    Ok(url)
}

/// Opens [`InfluxConnection`]s.  Connecting builds the HTTP client without
/// contacting the server.
#[derive(Debug, Default, Clone)]
pub struct InfluxConnector;

impl StoreConnector for InfluxConnector {
    fn connect(&self, config: &InfluxDbConfig) -> AnyResult<Box<dyn StoreConnection>> {
        Ok(Box::new(InfluxConnection::new(config)?))
    }
}

pub struct InfluxConnection {
    client: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl InfluxConnection {
    pub fn new(config: &InfluxDbConfig) -> AnyResult<Self> {
        let base_url = parse_url(config)?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("failed to build InfluxDB HTTP client")?;

        Ok(Self {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint(&self, name: &str) -> AnyResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("InfluxDB url '{}' is not a base url", self.base_url))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        }
    }
}

#[async_trait]
impl StoreConnection for InfluxConnection {
    async fn ping(&self) -> AnyResult<Duration> {
        let start = Instant::now();
        let response = self
            .authenticate(self.client.get(self.endpoint("ping")?))
            .send()
            .await
            .context("InfluxDB ping request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("InfluxDB ping returned status {status}");
        }
        Ok(start.elapsed())
    }

    async fn write(&self, batch: &BatchPoints) -> AnyResult<()> {
        let mut body = String::new();
        if encode_batch(batch, &mut body) == 0 {
            return Ok(());
        }

        let response = self
            .authenticate(self.client.post(self.endpoint("write")?))
            .query(&[("db", batch.database.as_str()), ("precision", "ns")])
            .body(body)
            .send()
            .await
            .with_context(|| format!("InfluxDB write to database '{}' failed", batch.database))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!(
                "InfluxDB write to database '{}' returned status {status}: {}",
                batch.database,
                text.trim()
            );
        }
        Ok(())
    }
}
