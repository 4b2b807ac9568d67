use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, header::CONTENT_TYPE};
use serde_json::{Value, json};
use std::{fmt, time::Duration};

use crate::{
    config::Config,
    error::WeatherError,
    proxy::{ProxyEnvelope, ProxyQuery, WeatherProxy, truncate_body},
};

/// [`WeatherProxy`] reached over HTTP.
///
/// Each call is a single POST of `{"url": "<query string>"}`; nothing is
/// retried here.
#[derive(Clone)]
pub struct HttpProxy {
    endpoint: String,
    api_key: Option<String>,
    http: Client,
}

impl fmt::Debug for HttpProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProxy")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl HttpProxy {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the weather proxy")?;

        Ok(Self { endpoint: endpoint.into(), api_key, http })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let endpoint = config.proxy_endpoint()?;
        Self::new(endpoint, config.proxy.api_key.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WeatherProxy for HttpProxy {
    async fn invoke(&self, query: &ProxyQuery) -> Result<Value, WeatherError> {
        let url = query.to_query_string();
        tracing::debug!(action = query.action(), endpoint = %self.endpoint, "invoking weather proxy");

        let mut request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "url": url }));

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "weather proxy unreachable");
            WeatherError::Network(e.to_string())
        })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::Format(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(WeatherError::Format(format!(
                "proxy returned status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        ProxyEnvelope::unwrap_body(&body)
    }
}
