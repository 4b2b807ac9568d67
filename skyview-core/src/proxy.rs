//! Client side of the remote weather proxy function.
//!
//! The proxy takes a query string (`?action=forecast&lat=..&lon=..` or
//! `?action=search&query=..`) and answers with a JSON envelope
//! `{ success, data?, error? }`. Implementations of [`WeatherProxy`] return
//! the unwrapped `data` payload and classify every failure into a
//! [`WeatherError`] category at the point it is detected.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    error::WeatherError,
    model::Coordinates,
};

pub mod http;

pub use http::HttpProxy;

/// One call to the proxy.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyQuery {
    /// Current conditions, hourly and daily forecast in one payload.
    Forecast(Coordinates),
    /// Place-name search.
    Search(String),
}

impl ProxyQuery {
    pub fn action(&self) -> &'static str {
        match self {
            ProxyQuery::Forecast(_) => "forecast",
            ProxyQuery::Search(_) => "search",
        }
    }

    /// Query string forwarded by the proxy to the weather API.
    pub fn to_query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("action", self.action());

        match self {
            ProxyQuery::Forecast(coords) => {
                query.append_pair("lat", &coords.lat.to_string());
                query.append_pair("lon", &coords.lon.to_string());
            }
            ProxyQuery::Search(text) => {
                query.append_pair("query", text);
            }
        }

        format!("?{}", query.finish())
    }
}

#[async_trait]
pub trait WeatherProxy: Send + Sync + Debug {
    /// Perform a single call and return the envelope's `data`
    /// (`Value::Null` when the proxy sent none).
    async fn invoke(&self, query: &ProxyQuery) -> Result<Value, WeatherError>;
}

/// Response envelope produced by the proxy.
#[derive(Debug, Deserialize)]
pub struct ProxyEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl ProxyEnvelope {
    /// Parse a response body: empty or non-envelope bodies are `Format`
    /// failures, `success: false` is an `Upstream` failure.
    pub fn unwrap_body(body: &str) -> Result<Value, WeatherError> {
        if body.trim().is_empty() {
            return Err(WeatherError::Format("empty response body".into()));
        }

        let envelope: ProxyEnvelope = serde_json::from_str(body)
            .map_err(|e| WeatherError::Format(format!("invalid proxy response: {e}")))?;

        envelope.into_data()
    }

    pub fn into_data(self) -> Result<Value, WeatherError> {
        if !self.success {
            let message = match self.error {
                Some(Value::String(s)) if !s.trim().is_empty() => s,
                Some(Value::Null) | None => "request failed".to_string(),
                Some(Value::String(_)) => "request failed".to_string(),
                Some(other) => other.to_string(),
            };
            return Err(WeatherError::Upstream(message));
        }

        Ok(self.data.unwrap_or(Value::Null))
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
