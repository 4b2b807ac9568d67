use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::{fmt, sync::Arc, time::Duration};

use crate::{
    error::WeatherError,
    geolocation::{GeolocationError, GeolocationProvider},
    model::{Coordinates, Location},
    persist::{LocationSnapshot, LocationStorage},
    proxy::{ProxyQuery, WeatherProxy},
};

type Responder = Box<dyn Fn(&ProxyQuery) -> Result<Value, WeatherError> + Send + Sync>;
type Latency = Box<dyn Fn(&ProxyQuery) -> Duration + Send + Sync>;

/// Proxy answering from a closure and recording every call.
pub(crate) struct StubProxy {
    respond: Responder,
    latency: Latency,
    calls: Mutex<Vec<ProxyQuery>>,
}

impl StubProxy {
    pub fn new(respond: impl Fn(&ProxyQuery) -> Result<Value, WeatherError> + Send + Sync + 'static) -> Self {
        Self { respond: Box::new(respond), latency: Box::new(|_| Duration::ZERO), calls: Mutex::new(Vec::new()) }
    }

    /// Same answer for every call.
    pub fn returning(result: Result<Value, WeatherError>) -> Self {
        Self::new(move |_| result.clone())
    }

    /// Simulated round-trip time per query.
    pub fn with_latency(mut self, latency: impl Fn(&ProxyQuery) -> Duration + Send + Sync + 'static) -> Self {
        self.latency = Box::new(latency);
        self
    }

    pub fn calls(&self) -> Vec<ProxyQuery> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for StubProxy {
    fn default() -> Self {
        Self::returning(Ok(Value::Null))
    }
}

impl fmt::Debug for StubProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubProxy").field("calls", &self.calls.lock().len()).finish()
    }
}

#[async_trait]
impl WeatherProxy for StubProxy {
    async fn invoke(&self, query: &ProxyQuery) -> Result<Value, WeatherError> {
        self.calls.lock().push(query.clone());

        let latency = (self.latency)(query);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        (self.respond)(query)
    }
}

#[derive(Debug)]
pub(crate) struct FailingGeolocation(pub GeolocationError);

#[async_trait]
impl GeolocationProvider for FailingGeolocation {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(self.0.clone())
    }
}

/// Never answers, like a permission prompt nobody clicks.
#[derive(Debug)]
pub(crate) struct PendingGeolocation;

#[async_trait]
impl GeolocationProvider for PendingGeolocation {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        std::future::pending().await
    }
}

/// Storage shared between store instances of one test.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStorage {
    inner: Arc<Mutex<(Option<LocationSnapshot>, usize)>>,
}

impl MemoryStorage {
    pub fn with_snapshot(snapshot: LocationSnapshot) -> Self {
        Self { inner: Arc::new(Mutex::new((Some(snapshot), 0))) }
    }

    pub fn writes(&self) -> usize {
        self.inner.lock().1
    }
}

impl LocationStorage for MemoryStorage {
    fn load(&self) -> anyhow::Result<Option<LocationSnapshot>> {
        Ok(self.inner.lock().0.clone())
    }

    fn store(&self, snapshot: &LocationSnapshot) -> anyhow::Result<()> {
        let mut inner = self.inner.lock();
        inner.0 = Some(snapshot.clone());
        inner.1 += 1;
        Ok(())
    }
}

pub(crate) fn location(id: &str, name: &str) -> Location {
    Location::new(id, name, "Testland", 10.0, 20.0)
}

/// Payload shaped like the proxy's `action=forecast` data.
pub(crate) fn forecast_payload(hours: usize, days: usize) -> Value {
    let hourly: Vec<Value> = (0..hours)
        .map(|h| {
            json!({
                "hour": format!("2026-10-18T{:02}:00:00Z", h % 24),
                "temperature": 15.0 + h as f64,
                "condition": "partly-cloudy",
                "precipitationChance": 10
            })
        })
        .collect();

    let forecast: Vec<Value> = (0..days)
        .map(|d| {
            json!({
                "date": format!("2026-10-{:02}", 18 + d),
                "highTemp": 20.0,
                "lowTemp": 10.0,
                "condition": "rainy",
                "precipitationChance": 70
            })
        })
        .collect();

    json!({
        "current": {
            "temperature": 18.5,
            "feelsLike": 17.0,
            "humidity": 72,
            "windSpeed": 4.2,
            "pressure": 1013.0,
            "condition": "cloudy",
            "timestamp": "2026-10-18T09:30:00Z"
        },
        "hourly": hourly,
        "forecast": forecast
    })
}
