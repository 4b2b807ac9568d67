//! Weather lookups for a location, one proxy call per request.

use std::sync::Arc;

use crate::{
    config::Config,
    error::{Result, WeatherError},
    location::LocationStore,
    model::{CurrentConditions, DailyForecast, HourlyForecast, Location, LocationId, WeatherSnapshot},
    proxy::{ProxyQuery, WeatherProxy},
};

/// Which location a weather request is for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationTarget {
    /// Whatever the store currently has selected.
    Active,
    /// A location known to the store.
    Id(LocationId),
    /// A fully specified location, used as is.
    Location(Location),
}

impl From<Location> for LocationTarget {
    fn from(value: Location) -> Self {
        LocationTarget::Location(value)
    }
}

impl From<LocationId> for LocationTarget {
    fn from(value: LocationId) -> Self {
        LocationTarget::Id(value)
    }
}

#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub hourly_count: usize,
    pub forecast_days: usize,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self { hourly_count: 24, forecast_days: 7 }
    }
}

impl GatewayOptions {
    pub fn from_config(config: &Config) -> Self {
        Self { hourly_count: config.hourly_count, forecast_days: config.forecast_days }
    }
}

#[derive(Debug)]
pub struct WeatherGateway {
    proxy: Arc<dyn WeatherProxy>,
    store: Arc<LocationStore>,
    options: GatewayOptions,
}

impl WeatherGateway {
    pub fn new(proxy: Arc<dyn WeatherProxy>, store: Arc<LocationStore>, options: GatewayOptions) -> Self {
        Self { proxy, store, options }
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    /// Turn a target into a concrete location with usable coordinates.
    pub fn resolve(&self, target: LocationTarget) -> Result<Location> {
        let location = match target {
            LocationTarget::Location(location) => location,
            LocationTarget::Id(id) => self
                .store
                .resolve(&id)
                .ok_or_else(|| WeatherError::NotFound(format!("location '{id}' is not in the store")))?,
            LocationTarget::Active => self
                .store
                .active()
                .ok_or_else(|| WeatherError::Validation("no location selected".into()))?,
        };

        let valid = location.lat.is_finite()
            && location.lon.is_finite()
            && (-90.0..=90.0).contains(&location.lat)
            && (-180.0..=180.0).contains(&location.lon);
        if !valid {
            return Err(WeatherError::Validation(format!(
                "location '{}' has invalid coordinates ({}, {})",
                location.id, location.lat, location.lon
            )));
        }

        Ok(location)
    }

    /// Current conditions plus hourly and daily forecasts, capped to the
    /// configured counts.
    pub async fn location_weather(&self, target: impl Into<LocationTarget>) -> Result<WeatherSnapshot> {
        let mut snapshot = self.fetch(target.into()).await?;
        snapshot.truncate(self.options.hourly_count, self.options.forecast_days);
        Ok(snapshot)
    }

    pub async fn current_weather(&self, target: impl Into<LocationTarget>) -> Result<CurrentConditions> {
        Ok(self.fetch(target.into()).await?.current)
    }

    pub async fn forecast(&self, target: impl Into<LocationTarget>, days: usize) -> Result<Vec<DailyForecast>> {
        let mut forecast = self.fetch(target.into()).await?.forecast;
        forecast.truncate(days);
        Ok(forecast)
    }

    pub async fn hourly_forecast(
        &self,
        target: impl Into<LocationTarget>,
        hours: usize,
    ) -> Result<Vec<HourlyForecast>> {
        let mut hourly = self.fetch(target.into()).await?.hourly;
        hourly.truncate(hours);
        Ok(hourly)
    }

    async fn fetch(&self, target: LocationTarget) -> Result<WeatherSnapshot> {
        let location = self.resolve(target)?;
        let data = self.proxy.invoke(&ProxyQuery::Forecast(location.coordinates())).await?;

        if data.is_null() {
            return Err(WeatherError::Format("response carried no weather data".into()));
        }

        let snapshot: WeatherSnapshot = serde_json::from_value(data)
            .map_err(|e| WeatherError::Format(format!("unexpected weather payload: {e}")))?;

        tracing::info!(
            id = %location.id,
            name = %location.name,
            hourly = snapshot.hourly.len(),
            days = snapshot.forecast.len(),
            "loaded weather"
        );

        Ok(snapshot)
    }
}
