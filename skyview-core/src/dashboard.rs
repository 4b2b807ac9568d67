//! Dashboard state machine: the sequencing a front end needs on top of the
//! store and the gateway, without any rendering.
//!
//! A location change always writes through the store before the weather
//! fetch is issued, and a failed fetch clears the displayed snapshot.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::{fmt::Debug, sync::Arc};

use crate::{
    config::Config,
    error::{Result, WeatherError},
    gateway::{GatewayOptions, WeatherGateway},
    geolocation,
    location::{LocationStore, MIN_QUERY_LEN, StoreOptions},
    model::{Location, LocationId, WeatherSnapshot},
    persist::JsonFileStorage,
    proxy::{HttpProxy, WeatherProxy},
};

/// A human-readable message for the notification surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Info(m) | Notice::Error(m) => m,
        }
    }
}

/// Where notices go; the presentation layer decides how they look.
pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, notice: Notice);

    fn success(&self, message: &str) {
        self.notify(Notice::Success(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.notify(Notice::Info(message.to_string()));
    }

    /// User-facing message for a failed operation.
    fn error(&self, error: &WeatherError) {
        self.notify(Notice::from(error));
    }
}

/// Keeps every notice in memory until taken.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    /// Emit an info notice when a search finds nothing.
    pub notify_empty_search: bool,
}

impl DashboardOptions {
    pub fn from_config(config: &Config) -> Self {
        Self { notify_empty_search: config.notify_empty_search }
    }
}

#[derive(Debug)]
pub struct Dashboard {
    store: Arc<LocationStore>,
    gateway: Arc<WeatherGateway>,
    notifier: Arc<dyn Notifier>,
    options: DashboardOptions,
    location: Option<Location>,
    weather: Option<WeatherSnapshot>,
    error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl Dashboard {
    pub fn new(
        store: Arc<LocationStore>,
        gateway: Arc<WeatherGateway>,
        notifier: Arc<dyn Notifier>,
        options: DashboardOptions,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            options,
            location: None,
            weather: None,
            error: None,
            last_updated: None,
        }
    }

    /// Wire up the HTTP proxy, geolocation, storage and gateway from config.
    pub fn from_config(config: &Config, notifier: Arc<dyn Notifier>) -> anyhow::Result<Self> {
        let proxy: Arc<dyn WeatherProxy> = Arc::new(HttpProxy::from_config(config)?);
        let geolocation = Arc::from(geolocation::provider_from_config(&config.geolocation));
        let options = StoreOptions::from_config(config);

        let store = if config.persist_locations {
            let storage = JsonFileStorage::default_location()?;
            tracing::debug!(path = %storage.path().display(), "persisting locations");
            LocationStore::with_storage(proxy.clone(), geolocation, options, Box::new(storage))
        } else {
            LocationStore::new(proxy.clone(), geolocation, options)
        };
        let store = Arc::new(store);

        let gateway = Arc::new(WeatherGateway::new(proxy, store.clone(), GatewayOptions::from_config(config)));

        Ok(Self::new(store, gateway, notifier, DashboardOptions::from_config(config)))
    }

    pub fn store(&self) -> &Arc<LocationStore> {
        &self.store
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.weather.as_ref()
    }

    /// User-facing message of the last failed load, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn saved(&self) -> Vec<Location> {
        self.store.saved()
    }

    /// Pick up the remembered (or geolocated) location and load its weather.
    pub async fn initialize(&mut self) -> Result<()> {
        match self.restore().await {
            Some(location) => self.load(location).await,
            None => Ok(()),
        }
    }

    /// Pick up the remembered (or geolocated) location without fetching.
    pub async fn restore(&mut self) -> Option<Location> {
        let Some(location) = self.store.current().await else {
            tracing::debug!("no location to restore");
            return None;
        };

        self.location = Some(location.clone());
        Some(location)
    }

    /// Make `location` current, then load its weather.
    pub async fn change_location(&mut self, location: Location) -> Result<()> {
        let selected = self.store.select(location);
        self.show(selected).await
    }

    /// Switch to a location from the saved list.
    pub async fn select_saved(&mut self, id: &LocationId) -> Result<()> {
        let selected = self.store.select_by_id(id).inspect_err(|e| {
            self.notifier.error(e);
        })?;
        self.show(selected).await
    }

    pub fn remove_saved(&mut self, id: &LocationId) -> bool {
        let removed = self.store.unsave(id);
        if removed {
            self.notifier.success("Location removed from favorites");
        }
        removed
    }

    /// Fetch again for the current location. Does nothing without one.
    pub async fn refresh(&mut self) -> Result<()> {
        let Some(location) = self.location.clone() else {
            return Ok(());
        };

        match self.load(location).await {
            Ok(()) => {
                self.notifier.success("Weather data updated!");
                Ok(())
            }
            Err(e) => {
                self.notifier.error(&e);
                Err(e)
            }
        }
    }

    /// Location search for the search box.
    pub async fn search(&self, query: &str) -> Result<Vec<Location>> {
        match self.store.search(query).await {
            Ok(results) => {
                let searched = query.trim().chars().count() >= MIN_QUERY_LEN;
                if results.is_empty() && searched && self.options.notify_empty_search {
                    self.notifier.info(&format!("No locations found for \"{}\"", query.trim()));
                }
                Ok(results)
            }
            Err(e) => {
                self.notifier.error(&e);
                Err(e)
            }
        }
    }

    /// Go back to the location picker.
    pub fn clear_location(&mut self) {
        self.location = None;
        self.weather = None;
        self.error = None;
    }

    async fn show(&mut self, location: Location) -> Result<()> {
        let name = location.name.clone();
        self.location = Some(location.clone());

        match self.load(location).await {
            Ok(()) => {
                self.notifier.success(&format!("Weather loaded for {name}"));
                Ok(())
            }
            Err(e) => {
                self.notifier.error(&e);
                Err(e)
            }
        }
    }

    async fn load(&mut self, location: Location) -> Result<()> {
        self.error = None;

        match self.gateway.location_weather(location).await {
            Ok(snapshot) => {
                self.weather = Some(snapshot);
                self.last_updated = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, category = %e.category(), "failed to load weather");
                self.weather = None;
                self.error = Some(e.user_message().into_owned());
                Err(e)
            }
        }
    }
}

impl From<&WeatherError> for Notice {
    fn from(value: &WeatherError) -> Self {
        Notice::Error(value.user_message().into_owned())
    }
}
