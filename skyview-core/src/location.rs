//! The location store: which location is active and which are remembered.
//!
//! One store is constructed at startup and shared through an `Arc`. All
//! read-modify-write sequences on the recent list run under a single write
//! lock, so selection stays exclusive on multi-threaded runtimes too.

use parking_lot::RwLock;
use serde_json::Value;
use std::{collections::HashSet, sync::Arc, time::Duration};

use crate::{
    config::Config,
    error::{Result, WeatherError},
    geolocation::GeolocationProvider,
    model::{Coordinates, Location, LocationId},
    persist::{LocationSnapshot, LocationStorage},
    proxy::{ProxyQuery, WeatherProxy},
};

/// Queries shorter than this (after trimming) never reach the network.
pub const MIN_QUERY_LEN: usize = 2;

pub const DEFAULT_RECENT_CAPACITY: usize = 10;

/// Name given to a location obtained from the position fallback.
pub const GEOLOCATED_NAME: &str = "Current Location";

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub recent_capacity: usize,
    /// Ask the geolocation provider when nothing has been selected.
    pub geolocation_fallback: bool,
    pub geolocation_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            geolocation_fallback: false,
            geolocation_timeout: Duration::from_secs(10),
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recent_capacity: config.recent_capacity,
            geolocation_fallback: config.geolocation.enabled,
            geolocation_timeout: config.geolocation_timeout(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    current: Option<Location>,
    /// Most recently selected first, unique ids.
    recent: Vec<Location>,
}

impl StoreState {
    fn from_snapshot(snapshot: LocationSnapshot, capacity: usize) -> Self {
        let mut seen = HashSet::new();
        let mut recent = snapshot.recent;
        recent.retain(|l| seen.insert(l.id.clone()));
        recent.truncate(capacity);

        let mut state = Self { current: snapshot.current, recent };
        let current_id = state.current.as_ref().map(|c| c.id.clone());

        for loc in &mut state.recent {
            loc.is_saved = true;
            loc.is_current_location = current_id.as_ref() == Some(&loc.id);
        }

        if let Some(current) = &mut state.current {
            current.is_current_location = true;
            current.is_saved = state.recent.iter().any(|l| l.id == current.id);
        }

        state
    }

    fn snapshot(&self) -> LocationSnapshot {
        LocationSnapshot { current: self.current.clone(), recent: self.recent.clone() }
    }

    fn resolve(&self, id: &LocationId) -> Option<Location> {
        if let Some(current) = self.current.as_ref().filter(|c| &c.id == id) {
            return Some(current.clone());
        }
        self.recent.iter().find(|l| &l.id == id).cloned()
    }

    fn promote(&mut self, mut location: Location, capacity: usize) -> Location {
        for loc in &mut self.recent {
            loc.is_current_location = false;
        }

        location.is_current_location = true;
        location.is_saved = true;

        self.recent.retain(|l| l.id != location.id);
        self.recent.insert(0, location.clone());
        self.current = Some(location.clone());
        self.evict(capacity);

        location
    }

    fn save(&mut self, mut location: Location, capacity: usize) -> Location {
        let is_current = self.current.as_ref().is_some_and(|c| c.id == location.id);
        location.is_saved = true;
        location.is_current_location = is_current;

        match self.recent.iter_mut().find(|l| l.id == location.id) {
            Some(existing) => *existing = location.clone(),
            None => self.recent.insert(0, location.clone()),
        }

        if is_current {
            self.current = Some(location.clone());
        }
        self.evict(capacity);

        location
    }

    fn unsave(&mut self, id: &LocationId) {
        self.recent.retain(|l| &l.id != id);
        if let Some(current) = self.current.as_mut().filter(|c| &c.id == id) {
            current.is_saved = false;
        }
    }

    /// Drop entries past `capacity` from the tail.
    fn evict(&mut self, capacity: usize) {
        if self.recent.len() <= capacity {
            return;
        }

        for evicted in self.recent.drain(capacity..) {
            tracing::debug!(id = %evicted.id, "evicting location from recent list");
            if let Some(current) = self.current.as_mut().filter(|c| c.id == evicted.id) {
                current.is_saved = false;
            }
        }
    }
}

#[derive(Debug)]
pub struct LocationStore {
    proxy: Arc<dyn WeatherProxy>,
    geolocation: Arc<dyn GeolocationProvider>,
    storage: Option<Box<dyn LocationStorage>>,
    options: StoreOptions,
    state: RwLock<StoreState>,
}

impl LocationStore {
    pub fn new(
        proxy: Arc<dyn WeatherProxy>,
        geolocation: Arc<dyn GeolocationProvider>,
        options: StoreOptions,
    ) -> Self {
        Self {
            proxy,
            geolocation,
            storage: None,
            options: StoreOptions { recent_capacity: options.recent_capacity.max(1), ..options },
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Store that reloads its state from `storage` and writes every change back.
    ///
    /// An unreadable snapshot is logged and the store starts empty.
    pub fn with_storage(
        proxy: Arc<dyn WeatherProxy>,
        geolocation: Arc<dyn GeolocationProvider>,
        options: StoreOptions,
        storage: Box<dyn LocationStorage>,
    ) -> Self {
        let mut store = Self::new(proxy, geolocation, options);

        match storage.load() {
            Ok(Some(snapshot)) => {
                let state = StoreState::from_snapshot(snapshot, store.options.recent_capacity);
                tracing::debug!(recent = state.recent.len(), "restored saved locations");
                store.state = RwLock::new(state);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable saved locations"),
        }

        store.storage = Some(storage);
        store
    }

    pub fn capacity(&self) -> usize {
        self.options.recent_capacity
    }

    /// Search places by name.
    ///
    /// Short queries return nothing without a network call. Upstream and
    /// format failures degrade to an empty list so interactive search keeps
    /// working; network failures are returned.
    pub async fn search(&self, query: &str) -> Result<Vec<Location>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        match self.proxy.invoke(&ProxyQuery::Search(query.to_string())).await {
            Ok(items @ Value::Array(_)) => match serde_json::from_value::<Vec<Location>>(items) {
                Ok(results) => {
                    tracing::debug!(query, results = results.len(), "location search finished");
                    Ok(results)
                }
                Err(e) => {
                    tracing::warn!(query, error = %e, "discarding unusable search results");
                    Ok(Vec::new())
                }
            },
            Ok(Value::Null) => Ok(Vec::new()),
            Ok(other) => {
                tracing::warn!(query, kind = json_kind(&other), "search returned no usable content");
                Ok(Vec::new())
            }
            Err(err @ (WeatherError::Upstream(_) | WeatherError::Format(_))) => {
                tracing::warn!(query, error = %err, "location search degraded to empty result");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// The selected location without any fallback.
    pub fn active(&self) -> Option<Location> {
        self.state.read().current.clone()
    }

    /// The selected location, or the device position when the fallback is
    /// enabled. Denial, unavailability and timeouts all yield `None`.
    pub async fn current(&self) -> Option<Location> {
        if let Some(current) = self.active() {
            return Some(current);
        }

        if !self.options.geolocation_fallback {
            return None;
        }

        match tokio::time::timeout(self.options.geolocation_timeout, self.geolocation.locate()).await {
            Ok(Ok(coords)) => {
                tracing::info!(lat = coords.lat, lon = coords.lon, "using device location");
                Some(geolocated(coords))
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "geolocation fallback failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.options.geolocation_timeout.as_secs_f64(),
                    "geolocation fallback timed out"
                );
                None
            }
        }
    }

    /// Recent and saved locations, most recent first.
    pub fn saved(&self) -> Vec<Location> {
        self.state.read().recent.clone()
    }

    /// Look an id up in the active location, then the recent list.
    pub fn resolve(&self, id: &LocationId) -> Option<Location> {
        self.state.read().resolve(id)
    }

    /// Make `location` the active one and move it to the front of the
    /// recent list.
    pub fn select(&self, location: Location) -> Location {
        let mut state = self.state.write();
        let selected = state.promote(location, self.options.recent_capacity);
        tracing::info!(id = %selected.id, name = %selected.name, "selected location");
        self.write_through(&state);
        selected
    }

    /// Like [`select`](Self::select) for a location already known to the store.
    pub fn select_by_id(&self, id: &LocationId) -> Result<Location> {
        let mut state = self.state.write();
        let location = state
            .resolve(id)
            .ok_or_else(|| WeatherError::NotFound(format!("location '{id}' is not in the store")))?;

        let selected = state.promote(location, self.options.recent_capacity);
        tracing::info!(id = %selected.id, name = %selected.name, "selected location");
        self.write_through(&state);
        Ok(selected)
    }

    /// Remember a location without making it active.
    pub fn save(&self, location: Location) -> Location {
        let mut state = self.state.write();
        let saved = state.save(location, self.options.recent_capacity);
        tracing::debug!(id = %saved.id, "saved location");
        self.write_through(&state);
        saved
    }

    /// Forget a location. Succeeds whether or not the id was present.
    pub fn unsave(&self, id: &LocationId) -> bool {
        let mut state = self.state.write();
        let before = state.recent.len();
        state.unsave(id);

        if state.recent.len() != before {
            tracing::debug!(%id, "removed saved location");
            self.write_through(&state);
        }
        true
    }

    pub fn snapshot(&self) -> LocationSnapshot {
        self.state.read().snapshot()
    }

    fn write_through(&self, state: &StoreState) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.store(&state.snapshot()) {
                tracing::warn!(error = %e, "failed to persist locations");
            }
        }
    }
}

fn geolocated(coords: Coordinates) -> Location {
    let mut location = Location::new(
        format!("geo:{:.4},{:.4}", coords.lat, coords.lon),
        GEOLOCATED_NAME,
        "",
        coords.lat,
        coords.lon,
    );
    location.is_current_location = true;
    location
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
