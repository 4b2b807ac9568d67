use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinates;

/// Connection settings for the weather proxy function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// URL of the proxy function, e.g. "https://example.com/functions/weather".
    pub endpoint: Option<String>,
    /// Optional bearer token sent with every call.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { endpoint: None, api_key: None, timeout_secs: 15 }
    }
}

/// Platform location fallback used when no location has been selected yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
    /// Fixed position reported by the static provider.
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self { enabled: false, timeout_secs: 10, lat: None, lon: None }
    }
}

impl GeolocationConfig {
    pub fn fixed_position(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// hourly_count = 12
///
/// [proxy]
/// endpoint = "https://example.com/functions/weather"
///
/// [geolocation]
/// enabled = true
/// lat = 40.7
/// lon = -74.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub proxy: ProxyConfig,
    pub hourly_count: usize,
    pub forecast_days: usize,
    pub recent_capacity: usize,
    pub search_debounce_ms: u64,
    pub geolocation: GeolocationConfig,
    /// Write saved/current locations through to a JSON file.
    pub persist_locations: bool,
    /// Show an informational notice when a search finds nothing.
    pub notify_empty_search: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            hourly_count: 24,
            forecast_days: 7,
            recent_capacity: 10,
            search_debounce_ms: 300,
            geolocation: GeolocationConfig::default(),
            persist_locations: true,
            notify_empty_search: false,
        }
    }
}

impl Config {
    /// Proxy endpoint, or an error with a hint on how to set it.
    pub fn proxy_endpoint(&self) -> Result<&str> {
        self.proxy.endpoint.as_deref().filter(|e| !e.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No weather proxy endpoint configured.\n\
                 Hint: run `skyview configure` and enter the proxy URL."
            )
        })
    }

    pub fn is_proxy_configured(&self) -> bool {
        self.proxy_endpoint().is_ok()
    }

    pub fn set_proxy_endpoint(&mut self, endpoint: String) {
        self.proxy.endpoint = Some(endpoint.trim().to_string());
    }

    /// Empty keys clear the stored key.
    pub fn set_api_key(&mut self, api_key: String) {
        let key = api_key.trim();
        self.proxy.api_key = if key.is_empty() { None } else { Some(key.to_string()) };
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy.timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn geolocation_timeout(&self) -> Duration {
        Duration::from_secs(self.geolocation.timeout_secs)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the saved-locations snapshot.
    pub fn locations_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("locations.json"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "skyview", "skyview")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
