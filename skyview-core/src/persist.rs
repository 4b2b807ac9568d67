use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, path::PathBuf};

use crate::{config::Config, model::Location};

/// Everything the location store needs to come back after a restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub current: Option<Location>,
    /// Most recent first.
    #[serde(default)]
    pub recent: Vec<Location>,
}

/// Write-through target of the location store. Failures are logged by the store.
pub trait LocationStorage: Send + Sync + Debug {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<LocationSnapshot>>;

    fn store(&self, snapshot: &LocationSnapshot) -> Result<()>;
}

/// Snapshot kept as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the platform data directory.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::locations_file_path()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl LocationStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<LocationSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read locations file: {}", self.path.display()))?;

        let snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse locations file: {}", self.path.display()))?;

        Ok(Some(snapshot))
    }

    fn store(&self, snapshot: &LocationSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize locations")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write locations file: {}", self.path.display()))?;

        Ok(())
    }
}
