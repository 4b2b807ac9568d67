use async_trait::async_trait;
use std::fmt::Debug;

use crate::{config::GeolocationConfig, model::Coordinates};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Provider for hosts without a position source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl GeolocationProvider for NoGeolocation {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unavailable)
    }
}

/// Reports a fixed position, typically the user's configured home.
#[derive(Debug, Clone, Copy)]
pub struct StaticGeolocation {
    position: Coordinates,
}

impl StaticGeolocation {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationProvider for StaticGeolocation {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.position)
    }
}

/// Pick a provider for the given settings.
pub fn provider_from_config(config: &GeolocationConfig) -> Box<dyn GeolocationProvider> {
    match config.fixed_position() {
        Some(position) => Box::new(StaticGeolocation::new(position)),
        None => Box::new(NoGeolocation),
    }
}
