//! Core library for the SkyView weather dashboard.
//!
//! This crate defines:
//! - The location store (active location, bounded recent list, search)
//! - The weather gateway over the remote weather proxy
//! - A categorized error taxonomy for user-facing messages
//! - Configuration, persistence and geolocation collaborators
//! - The dashboard orchestrator that sequences store and gateway calls
//!
//! It is used by `skyview-cli`, but can also be embedded by other front ends.

pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod gateway;
pub mod geolocation;
pub mod location;
pub mod model;
pub mod persist;
pub mod proxy;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use dashboard::{Dashboard, Notice, Notifier};
pub use debounce::SearchDebouncer;
pub use error::{ErrorCategory, WeatherError};
pub use gateway::{LocationTarget, WeatherGateway};
pub use location::LocationStore;
pub use model::{Location, LocationId, WeatherSnapshot};
pub use proxy::{HttpProxy, WeatherProxy};
