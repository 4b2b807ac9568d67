use std::{fmt, sync::Arc};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};
use skyview_core::{Config, Dashboard, Location, LocationId, Notice, Notifier};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skyview", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the weather proxy and optional fixed position.
    Configure,

    #[command(flatten)]
    Dashboard(DashboardCommand),
}

/// Commands that need a configured proxy.
#[derive(Debug, Subcommand)]
pub enum DashboardCommand {
    /// Search for locations by name.
    Search {
        /// City or place name, at least two characters.
        query: String,
    },

    /// Search, pick a result and show its weather.
    Add {
        query: String,
    },

    /// Switch to a saved location and show its weather.
    Use {
        id: String,
    },

    /// Show weather for the current location, or a saved one by id.
    Show {
        #[arg(long)]
        id: Option<String>,
    },

    /// List saved locations.
    Saved,

    /// Remove a location from the saved list.
    Unsave {
        id: String,
    },

    /// Reload weather for the current location.
    Refresh,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Dashboard(command) => run_dashboard(command).await,
        }
    }
}

async fn run_dashboard(command: DashboardCommand) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(
        endpoint = config.proxy.endpoint.as_deref().unwrap_or("<unset>"),
        persist = config.persist_locations,
        "configuration loaded"
    );
    let mut dashboard = Dashboard::from_config(&config, Arc::new(TerminalNotifier))?;

    match command {
        DashboardCommand::Search { query } => {
            let results = dashboard.search(&query).await?;
            if results.is_empty() {
                println!("No locations found for \"{}\".", query.trim());
            }
            for location in &results {
                println!("{:<12} {}", location.id.as_str(), location.display_name());
            }
        }
        DashboardCommand::Add { query } => {
            let results = dashboard.search(&query).await?;
            if results.is_empty() {
                bail!("No locations found for \"{}\".", query.trim());
            }

            let choices: Vec<Choice> = results.into_iter().map(Choice).collect();
            let Choice(location) = Select::new("Pick a location:", choices).prompt()?;

            dashboard.change_location(location).await?;
            print_dashboard(&dashboard);
        }
        DashboardCommand::Use { id } => {
            dashboard.select_saved(&LocationId::from(id)).await?;
            print_dashboard(&dashboard);
        }
        DashboardCommand::Show { id: Some(id) } => {
            dashboard.select_saved(&LocationId::from(id)).await?;
            print_dashboard(&dashboard);
        }
        DashboardCommand::Show { id: None } => {
            dashboard.initialize().await?;
            print_dashboard(&dashboard);
        }
        DashboardCommand::Saved => {
            let current = dashboard.store().active().map(|l| l.id);
            let saved = dashboard.saved();
            if saved.is_empty() {
                println!("No saved locations yet. Try `skyview add <query>`.");
            }
            for location in saved {
                let marker = if current.as_ref() == Some(&location.id) { "*" } else { " " };
                println!("{marker} {:<12} {}", location.id.as_str(), location.display_name());
            }
        }
        DashboardCommand::Unsave { id } => {
            dashboard.remove_saved(&LocationId::from(id));
        }
        DashboardCommand::Refresh => {
            if dashboard.restore().await.is_none() {
                bail!("No location selected.\nHint: run `skyview add <query>` first.");
            }
            dashboard.refresh().await?;
            print_dashboard(&dashboard);
        }
    }

    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let current = config.proxy.endpoint.clone().unwrap_or_default();
    let endpoint = Text::new("Weather proxy URL:").with_default(&current).prompt()?;
    config.set_proxy_endpoint(endpoint);

    let api_key = Password::new("API key (leave empty for none):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key);

    let use_position = Confirm::new("Use a fixed position when no location is selected?")
        .with_default(config.geolocation.enabled)
        .prompt()?;
    config.geolocation.enabled = use_position;

    if use_position {
        let lat = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a latitude in degrees")
            .prompt()?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a longitude in degrees")
            .prompt()?;
        config.geolocation.lat = Some(lat);
        config.geolocation.lon = Some(lon);
    }

    config.save()?;
    let path = Config::config_file_path().context("Failed to resolve config path")?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    let Some(location) = dashboard.location() else {
        println!("No location selected. Try `skyview add <query>`.");
        return;
    };

    match dashboard.weather() {
        Some(weather) => print!("{}", render::snapshot(location, weather, dashboard.last_updated())),
        None => {
            if let Some(error) = dashboard.error() {
                println!("{}: {error}", location.display_name());
            }
        }
    }
}

/// Notices go to stderr so stdout stays clean for the weather itself.
#[derive(Debug)]
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let prefix = match notice {
            Notice::Success(_) => "ok",
            Notice::Info(_) => "info",
            Notice::Error(_) => "error",
        };
        eprintln!("[{prefix}] {}", notice.message());
    }
}

struct Choice(Location);

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.display_name())
    }
}
