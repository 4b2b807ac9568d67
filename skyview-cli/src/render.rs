//! Plain-text rendering of a weather snapshot.

use std::fmt::Write;

use chrono::{DateTime, Local, Utc};
use skyview_core::{Location, WeatherSnapshot};

/// Hourly rows shown in the terminal; the snapshot may carry more.
const HOURLY_ROWS: usize = 12;

pub fn snapshot(location: &Location, weather: &WeatherSnapshot, updated: Option<DateTime<Utc>>) -> String {
    let mut out = String::new();
    let current = &weather.current;

    let _ = writeln!(out, "{}", location.display_name());
    let _ = writeln!(
        out,
        "  {:.0}°C, {} (feels like {:.0}°C)",
        current.temperature, current.condition, current.feels_like
    );
    let _ = writeln!(
        out,
        "  Humidity {}%  Wind {:.1} m/s  Pressure {:.0} hPa",
        current.humidity, current.wind_speed, current.pressure
    );
    let _ = writeln!(out, "  Observed {}", local(current.timestamp).format("%a %H:%M"));

    if !weather.hourly.is_empty() {
        let _ = writeln!(out, "\nHourly");
        for hour in weather.hourly.iter().take(HOURLY_ROWS) {
            let _ = writeln!(
                out,
                "  {}  {:>4.0}°C  {:>3}%  {}",
                local(hour.hour).format("%H:%M"),
                hour.temperature,
                hour.precipitation_chance,
                hour.condition
            );
        }
    }

    if !weather.forecast.is_empty() {
        let _ = writeln!(out, "\nForecast");
        for day in &weather.forecast {
            let _ = writeln!(
                out,
                "  {}  {:>4.0}° / {:>3.0}°  {:>3}%  {}",
                day.date.format("%a %d %b"),
                day.high_temp,
                day.low_temp,
                day.precipitation_chance,
                day.condition
            );
        }
    }

    if let Some(updated) = updated {
        let _ = writeln!(out, "\nUpdated {}", local(updated).format("%H:%M:%S"));
    }

    out
}

fn local(at: DateTime<Utc>) -> DateTime<Local> {
    at.with_timezone(&Local)
}
