use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a location, unique within the store.
///
/// The proxy hands out both numeric and string ids; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for LocationId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for LocationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => LocationId(s),
            RawId::Number(n) => LocationId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A place the dashboard can show weather for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    /// True for at most one location at a time.
    #[serde(default)]
    pub is_current_location: bool,
    /// True while the location is kept in the recent list.
    #[serde(default)]
    pub is_saved: bool,
}

impl Location {
    pub fn new(
        id: impl Into<LocationId>,
        name: impl Into<String>,
        country: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            country: country.into(),
            lat,
            lon,
            is_current_location: false,
            is_saved: false,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lon: self.lon }
    }

    /// "City, Country", or just the city when no country is known.
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// Condition tag as sent by the weather proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Sunny,
    ClearDay,
    ClearNight,
    PartlyCloudy,
    PartlyCloudyDay,
    PartlyCloudyNight,
    Cloudy,
    Overcast,
    Rain,
    Snow,
    Thunderstorm,
    Fog,
    Unknown,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Sunny => "sunny",
            Condition::ClearDay => "clear-day",
            Condition::ClearNight => "clear-night",
            Condition::PartlyCloudy => "partly-cloudy",
            Condition::PartlyCloudyDay => "partly-cloudy-day",
            Condition::PartlyCloudyNight => "partly-cloudy-night",
            Condition::Cloudy => "cloudy",
            Condition::Overcast => "overcast",
            Condition::Rain => "rain",
            Condition::Snow => "snow",
            Condition::Thunderstorm => "thunderstorm",
            Condition::Fog => "fog",
            Condition::Unknown => "unknown",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "sunny" => Condition::Sunny,
            "clear-day" | "clear" => Condition::ClearDay,
            "clear-night" => Condition::ClearNight,
            "partly-cloudy" => Condition::PartlyCloudy,
            "partly-cloudy-day" => Condition::PartlyCloudyDay,
            "partly-cloudy-night" => Condition::PartlyCloudyNight,
            "cloudy" => Condition::Cloudy,
            "overcast" => Condition::Overcast,
            "rain" | "rainy" | "drizzle" => Condition::Rain,
            "snow" | "snowy" | "sleet" => Condition::Snow,
            "thunderstorm" | "storm" => Condition::Thunderstorm,
            "fog" | "mist" => Condition::Fog,
            _ => Condition::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Condition::Sunny | Condition::ClearDay => "Sunny",
            Condition::ClearNight => "Clear",
            Condition::PartlyCloudy | Condition::PartlyCloudyDay | Condition::PartlyCloudyNight => {
                "Partly Cloudy"
            }
            Condition::Cloudy => "Cloudy",
            Condition::Overcast => "Overcast",
            Condition::Rain => "Rain",
            Condition::Snow => "Snow",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Fog => "Fog",
            Condition::Unknown => "Unknown",
        }
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Condition::from_tag(&value)
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub temperature: f64,
    pub feels_like: f64,
    #[serde(deserialize_with = "lenient::percent")]
    pub humidity: u8,
    pub wind_speed: f64,
    pub pressure: f64,
    pub condition: Condition,
    #[serde(deserialize_with = "lenient::instant")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    #[serde(deserialize_with = "lenient::instant")]
    pub hour: DateTime<Utc>,
    pub temperature: f64,
    pub condition: Condition,
    /// 0-100, rounded.
    #[serde(deserialize_with = "lenient::percent")]
    pub precipitation_chance: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    #[serde(deserialize_with = "lenient::calendar_date")]
    pub date: NaiveDate,
    pub high_temp: f64,
    pub low_temp: f64,
    pub condition: Condition,
    #[serde(deserialize_with = "lenient::percent")]
    pub precipitation_chance: u8,
}

/// Current conditions plus hourly and daily forecasts for one location.
///
/// Never persisted; fetched again on every location change or refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    #[serde(default)]
    pub hourly: Vec<HourlyForecast>,
    #[serde(default)]
    pub forecast: Vec<DailyForecast>,
}

impl WeatherSnapshot {
    /// Cap the hourly and daily sequences, keeping their leading entries.
    pub fn truncate(&mut self, hours: usize, days: usize) {
        self.hourly.truncate(hours);
        self.forecast.truncate(days);
    }
}

/// Deserializers for the loosely typed fields a browser-facing proxy emits:
/// fractional percentages, epoch-millisecond times and `toISOString()` dates.
mod lenient {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTime {
        Text(String),
        Millis(serde_json::Number),
    }

    fn from_millis<E: Error>(n: &serde_json::Number) -> Result<DateTime<Utc>, E> {
        let millis = match n.as_i64() {
            Some(ms) => ms,
            None => n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64).ok_or_else(|| {
                E::custom(format!("invalid epoch milliseconds: {n}"))
            })?,
        };
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| E::custom(format!("epoch milliseconds out of range: {millis}")))
    }

    /// Whole percent in 0..=100 from an integer or a float.
    pub fn percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(D::Error::custom("percentage is not a finite number"));
        }
        Ok(value.round().clamp(0.0, 100.0) as u8)
    }

    /// RFC 3339 text or epoch milliseconds.
    pub fn instant<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        match RawTime::deserialize(deserializer)? {
            RawTime::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| D::Error::custom(format!("invalid timestamp '{text}': {e}"))),
            RawTime::Millis(n) => from_millis(&n),
        }
    }

    /// `YYYY-MM-DD`, or the date part of a full timestamp.
    pub fn calendar_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        match RawTime::deserialize(deserializer)? {
            RawTime::Text(text) => {
                let text = text.trim();
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .or_else(|_| DateTime::parse_from_rfc3339(text).map(|t| t.date_naive()))
                    .map_err(|e| D::Error::custom(format!("invalid date '{text}': {e}")))
            }
            RawTime::Millis(n) => from_millis(&n).map(|t| t.date_naive()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_id_accepts_numbers_and_strings() {
        let numeric: LocationId = serde_json::from_str("5128581").unwrap();
        let text: LocationId = serde_json::from_str(r#""nyc""#).unwrap();

        assert_eq!(numeric, LocationId::from(5128581u64));
        assert_eq!(text.as_str(), "nyc");
    }

    #[test]
    fn location_flags_default_to_false() {
        let loc: Location = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "London",
            "country": "United Kingdom",
            "lat": 51.5,
            "lon": -0.12
        }))
        .unwrap();

        assert!(!loc.is_current_location);
        assert!(!loc.is_saved);
        assert_eq!(loc.display_name(), "London, United Kingdom");
    }

    #[test]
    fn location_serializes_camel_case() {
        let mut loc = Location::new("1", "Paris", "France", 48.85, 2.35);
        loc.is_saved = true;

        let value = serde_json::to_value(&loc).unwrap();
        assert_eq!(value["isSaved"], true);
        assert_eq!(value["isCurrentLocation"], false);
    }

    #[test]
    fn condition_tags_and_aliases() {
        assert_eq!(Condition::from_tag("partly-cloudy-night"), Condition::PartlyCloudyNight);
        assert_eq!(Condition::from_tag("rainy"), Condition::Rain);
        assert_eq!(Condition::from_tag("Snowy"), Condition::Snow);
        assert_eq!(Condition::from_tag("volcanic-ash"), Condition::Unknown);
    }

    #[test]
    fn condition_deserializes_from_tag() {
        let c: Condition = serde_json::from_str(r#""thunderstorm""#).unwrap();
        assert_eq!(c, Condition::Thunderstorm);
        assert_eq!(serde_json::to_string(&Condition::ClearDay).unwrap(), r#""clear-day""#);
    }

    #[test]
    fn snapshot_truncate_keeps_leading_entries() {
        let mut snapshot: WeatherSnapshot = serde_json::from_value(serde_json::json!({
            "current": {
                "temperature": 20.0, "feelsLike": 19.0, "humidity": 60,
                "windSpeed": 3.0, "pressure": 1012.0, "condition": "sunny",
                "timestamp": "2026-10-18T12:00:00Z"
            },
            "hourly": [
                { "hour": "2026-10-18T12:00:00Z", "temperature": 20.0, "condition": "sunny", "precipitationChance": 0 },
                { "hour": "2026-10-18T13:00:00Z", "temperature": 21.0, "condition": "cloudy", "precipitationChance": 10 }
            ],
            "forecast": [
                { "date": "2026-10-18", "highTemp": 22.0, "lowTemp": 12.0, "condition": "sunny", "precipitationChance": 0 },
                { "date": "2026-10-19", "highTemp": 18.0, "lowTemp": 10.0, "condition": "rain", "precipitationChance": 80 }
            ]
        }))
        .unwrap();

        snapshot.truncate(1, 1);

        assert_eq!(snapshot.hourly.len(), 1);
        assert_eq!(snapshot.hourly[0].temperature, 20.0);
        assert_eq!(snapshot.forecast.len(), 1);
        assert_eq!(snapshot.forecast[0].date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    }

    fn current_json(humidity: serde_json::Value, timestamp: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "temperature": 20.0, "feelsLike": 19.0, "humidity": humidity,
            "windSpeed": 3.0, "pressure": 1012.0, "condition": "sunny",
            "timestamp": timestamp
        })
    }

    #[test]
    fn fractional_percentages_are_rounded() {
        let current: CurrentConditions =
            serde_json::from_value(current_json(serde_json::json!(65.5), serde_json::json!("2026-10-18T12:00:00Z")))
                .unwrap();
        assert_eq!(current.humidity, 66);

        let hour: HourlyForecast = serde_json::from_value(serde_json::json!({
            "hour": "2026-10-18T13:00:00Z", "temperature": 21.0,
            "condition": "cloudy", "precipitationChance": 12.4
        }))
        .unwrap();
        assert_eq!(hour.precipitation_chance, 12);
    }

    #[test]
    fn percentages_outside_range_are_clamped() {
        let current: CurrentConditions =
            serde_json::from_value(current_json(serde_json::json!(104.2), serde_json::json!("2026-10-18T12:00:00Z")))
                .unwrap();
        assert_eq!(current.humidity, 100);
    }

    #[test]
    fn timestamps_accept_epoch_millis() {
        let current: CurrentConditions =
            serde_json::from_value(current_json(serde_json::json!(60), serde_json::json!(1760780000000i64))).unwrap();

        assert_eq!(current.timestamp, DateTime::from_timestamp_millis(1_760_780_000_000).unwrap());
    }

    #[test]
    fn timestamps_accept_offsets_and_fractional_seconds() {
        let current: CurrentConditions =
            serde_json::from_value(current_json(serde_json::json!(60), serde_json::json!("2026-10-18T14:00:00.000+02:00")))
                .unwrap();

        assert_eq!(current.timestamp.to_rfc3339(), "2026-10-18T12:00:00+00:00");
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let result: Result<CurrentConditions, _> =
            serde_json::from_value(current_json(serde_json::json!(60), serde_json::json!("yesterday")));
        assert!(result.is_err());
    }

    #[test]
    fn daily_date_accepts_full_iso_timestamps() {
        let day = |date: serde_json::Value| -> DailyForecast {
            serde_json::from_value(serde_json::json!({
                "date": date, "highTemp": 22.0, "lowTemp": 12.0,
                "condition": "sunny", "precipitationChance": 0
            }))
            .unwrap()
        };
        let expected = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        assert_eq!(day(serde_json::json!("2026-10-18")).date, expected);
        assert_eq!(day(serde_json::json!("2026-10-18T00:00:00.000Z")).date, expected);
        assert_eq!(day(serde_json::json!(1792281600000i64)).date, expected);
    }
}
