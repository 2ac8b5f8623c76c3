//! Weather tools backed by the Open-Meteo API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ToolError, ToolResult};

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

pub const DEFAULT_FORECAST_HOURS: u32 = 24;
pub const MAX_FORECAST_HOURS: u32 = 168;
const MAX_HOURLY_DAYS: u32 = 7;
const DAILY_FORECAST_DAYS: u32 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub time: String,
    pub temperature: f64,
    pub weather_code: i32,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyWeather {
    pub time: String,
    pub temperature: f64,
    pub weather_code: i32,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyWeather {
    pub date: String,
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub weather_code: i32,
    pub wind_speed_max: f64,
}

/// Source of weather data.
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Latitude and longitude of the best match for `city`, if any.
    async fn coordinates(&self, city: &str) -> ToolResult<Option<(f64, f64)>>;

    async fn current(&self, latitude: f64, longitude: f64) -> ToolResult<CurrentWeather>;

    /// The next `hours` hourly entries. May return fewer if the source has fewer.
    async fn hourly(&self, latitude: f64, longitude: f64, hours: u32)
    -> ToolResult<Vec<HourlyWeather>>;

    /// The forecast for `date` (`YYYY-MM-DD`), if it is within range.
    async fn daily(
        &self,
        latitude: f64,
        longitude: f64,
        date: &str,
    ) -> ToolResult<Option<DailyWeather>>;
}

/// Requested hours, defaulted and clamped to `[1, 168]`.
pub fn clamp_hours(requested: Option<i64>) -> u32 {
    requested
        .map(|h| h.clamp(1, MAX_FORECAST_HOURS as i64) as u32)
        .unwrap_or(DEFAULT_FORECAST_HOURS)
}

/// Days of forecast to fetch for `hours` hourly entries, rounded up.
pub fn forecast_days(hours: u32) -> u32 {
    hours.div_ceil(24).clamp(1, MAX_HOURLY_DAYS)
}

/// Human-readable text for a WMO weather interpretation code.
pub fn describe_code(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snowfall",
        73 => "Moderate snowfall",
        75 => "Heavy snowfall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Formatting
// ─────────────────────────────────────────────────────────────────────────────

pub fn format_current(city: &str, w: &CurrentWeather) -> String {
    format!(
        "Current weather in {} ({}): {}, {:.1}°C, wind {:.1} km/h",
        city,
        w.time,
        describe_code(w.weather_code),
        w.temperature,
        w.wind_speed
    )
}

pub fn format_hourly(city: &str, entries: &[HourlyWeather]) -> String {
    let mut out = format!("Hourly forecast for {} ({} hours):", city, entries.len());
    for e in entries {
        out.push_str(&format!(
            "\n{}: {}, {:.1}°C, wind {:.1} km/h",
            e.time,
            describe_code(e.weather_code),
            e.temperature,
            e.wind_speed
        ));
    }
    out
}

pub fn format_daily(city: &str, d: &DailyWeather) -> String {
    format!(
        "Forecast for {} on {}: {}, {:.1}°C to {:.1}°C, wind up to {:.1} km/h",
        city,
        d.date,
        describe_code(d.weather_code),
        d.temperature_min,
        d.temperature_max,
        d.wind_speed_max
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Open-Meteo
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: Option<String>,
    temperature_2m: Option<f64>,
    weather_code: Option<i32>,
    wind_speed_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HourlyResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    weather_code: Vec<i32>,
    wind_speed_10m: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    daily: Option<DailyBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DailyBlock {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weather_code: Vec<i32>,
    wind_speed_10m_max: Vec<f64>,
}

/// [`WeatherService`] over the public Open-Meteo endpoints.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> ToolResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            geocoding_url: GEOCODING_URL.to_string(),
            forecast_url: FORECAST_URL.to_string(),
        })
    }

    /// Point the client at other endpoints.
    pub fn with_urls(mut self, geocoding_url: impl Into<String>, forecast_url: impl Into<String>) -> Self {
        self.geocoding_url = geocoding_url.into();
        self.forecast_url = forecast_url.into();
        self
    }

    async fn forecast<T: serde::de::DeserializeOwned>(
        &self,
        latitude: f64,
        longitude: f64,
        extra: &[(&str, String)],
    ) -> ToolResult<T> {
        let mut query = vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("timezone", "auto".to_string()),
        ];
        query.extend(extra.iter().map(|(k, v)| (*k, v.clone())));

        let response = self
            .http
            .get(&self.forecast_url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl WeatherService for OpenMeteoClient {
    async fn coordinates(&self, city: &str) -> ToolResult<Option<(f64, f64)>> {
        let response: GeocodingResponse = self
            .http
            .get(&self.geocoding_url)
            .query(&[("name", city), ("count", "1"), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .results
            .and_then(|r| r.into_iter().next())
            .and_then(|r| Some((r.latitude?, r.longitude?))))
    }

    async fn current(&self, latitude: f64, longitude: f64) -> ToolResult<CurrentWeather> {
        let response: CurrentResponse = self
            .forecast(
                latitude,
                longitude,
                &[("current", "temperature_2m,weather_code,wind_speed_10m".to_string())],
            )
            .await?;

        let incomplete = || ToolError::Weather("incomplete current conditions".to_string());
        let current = response.current.ok_or_else(incomplete)?;
        Ok(CurrentWeather {
            time: current.time.ok_or_else(incomplete)?,
            temperature: current.temperature_2m.ok_or_else(incomplete)?,
            weather_code: current.weather_code.ok_or_else(incomplete)?,
            wind_speed: current.wind_speed_10m.ok_or_else(incomplete)?,
        })
    }

    async fn hourly(
        &self,
        latitude: f64,
        longitude: f64,
        hours: u32,
    ) -> ToolResult<Vec<HourlyWeather>> {
        let response: HourlyResponse = self
            .forecast(
                latitude,
                longitude,
                &[
                    ("hourly", "temperature_2m,weather_code,wind_speed_10m".to_string()),
                    ("forecast_days", forecast_days(hours).to_string()),
                ],
            )
            .await?;

        let block = response.hourly.unwrap_or_default();
        let count = (hours as usize)
            .min(block.time.len())
            .min(block.temperature_2m.len())
            .min(block.weather_code.len())
            .min(block.wind_speed_10m.len());

        Ok((0..count)
            .map(|i| HourlyWeather {
                time: block.time[i].clone(),
                temperature: block.temperature_2m[i],
                weather_code: block.weather_code[i],
                wind_speed: block.wind_speed_10m[i],
            })
            .collect())
    }

    async fn daily(
        &self,
        latitude: f64,
        longitude: f64,
        date: &str,
    ) -> ToolResult<Option<DailyWeather>> {
        let response: DailyResponse = self
            .forecast(
                latitude,
                longitude,
                &[
                    (
                        "daily",
                        "temperature_2m_max,temperature_2m_min,weather_code,wind_speed_10m_max"
                            .to_string(),
                    ),
                    ("forecast_days", DAILY_FORECAST_DAYS.to_string()),
                ],
            )
            .await?;

        let block = response.daily.unwrap_or_default();
        Ok(pick_day(&block, date))
    }
}

fn pick_day(block: &DailyBlock, date: &str) -> Option<DailyWeather> {
    let i = block.time.iter().position(|t| t.starts_with(date))?;
    Some(DailyWeather {
        date: block.time[i].clone(),
        temperature_max: *block.temperature_2m_max.get(i)?,
        temperature_min: *block.temperature_2m_min.get(i)?,
        weather_code: *block.weather_code.get(i)?,
        wind_speed_max: *block.wind_speed_10m_max.get(i)?,
    })
}
