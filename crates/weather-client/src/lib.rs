//! OpenWeatherMap client for the dashboard
//!
//! Current conditions, 3-hourly forecast, and city geocoding, with a
//! TTL cache for current conditions keyed by rounded coordinates.
//! Transport and schema failures surface as typed errors; the client
//! never retries, callers decide.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Error, Debug, Clone)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    RequestFailed(String),
    #[error("weather API error: {0}")]
    ApiError(String),
    #[error("invalid weather data format: {0}")]
    ParseError(String),
    #[error("city not found: {0}")]
    CityNotFound(String),
}

pub type Result<T> = std::result::Result<T, WeatherError>;

/// Client configuration
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
    pub geo_url: String,
    /// Cache TTL for current conditions in seconds
    pub cache_ttl_sec: u64,
    /// Request timeout in seconds
    pub timeout_sec: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            geo_url: "https://api.openweathermap.org/geo/1.0".to_string(),
            cache_ttl_sec: 300,
            timeout_sec: 10,
        }
    }
}

impl WeatherConfig {
    /// Read the API key from `OPENWEATHER_API_KEY`
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("OPENWEATHER_API_KEY").unwrap_or_default(),
            ..Self::default()
        }
    }
}

/// Current conditions at a coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub description: String,
    pub icon: String,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub visibility_km: f64,
    pub city: String,
    pub country: String,
}

/// One 3-hourly forecast slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub datetime: String,
    pub temperature: f64,
    pub description: String,
    pub icon: String,
    pub humidity: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub city: String,
    pub country: String,
    pub forecasts: Vec<ForecastEntry>,
}

/// Geocoder hit for a city name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoMatch {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
    pub state: String,
}

// ---- Raw OpenWeatherMap response shapes ----

#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    main: OwmMain,
    weather: Vec<OwmWeatherDesc>,
    wind: OwmWind,
    visibility: Option<f64>,
    name: String,
    sys: OwmSys,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    humidity: f64,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWeatherDesc {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
    city: OwmCity,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt_txt: String,
    main: OwmMain,
    weather: Vec<OwmWeatherDesc>,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwmGeoEntry {
    lat: f64,
    lon: f64,
    name: String,
    country: Option<String>,
    state: Option<String>,
}

struct CacheEntry {
    weather: CurrentWeather,
    expires_at: Instant,
}

/// OpenWeatherMap API client with a read-through cache
pub struct WeatherClient {
    config: WeatherConfig,
    client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_env() -> Self {
        Self::new(WeatherConfig::from_env())
    }

    /// Cache key from coordinates rounded to 2 decimal places
    fn cache_key(lat: f64, lon: f64) -> String {
        format!("{:.2},{:.2}", lat, lon)
    }

    /// Current conditions for a coordinate
    pub async fn current(&self, lat: f64, lon: f64) -> Result<CurrentWeather> {
        let key = Self::cache_key(lat, lon);

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&key) {
                if entry.expires_at > Instant::now() {
                    debug!("Weather cache hit for {}", key);
                    return Ok(entry.weather.clone());
                }
            }
        }

        let url = format!(
            "{}/weather?lat={:.6}&lon={:.6}&appid={}&units=metric",
            self.config.base_url, lat, lon, self.config.api_key
        );
        let raw: OwmCurrentResponse = self.fetch_json(&url).await?;
        let weather = convert_current(raw)?;

        {
            let mut cache = self.cache.write().await;
            cache.insert(
                key,
                CacheEntry {
                    weather: weather.clone(),
                    expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_sec),
                },
            );
        }

        Ok(weather)
    }

    /// Forecast in 3-hour slots, 8 per day. `days` is capped at 5
    /// (the free-tier forecast window).
    pub async fn forecast(&self, lat: f64, lon: f64, days: u32) -> Result<Forecast> {
        let days = days.clamp(1, 5);
        let url = format!(
            "{}/forecast?lat={:.6}&lon={:.6}&appid={}&units=metric&cnt={}",
            self.config.base_url,
            lat,
            lon,
            self.config.api_key,
            days * 8
        );
        let raw: OwmForecastResponse = self.fetch_json(&url).await?;
        Ok(convert_forecast(raw))
    }

    /// Resolve a city name to coordinates (best match)
    pub async fn geocode(&self, city_name: &str) -> Result<GeoMatch> {
        let url = format!(
            "{}/direct?q={}&limit=1&appid={}",
            self.config.geo_url,
            urlencode(city_name),
            self.config.api_key
        );
        let entries: Vec<OwmGeoEntry> = self.fetch_json(&url).await?;
        first_geo_match(entries).ok_or_else(|| WeatherError::CityNotFound(city_name.to_string()))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WeatherError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WeatherError::ApiError(format!(
                "OpenWeatherMap returned status: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::ParseError(e.to_string()))
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    /// (total entries, still-valid entries)
    pub async fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read().await;
        let total = cache.len();
        let valid = cache
            .values()
            .filter(|e| e.expires_at > Instant::now())
            .count();
        (total, valid)
    }
}

fn convert_current(raw: OwmCurrentResponse) -> Result<CurrentWeather> {
    let desc = raw
        .weather
        .first()
        .ok_or_else(|| WeatherError::ParseError("missing weather block".to_string()))?;

    Ok(CurrentWeather {
        temperature: raw.main.temp,
        feels_like: raw.main.feels_like,
        humidity: raw.main.humidity,
        pressure: raw.main.pressure,
        description: title_case(&desc.description),
        icon: desc.icon.clone(),
        wind_speed: raw.wind.speed,
        wind_direction: raw.wind.deg,
        visibility_km: raw.visibility.unwrap_or(0.0) / 1000.0,
        city: raw.name,
        country: raw.sys.country,
    })
}

fn convert_forecast(raw: OwmForecastResponse) -> Forecast {
    let forecasts = raw
        .list
        .into_iter()
        .map(|item| {
            let (description, icon) = item
                .weather
                .first()
                .map(|w| (title_case(&w.description), w.icon.clone()))
                .unwrap_or_default();
            ForecastEntry {
                datetime: item.dt_txt,
                temperature: item.main.temp,
                description,
                icon,
                humidity: item.main.humidity,
                wind_speed: item.wind.speed,
            }
        })
        .collect();

    Forecast {
        city: raw.city.name,
        country: raw.city.country,
        forecasts,
    }
}

fn first_geo_match(entries: Vec<OwmGeoEntry>) -> Option<GeoMatch> {
    entries.into_iter().next().map(|e| GeoMatch {
        lat: e.lat,
        lon: e.lon,
        name: e.name,
        country: e.country.unwrap_or_default(),
        state: e.state.unwrap_or_default(),
    })
}

/// Uppercase the first letter of each word ("scattered clouds" ->
/// "Scattered Clouds")
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Minimal percent-encoding for the city query parameter
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = std::fmt::Write::write_fmt(&mut out, format_args!("%{:02X}", byte));
            }
        }
    }
    out
}
