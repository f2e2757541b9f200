//! Weather and geocoding routes
//!
//! Thin pass-through to the OpenWeatherMap client. Failures here are
//! isolated to these routes and never affect report generation.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use weather_client::{CurrentWeather, Forecast, GeoMatch, WeatherError};

use crate::routes::{internal_error, not_found, ApiError};
use crate::AppState;

/// Current weather for a coordinate
pub async fn get_weather(
    State(state): State<AppState>,
    Path((lat, lon)): Path<(f64, f64)>,
) -> Result<Json<CurrentWeather>, ApiError> {
    state.weather.current(lat, lon).await.map(Json).map_err(|e| {
        tracing::error!("Weather API error: {}", e);
        internal_error("Failed to fetch weather data")
    })
}

#[derive(Deserialize)]
pub struct ForecastQuery {
    pub days: Option<u32>,
}

/// 3-hourly forecast for a coordinate
pub async fn get_forecast(
    State(state): State<AppState>,
    Path((lat, lon)): Path<(f64, f64)>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Forecast>, ApiError> {
    let days = query.days.unwrap_or(5);
    state
        .weather
        .forecast(lat, lon, days)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Forecast API error: {}", e);
            internal_error("Failed to fetch forecast data")
        })
}

/// Resolve a city name to coordinates
pub async fn search_city(
    State(state): State<AppState>,
    Path(city_name): Path<String>,
) -> Result<Json<GeoMatch>, ApiError> {
    state
        .weather
        .geocode(&city_name)
        .await
        .map(Json)
        .map_err(|e| match e {
            WeatherError::CityNotFound(_) => not_found("City not found"),
            other => {
                tracing::error!("City search error: {}", other);
                internal_error("City not found")
            }
        })
}
