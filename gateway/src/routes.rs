//! Disaster data, report download, and analytics routes

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use geo_report::{export, DisasterType, ReportFormat};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: msg.into() }),
    )
}

pub fn not_found(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: msg.into() }),
    )
}

pub fn internal_error(err: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Raw zone collection for one disaster type
pub async fn get_disaster_data(
    State(state): State<AppState>,
    Path(disaster_type): Path<String>,
) -> Result<Json<geojson::FeatureCollection>, ApiError> {
    let disaster_type: DisasterType = disaster_type
        .parse()
        .map_err(|_| bad_request("Invalid disaster type"))?;

    let collection = state
        .generator
        .store()
        .load_or_empty(disaster_type)
        .map_err(|e| {
            tracing::error!("Disaster data error: {}", e);
            internal_error("Failed to load disaster data")
        })?;

    Ok(Json(collection))
}

#[derive(Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "type")]
    pub disaster_type: Option<String>,
    pub format: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Kilometers
    pub radius: Option<f64>,
}

/// Generate and download a radius report as a CSV or GeoJSON attachment
pub async fn download_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    let disaster_type: DisasterType = query
        .disaster_type
        .as_deref()
        .unwrap_or("flood")
        .parse()
        .map_err(|_| bad_request("Invalid disaster type"))?;
    let format: ReportFormat = query
        .format
        .as_deref()
        .unwrap_or("csv")
        .parse()
        .map_err(|_| bad_request("Invalid report format"))?;

    let lat = query.lat.unwrap_or(0.0);
    let lon = query.lon.unwrap_or(0.0);
    let radius = query.radius.unwrap_or(10.0);

    let report = state
        .generator
        .generate(disaster_type, lat, lon, radius)
        .map_err(|e| {
            tracing::error!("Report generation error: {}", e);
            internal_error("Failed to generate report")
        })?;

    let payload = export(&report, format).map_err(|e| {
        tracing::error!("Report export error: {}", e);
        internal_error("Failed to generate report")
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(payload.content_type),
    );
    let disposition = format!("attachment; filename=\"{}\"", payload.filename);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(internal_error)?,
    );

    Ok((headers, payload.bytes))
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub total_incidents: usize,
    pub by_type: BTreeMap<DisasterType, usize>,
    pub trend_data: Vec<MonthlyTrend>,
    pub risk_distribution: RiskDistribution,
}

#[derive(Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub incidents: u32,
}

#[derive(Serialize, Default)]
pub struct RiskDistribution {
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

/// Aggregate view across all disaster types.
///
/// Per-type counts come from the zone store; the monthly trend and the
/// risk split are simulated placeholders.
pub async fn get_analytics(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let mut rng = rand::thread_rng();

    let mut by_type = BTreeMap::new();
    let mut total_incidents = 0;
    let mut risk_distribution = RiskDistribution::default();

    for ty in DisasterType::ALL {
        let count = state.generator.store().feature_count(ty).map_err(|e| {
            tracing::error!("Analytics error: {}", e);
            internal_error("Failed to load analytics")
        })?;
        by_type.insert(ty, count);
        total_incidents += count;

        let high: i64 = rng.gen_range(10..=30);
        let medium: i64 = rng.gen_range(20..=50);
        let low = count as i64 - high - medium;
        risk_distribution.high += high;
        risk_distribution.medium += medium;
        risk_distribution.low += low.max(0);
    }

    let now = Utc::now();
    let trend_data = (0..12)
        .rev()
        .map(|months_back| MonthlyTrend {
            month: (now - Duration::days(30 * months_back))
                .format("%Y-%m")
                .to_string(),
            incidents: rng.gen_range(50..=200),
        })
        .collect();

    Ok(Json(AnalyticsResponse {
        total_incidents,
        by_type,
        trend_data,
        risk_distribution,
    }))
}
