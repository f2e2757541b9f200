//! Risk prediction route (simulated model)

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use risk_model::{FeatureVector, RiskAssessment};

use crate::AppState;

#[derive(Deserialize)]
pub struct PredictQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Assess disaster risk for a coordinate.
///
/// The feature extraction and the default model are simulated; see the
/// risk-model crate.
pub async fn ml_predict(
    State(state): State<AppState>,
    Query(query): Query<PredictQuery>,
) -> Json<RiskAssessment> {
    let lat = query.lat.unwrap_or(0.0);
    let lon = query.lon.unwrap_or(0.0);

    let features = FeatureVector::extract(lat, lon, &mut rand::thread_rng());
    Json(state.risk.assess(&features))
}
