//! Disaster risk scoring
//!
//! `RiskScorer` is the seam for real inference; the shipped
//! `PlaceholderModel` is a simulated stand-in that blends coordinate
//! heuristics with seedable noise. Its output is NOT predictive and is
//! only suitable for exercising the dashboard end to end.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use geo_report::DisasterType;

/// Ordered risk taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Map a [0, 1] score to a level: >= 0.7 high, >= 0.4 medium
    pub fn from_score(score: f64) -> Self {
        if score >= 0.7 {
            RiskLevel::High
        } else if score >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Environmental feature vector for a coordinate.
///
/// The non-coordinate channels are simulated; real extraction would
/// read satellite imagery and terrain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub lat: f64,
    pub lon: f64,
    /// Vegetation index, [0, 1]
    pub vegetation_index: f64,
    /// Surface water index, [0, 1]
    pub water_index: f64,
    /// Elevation, [0, 100]
    pub elevation: f64,
    /// Temperature, [0, 50]
    pub temperature: f64,
    /// Precipitation, [0, 200]
    pub precipitation: f64,
    /// Urbanization index, [0, 1]
    pub urbanization: f64,
}

impl FeatureVector {
    /// Channel count including the derived |lat| / |lon| channels
    pub const DIMENSIONS: usize = 10;

    pub fn extract(lat: f64, lon: f64, rng: &mut impl Rng) -> Self {
        Self {
            lat,
            lon,
            vegetation_index: rng.gen_range(0.0..1.0),
            water_index: rng.gen_range(0.0..1.0),
            elevation: rng.gen_range(0.0..100.0),
            temperature: rng.gen_range(0.0..50.0),
            precipitation: rng.gen_range(0.0..200.0),
            urbanization: rng.gen_range(0.0..1.0),
        }
    }
}

/// Per-hazard breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardRisk {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub factors: BTreeMap<String, f64>,
}

/// Full assessment for a coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub predictions: BTreeMap<DisasterType, HazardRisk>,
    pub features_extracted: usize,
    pub generated_at: DateTime<Utc>,
}

/// Scoring seam; implementations must be shareable across handlers
pub trait RiskScorer: Send + Sync {
    fn assess(&self, features: &FeatureVector) -> RiskAssessment;
}

/// Simulated model. Seedable so parity tests are deterministic.
pub struct PlaceholderModel {
    rng: Mutex<StdRng>,
}

impl PlaceholderModel {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn jitter(rng: &mut StdRng) -> f64 {
        rng.gen_range(-0.2..=0.2)
    }
}

impl Default for PlaceholderModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskScorer for PlaceholderModel {
    fn assess(&self, features: &FeatureVector) -> RiskAssessment {
        let mut rng = self.rng.lock().expect("risk model rng poisoned");

        let mut predictions = BTreeMap::new();
        predictions.insert(
            DisasterType::Flood,
            flood_risk(features, Self::jitter(&mut rng)),
        );
        predictions.insert(
            DisasterType::Wildfire,
            wildfire_risk(features, Self::jitter(&mut rng)),
        );
        predictions.insert(
            DisasterType::Drought,
            drought_risk(features, Self::jitter(&mut rng)),
        );
        predictions.insert(
            DisasterType::Earthquake,
            earthquake_risk(features, Self::jitter(&mut rng)),
        );

        let top_score = predictions
            .values()
            .map(|h| h.risk_score)
            .fold(0.0, f64::max);
        let confidence = (0.6 + 0.35 * top_score).min(0.95);

        debug!(
            "Simulated risk at ({}, {}): top score {:.3}",
            features.lat, features.lon, top_score
        );

        RiskAssessment {
            risk_level: RiskLevel::from_score(top_score),
            confidence,
            predictions,
            features_extracted: FeatureVector::DIMENSIONS,
            generated_at: Utc::now(),
        }
    }
}

fn hazard(score: f64, factors: BTreeMap<String, f64>) -> HazardRisk {
    let score = score.clamp(0.0, 1.0);
    HazardRisk {
        risk_score: score,
        risk_level: RiskLevel::from_score(score),
        factors,
    }
}

/// Higher near water and at low elevation
fn flood_risk(f: &FeatureVector, jitter: f64) -> HazardRisk {
    let elevation_factor = f.elevation / 100.0;
    let precipitation = f.precipitation / 200.0;
    let score =
        (1.0 - elevation_factor) * 0.4 + f.water_index * 0.3 + precipitation * 0.3 + jitter;

    hazard(
        score,
        BTreeMap::from([
            ("elevation".to_string(), elevation_factor),
            ("water_proximity".to_string(), f.water_index),
            ("precipitation".to_string(), precipitation),
        ]),
    )
}

/// Higher in dry, vegetated, hot areas
fn wildfire_risk(f: &FeatureVector, jitter: f64) -> HazardRisk {
    let temperature = f.temperature / 50.0;
    let precipitation = f.precipitation / 200.0;
    let score =
        f.vegetation_index * 0.4 + temperature * 0.4 + (1.0 - precipitation) * 0.2 + jitter;

    hazard(
        score,
        BTreeMap::from([
            ("vegetation".to_string(), f.vegetation_index),
            ("temperature".to_string(), temperature),
            ("dryness".to_string(), 1.0 - precipitation),
        ]),
    )
}

fn drought_risk(f: &FeatureVector, jitter: f64) -> HazardRisk {
    let precipitation = f.precipitation / 200.0;
    let temperature = f.temperature / 50.0;
    let score = (1.0 - precipitation) * 0.5
        + temperature * 0.3
        + (1.0 - f.vegetation_index) * 0.2
        + jitter;

    hazard(
        score,
        BTreeMap::from([
            ("precipitation_deficit".to_string(), 1.0 - precipitation),
            ("temperature".to_string(), temperature),
            ("vegetation_stress".to_string(), 1.0 - f.vegetation_index),
        ]),
    )
}

/// Base risk plus bonuses inside known seismic regions
fn earthquake_risk(f: &FeatureVector, jitter: f64) -> HazardRisk {
    let bonus = seismic_zone_bonus(f.lat, f.lon);
    let score = 0.3 + bonus + jitter;

    hazard(
        score,
        BTreeMap::from([
            ("base".to_string(), 0.3),
            ("seismic_zone".to_string(), bonus),
        ]),
    )
}

/// Simplified seismic zone boxes: California coast, New Madrid, Alaska
pub fn seismic_zone_bonus(lat: f64, lon: f64) -> f64 {
    let mut bonus = 0.0;
    if (-125.0..-115.0).contains(&lon) && (32.0..42.0).contains(&lat) {
        bonus += 0.5;
    }
    if (-92.0..-87.0).contains(&lon) && (33.0..40.0).contains(&lat) {
        bonus += 0.3;
    }
    if (-180.0..-130.0).contains(&lon) && (55.0..72.0).contains(&lat) {
        bonus += 0.4;
    }
    bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_features(lat: f64, lon: f64) -> FeatureVector {
        FeatureVector {
            lat,
            lon,
            vegetation_index: 0.5,
            water_index: 0.5,
            elevation: 50.0,
            temperature: 25.0,
            precipitation: 100.0,
            urbanization: 0.5,
        }
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.4), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.7), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::High);
    }

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_seismic_zone_bonus() {
        // San Francisco
        assert_eq!(seismic_zone_bonus(37.77, -122.42), 0.5);
        // Anchorage
        assert_eq!(seismic_zone_bonus(61.22, -149.90), 0.4);
        // Memphis (New Madrid)
        assert_eq!(seismic_zone_bonus(35.15, -90.05), 0.3);
        // Mid-Atlantic
        assert_eq!(seismic_zone_bonus(0.0, -30.0), 0.0);
    }

    #[test]
    fn test_scores_clamped_to_unit_interval() {
        let model = PlaceholderModel::seeded(7);
        for (lat, lon) in [(37.77, -122.42), (0.0, 0.0), (-89.0, 179.0)] {
            let assessment = model.assess(&flat_features(lat, lon));
            for hazard in assessment.predictions.values() {
                assert!((0.0..=1.0).contains(&hazard.risk_score));
            }
            assert!((0.0..=1.0).contains(&assessment.confidence));
        }
    }

    #[test]
    fn test_same_seed_same_assessment() {
        let features = flat_features(40.0, -74.0);

        let a = PlaceholderModel::seeded(42).assess(&features);
        let b = PlaceholderModel::seeded(42).assess(&features);

        assert_eq!(
            serde_json::to_value(&a.predictions).unwrap(),
            serde_json::to_value(&b.predictions).unwrap()
        );
        assert_eq!(a.risk_level, b.risk_level);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn test_assessment_covers_all_hazards() {
        let model = PlaceholderModel::seeded(1);
        let assessment = model.assess(&flat_features(10.0, 10.0));
        assert_eq!(assessment.predictions.len(), DisasterType::ALL.len());
        for ty in DisasterType::ALL {
            assert!(assessment.predictions.contains_key(&ty));
        }
        assert_eq!(assessment.features_extracted, FeatureVector::DIMENSIONS);
    }

    #[test]
    fn test_extract_ranges() {
        let mut rng = StdRng::seed_from_u64(3);
        let f = FeatureVector::extract(12.0, 34.0, &mut rng);
        assert_eq!(f.lat, 12.0);
        assert_eq!(f.lon, 34.0);
        assert!((0.0..1.0).contains(&f.vegetation_index));
        assert!((0.0..100.0).contains(&f.elevation));
        assert!((0.0..200.0).contains(&f.precipitation));
    }
}
