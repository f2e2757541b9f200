//! Report assembly: radius filter, distance annotation, metadata

use chrono::{DateTime, Utc};
use geojson::{Feature, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::haversine_km;
use crate::store::ZoneStore;
use crate::{DisasterType, Result};

/// A bounded feature collection with report metadata.
///
/// Serializes as a GeoJSON FeatureCollection carrying a `metadata`
/// foreign member, so geographic consumers can read it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "type")]
    pub collection_type: String,
    pub metadata: ReportMetadata,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub report_type: DisasterType,
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_km: f64,
    pub generated_at: DateTime<Utc>,
    pub total_features: usize,
}

/// Builds reports against a zone store
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    store: ZoneStore,
}

impl ReportGenerator {
    pub fn new(store: ZoneStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    /// Generate a report of all Point features within `radius_km` of the
    /// center, inclusive of the boundary.
    ///
    /// Non-Point features are skipped silently. Relative order among
    /// retained features matches the backing file. Each retained feature
    /// gains a `distance_km` property rounded to two decimals. Store
    /// failures propagate unchanged; no partial report is built.
    pub fn generate(
        &self,
        disaster_type: DisasterType,
        center_lat: f64,
        center_lon: f64,
        radius_km: f64,
    ) -> Result<Report> {
        let collection = self.store.load(disaster_type)?.into_collection();
        let source_count = collection.features.len();

        let mut retained = Vec::new();
        for mut feature in collection.features {
            let Some((feature_lon, feature_lat)) = point_coordinates(&feature) else {
                continue;
            };

            let distance = haversine_km(center_lat, center_lon, feature_lat, feature_lon);
            if distance <= radius_km {
                feature.set_property("distance_km", round2(distance));
                retained.push(feature);
            }
        }

        debug!(
            "Report for {}: {} of {} features within {} km of ({}, {})",
            disaster_type,
            retained.len(),
            source_count,
            radius_km,
            center_lat,
            center_lon
        );

        Ok(Report {
            collection_type: "FeatureCollection".to_string(),
            metadata: ReportMetadata {
                report_type: disaster_type,
                center_lat,
                center_lon,
                radius_km,
                generated_at: Utc::now(),
                total_features: retained.len(),
            },
            features: retained,
        })
    }
}

/// (lon, lat) of a Point feature, or None for any other geometry
fn point_coordinates(feature: &Feature) -> Option<(f64, f64)> {
    match &feature.geometry {
        Some(geometry) => match &geometry.value {
            Value::Point(coords) if coords.len() >= 2 => Some((coords[0], coords[1])),
            _ => None,
        },
        None => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn store_with(name: &str, content: &str) -> (TempDir, ZoneStore) {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let store = ZoneStore::new(dir.path());
        (dir, store)
    }

    const FLOOD_TWO_POINTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [10.0, 10.0]}, "properties": {"name": "near"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [50.0, 50.0]}, "properties": {"name": "far"}}
        ]
    }"#;

    #[test]
    fn test_exact_center_match_with_small_radius() {
        let (_dir, store) = store_with("flood_zones.geojson", FLOOD_TWO_POINTS);
        let generator = ReportGenerator::new(store);

        let report = generator
            .generate(DisasterType::Flood, 10.0, 10.0, 5.0)
            .unwrap();

        assert_eq!(report.metadata.total_features, 1);
        assert_eq!(report.features.len(), 1);
        let distance = report.features[0].property("distance_km").unwrap();
        assert_eq!(distance.as_f64().unwrap(), 0.00);
    }

    #[test]
    fn test_missing_file_yields_empty_report() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(ZoneStore::new(dir.path()));

        let report = generator
            .generate(DisasterType::Drought, 0.0, 0.0, 10.0)
            .unwrap();

        assert!(report.features.is_empty());
        assert_eq!(report.metadata.total_features, 0);
    }

    #[test]
    fn test_non_point_features_never_retained() {
        let (_dir, store) = store_with(
            "flood_zones.geojson",
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}, "properties": {"name": "area"}},
                    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}, "properties": {"name": "point"}}
                ]
            }"#,
        );
        let generator = ReportGenerator::new(store);

        let report = generator
            .generate(DisasterType::Flood, 0.0, 0.0, 1.0e9)
            .unwrap();

        assert_eq!(report.features.len(), 1);
        assert_eq!(
            report.features[0].property("name").unwrap().as_str(),
            Some("point")
        );
    }

    #[test]
    fn test_huge_radius_retains_points_in_source_order() {
        let (_dir, store) = store_with("flood_zones.geojson", FLOOD_TWO_POINTS);
        let generator = ReportGenerator::new(store);

        let report = generator
            .generate(DisasterType::Flood, 0.0, 0.0, 1.0e9)
            .unwrap();

        let names: Vec<_> = report
            .features
            .iter()
            .map(|f| f.property("name").unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["near", "far"]);
    }

    #[test]
    fn test_every_retained_distance_within_radius() {
        let (_dir, store) = store_with("flood_zones.geojson", FLOOD_TWO_POINTS);
        let generator = ReportGenerator::new(store);
        let radius = 6000.0;

        let report = generator
            .generate(DisasterType::Flood, 10.0, 10.0, radius)
            .unwrap();

        assert!(!report.features.is_empty());
        for feature in &report.features {
            let d = feature.property("distance_km").unwrap().as_f64().unwrap();
            assert!(d <= radius);
        }
    }

    #[test]
    fn test_radius_zero_retains_only_center() {
        let (_dir, store) = store_with("flood_zones.geojson", FLOOD_TWO_POINTS);
        let generator = ReportGenerator::new(store);

        let report = generator
            .generate(DisasterType::Flood, 10.0, 10.0, 0.0)
            .unwrap();

        assert_eq!(report.features.len(), 1);
        assert_eq!(
            report.features[0].property("name").unwrap().as_str(),
            Some("near")
        );
    }

    #[test]
    fn test_idempotent_modulo_timestamp() {
        let (_dir, store) = store_with("flood_zones.geojson", FLOOD_TWO_POINTS);
        let generator = ReportGenerator::new(store);

        let first = generator
            .generate(DisasterType::Flood, 10.0, 10.0, 100.0)
            .unwrap();
        let second = generator
            .generate(DisasterType::Flood, 10.0, 10.0, 100.0)
            .unwrap();

        assert_eq!(first.metadata.total_features, second.metadata.total_features);
        assert_eq!(first.metadata.radius_km, second.metadata.radius_km);
        assert_eq!(
            serde_json::to_value(&first.features).unwrap(),
            serde_json::to_value(&second.features).unwrap()
        );
    }

    #[test]
    fn test_distance_rounded_to_two_decimals() {
        let (_dir, store) = store_with(
            "flood_zones.geojson",
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0.1, 0.1]}, "properties": {}}
                ]
            }"#,
        );
        let generator = ReportGenerator::new(store);

        let report = generator
            .generate(DisasterType::Flood, 0.0, 0.0, 100.0)
            .unwrap();

        let d = report.features[0]
            .property("distance_km")
            .unwrap()
            .as_f64()
            .unwrap();
        assert_eq!(d, (d * 100.0).round() / 100.0);
    }

    #[test]
    fn test_store_failure_propagates() {
        let (_dir, store) = store_with("flood_zones.geojson", "not json at all");
        let generator = ReportGenerator::new(store);

        let err = generator
            .generate(DisasterType::Flood, 0.0, 0.0, 10.0)
            .unwrap_err();
        assert!(matches!(err, crate::ReportError::Parse { .. }));
    }
}
