//! Geospatial Report Generator
//!
//! Loads disaster-zone GeoJSON collections, filters Point features by
//! great-circle distance from a query coordinate, and serializes the
//! bounded result as CSV or GeoJSON for download.
//!
//! # Pipeline
//!
//! ```text
//! (type, center, radius, format)
//!     -> ZoneStore::load        raw FeatureCollection (or Missing)
//!     -> ReportGenerator        distance filter + annotation + metadata
//!     -> export                 bytes + content type + filename
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod distance;
pub mod export;
pub mod report;
pub mod store;

pub use distance::haversine_km;
pub use export::{export, ExportPayload, ReportFormat, CSV_SCHEMA_VERSION};
pub use report::{Report, ReportGenerator, ReportMetadata};
pub use store::{ZoneData, ZoneStore};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error reading zone data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid GeoJSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown disaster type: {0}")]
    UnknownType(String),
    #[error("unknown report format: {0}")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Disaster categories with backing zone files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterType {
    Flood,
    Wildfire,
    Drought,
    Earthquake,
}

impl DisasterType {
    pub const ALL: [DisasterType; 4] = [
        DisasterType::Flood,
        DisasterType::Wildfire,
        DisasterType::Drought,
        DisasterType::Earthquake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterType::Flood => "flood",
            DisasterType::Wildfire => "wildfire",
            DisasterType::Drought => "drought",
            DisasterType::Earthquake => "earthquake",
        }
    }

    /// Backing file name under the zone data directory
    pub fn zone_file(&self) -> String {
        format!("{}_zones.geojson", self.as_str())
    }
}

impl fmt::Display for DisasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisasterType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flood" => Ok(DisasterType::Flood),
            "wildfire" => Ok(DisasterType::Wildfire),
            "drought" => Ok(DisasterType::Drought),
            "earthquake" => Ok(DisasterType::Earthquake),
            other => Err(ReportError::UnknownType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disaster_type_round_trip() {
        for ty in DisasterType::ALL {
            assert_eq!(ty.as_str().parse::<DisasterType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_disaster_type_rejects_unknown() {
        assert!("tsunami".parse::<DisasterType>().is_err());
        assert!("Flood".parse::<DisasterType>().is_err());
        assert!("".parse::<DisasterType>().is_err());
    }

    #[test]
    fn test_zone_file_naming() {
        assert_eq!(DisasterType::Flood.zone_file(), "flood_zones.geojson");
        assert_eq!(
            DisasterType::Earthquake.zone_file(),
            "earthquake_zones.geojson"
        );
    }
}
