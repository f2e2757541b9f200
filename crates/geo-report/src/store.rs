//! Zone data loading from GeoJSON files
//!
//! One `{type}_zones.geojson` file per disaster type in a known
//! directory. An absent file is the empty case, not an error; a present
//! but malformed file is a parse failure that propagates to the caller.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, GeoJson};
use tracing::{debug, info};

use crate::{DisasterType, ReportError, Result};

/// Outcome of a zone lookup, separating "no data" from failures
#[derive(Debug, Clone)]
pub enum ZoneData {
    /// Backing file present and valid
    Loaded(FeatureCollection),
    /// Backing file absent; resolves to the empty collection
    Missing,
}

impl ZoneData {
    pub fn into_collection(self) -> FeatureCollection {
        match self {
            ZoneData::Loaded(collection) => collection,
            ZoneData::Missing => empty_collection(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ZoneData::Missing)
    }
}

/// The canonical empty FeatureCollection
pub fn empty_collection() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: vec![],
        foreign_members: None,
    }
}

/// Read-only store of disaster zone collections
#[derive(Debug, Clone)]
pub struct ZoneStore {
    data_dir: PathBuf,
}

impl ZoneStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load the zone collection for a disaster type.
    ///
    /// Feature order is preserved as read from the file. Every call
    /// re-reads the backing file; nothing is cached or mutated.
    pub fn load(&self, disaster_type: DisasterType) -> Result<ZoneData> {
        let path = self.data_dir.join(disaster_type.zone_file());

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No zone file at {:?}, treating as empty", path);
                return Ok(ZoneData::Missing);
            }
            Err(err) => return Err(ReportError::Io(err)),
        };

        let geojson: GeoJson = content.parse().map_err(|source| ReportError::Parse {
            path: path.clone(),
            source,
        })?;
        let collection =
            FeatureCollection::try_from(geojson).map_err(|source| ReportError::Parse {
                path: path.clone(),
                source,
            })?;

        info!(
            "Loaded {} features for {} from {:?}",
            collection.features.len(),
            disaster_type,
            path
        );

        Ok(ZoneData::Loaded(collection))
    }

    /// Load a collection, resolving the missing case to empty
    pub fn load_or_empty(&self, disaster_type: DisasterType) -> Result<FeatureCollection> {
        Ok(self.load(disaster_type)?.into_collection())
    }

    /// Feature count for a disaster type (0 when the file is absent)
    pub fn feature_count(&self, disaster_type: DisasterType) -> Result<usize> {
        Ok(self.load_or_empty(disaster_type)?.features.len())
    }
}
