//! Report download payloads
//!
//! Two formats: a tabular CSV flattening of the feature list and the
//! full report as an indented GeoJSON document. Both are deterministic
//! for a given report; only the filename timestamp varies.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::Utc;
use geojson::feature::Id;
use geojson::{Feature, Value};
use serde::{Deserialize, Serialize};

use crate::report::Report;
use crate::{ReportError, Result};

/// CSV column layout version. Bump when the core column set changes.
pub const CSV_SCHEMA_VERSION: u32 = 1;

/// Fixed leading columns of schema v1; property columns follow in
/// lexicographic order
const CSV_CORE_COLUMNS: [&str; 4] = ["id", "longitude", "latitude", "distance_km"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    GeoJson,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::GeoJson => "geojson",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv",
            ReportFormat::GeoJson => "application/geo+json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ReportFormat::Csv),
            "geojson" => Ok(ReportFormat::GeoJson),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Rendered download: bytes plus the HTTP attachment metadata
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Serialize a report for download.
///
/// The filename is `{type}_report_{YYYYMMDD_HHMMSS}.{ext}`, stamped at
/// export time to second precision.
pub fn export(report: &Report, format: ReportFormat) -> Result<ExportPayload> {
    let bytes = match format {
        ReportFormat::Csv => to_csv(report).into_bytes(),
        ReportFormat::GeoJson => serde_json::to_string_pretty(report)?.into_bytes(),
    };

    let filename = format!(
        "{}_report_{}.{}",
        report.metadata.report_type,
        Utc::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    );

    Ok(ExportPayload {
        bytes,
        content_type: format.content_type(),
        filename,
    })
}

/// Flatten the feature list into CSV rows under the schema v1 layout.
///
/// Core columns always appear, even for an empty report; property
/// columns are the sorted union of keys across all features, so the
/// header never depends on map iteration order.
fn to_csv(report: &Report) -> String {
    let property_columns: BTreeSet<String> = report
        .features
        .iter()
        .filter_map(|f| f.properties.as_ref())
        .flat_map(|props| props.keys().cloned())
        .filter(|key| !CSV_CORE_COLUMNS.contains(&key.as_str()))
        .collect();

    let mut out = String::new();
    let header: Vec<&str> = CSV_CORE_COLUMNS
        .iter()
        .copied()
        .chain(property_columns.iter().map(String::as_str))
        .collect();
    write_row(&mut out, &header);

    for feature in &report.features {
        let mut row: Vec<String> = Vec::with_capacity(header.len());
        row.push(id_cell(feature));

        let (lon, lat) = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coords)) if coords.len() >= 2 => {
                (coords[0].to_string(), coords[1].to_string())
            }
            _ => (String::new(), String::new()),
        };
        row.push(lon);
        row.push(lat);
        row.push(property_cell(feature, "distance_km"));

        for column in &property_columns {
            row.push(property_cell(feature, column));
        }

        let row_refs: Vec<&str> = row.iter().map(String::as_str).collect();
        write_row(&mut out, &row_refs);
    }

    out
}

fn id_cell(feature: &Feature) -> String {
    match &feature.id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => String::new(),
    }
}

fn property_cell(feature: &Feature, key: &str) -> String {
    match feature.property(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn write_row(out: &mut String, cells: &[&str]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
            let _ = write!(out, "\"{}\"", cell.replace('"', "\"\""));
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}
