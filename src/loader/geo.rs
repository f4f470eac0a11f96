//! District boundary loading from GeoJSON.
//!
//! Geometry is never interpreted here; it is carried through to the
//! choropleth output untouched.

use crate::error::LoadError;
use crate::models::{normalize_district, GeoRegion};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// How to name regions and which state to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoFilter {
    /// Feature property holding the district name.
    pub name_field: String,
    /// Feature property holding the state name.
    pub state_field: String,
    /// State to keep (compared upper-cased). `None` keeps every feature.
    pub state: Option<String>,
}

impl Default for GeoFilter {
    fn default() -> Self {
        Self {
            name_field: "DISTRICT".to_string(),
            state_field: "ST_NM".to_string(),
            state: Some("MAHARASHTRA".to_string()),
        }
    }
}

impl GeoFilter {
    /// Whether a feature's properties belong to the target state.
    fn keeps(&self, properties: &serde_json::Map<String, Value>) -> bool {
        let Some(ref state) = self.state else {
            return true;
        };
        properties
            .get(&self.state_field)
            .and_then(Value::as_str)
            .map(|s| s.to_uppercase() == state.to_uppercase())
            .unwrap_or(false)
    }
}

/// Read regions from a GeoJSON FeatureCollection.
pub fn read_regions<R: Read>(
    reader: R,
    filter: &GeoFilter,
    source_name: &str,
) -> Result<Vec<GeoRegion>, LoadError> {
    let value: Value = serde_json::from_reader(reader)?;

    if value["type"].as_str() != Some("FeatureCollection") {
        return Err(LoadError::InvalidGeoJson(format!(
            "{} is not a FeatureCollection",
            source_name
        )));
    }

    let features = value["features"].as_array().ok_or_else(|| {
        LoadError::InvalidGeoJson(format!("{} has no features array", source_name))
    })?;

    let mut regions = Vec::new();
    let mut dropped = 0usize;

    for feature in features {
        let properties = feature["properties"].as_object().cloned().unwrap_or_default();

        if !filter.keeps(&properties) {
            dropped += 1;
            continue;
        }

        let name = properties
            .get(&filter.name_field)
            .and_then(Value::as_str)
            .ok_or_else(|| LoadError::missing_field(&filter.name_field, source_name))?;

        regions.push(GeoRegion {
            name: normalize_district(name),
            geometry: feature["geometry"].clone(),
            properties,
        });
    }

    debug!(
        "Kept {} regions from {}, dropped {} outside the target state",
        regions.len(),
        source_name,
        dropped
    );
    if regions.is_empty() && !features.is_empty() {
        warn!(
            "No features in {} matched {} = {:?}",
            source_name, filter.state_field, filter.state
        );
    }

    Ok(regions)
}

/// Load regions from a GeoJSON file.
pub fn load_regions(path: &Path, filter: &GeoFilter) -> Result<Vec<GeoRegion>, LoadError> {
    let file = File::open(path)?;
    read_regions(BufReader::new(file), filter, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "properties": {"DISTRICT": " Pune ", "ST_NM": "Maharashtra"},
             "geometry": {"type": "Polygon", "coordinates": [[[73.0, 18.0], [74.0, 18.0], [74.0, 19.0], [73.0, 18.0]]]}},
            {"type": "Feature",
             "properties": {"DISTRICT": "Nashik", "ST_NM": "MAHARASHTRA"},
             "geometry": null},
            {"type": "Feature",
             "properties": {"DISTRICT": "Belgaum", "ST_NM": "Karnataka"},
             "geometry": null}
        ]
    }"#;

    #[test]
    fn test_read_regions_filters_state() {
        let regions = read_regions(COLLECTION.as_bytes(), &GeoFilter::default(), "inline").unwrap();

        let names: Vec<_> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["PUNE", "NASHIK"]);
        assert_eq!(regions[0].geometry["type"], "Polygon");
        assert_eq!(regions[0].properties["ST_NM"], "Maharashtra");
    }

    #[test]
    fn test_read_regions_without_state_filter() {
        let filter = GeoFilter {
            state: None,
            ..GeoFilter::default()
        };
        let regions = read_regions(COLLECTION.as_bytes(), &filter, "inline").unwrap();
        assert_eq!(regions.len(), 3);
    }

    #[test]
    fn test_read_regions_missing_name_field() {
        let filter = GeoFilter {
            name_field: "DIST_NAME".to_string(),
            ..GeoFilter::default()
        };
        let err = read_regions(COLLECTION.as_bytes(), &filter, "inline").unwrap_err();
        assert!(matches!(err, LoadError::MissingField { ref field, .. } if field == "DIST_NAME"));
    }

    #[test]
    fn test_read_regions_rejects_non_collection() {
        let err = read_regions(r#"{"type": "Feature"}"#.as_bytes(), &GeoFilter::default(), "inline")
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidGeoJson(_)));
    }

    #[test]
    fn test_load_regions_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("districts.geojson");
        std::fs::write(&path, COLLECTION).unwrap();

        let regions = load_regions(&path, &GeoFilter::default()).unwrap();
        assert_eq!(regions.len(), 2);
    }
}
