//! Data loading for institution rows and district boundaries.
//!
//! Both sources are read once per session. Tabular sources are parsed into
//! a [`schema::RawTable`] first and then adapted into typed records, so the
//! rest of the program only ever sees a clean, validated schema.

pub mod geo;
pub mod schema;

pub use geo::GeoFilter;
pub use schema::RawTable;

use geo::load_regions;

use crate::error::LoadError;
use crate::models::{Dataset, InstitutionRecord};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Tabular source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// A JSON array of objects, one per row.
    Json,
}

impl TableFormat {
    /// Guess the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => TableFormat::Json,
            _ => TableFormat::Csv,
        }
    }
}

/// Where to find the data and how to restrict the boundaries.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Institution rows (CSV or JSON).
    pub institutions: PathBuf,
    /// District boundaries (GeoJSON). Optional; without it the map is empty.
    pub boundaries: Option<PathBuf>,
    pub geo: GeoFilter,
}

impl From<&crate::config::DataConfig> for LoadConfig {
    fn from(config: &crate::config::DataConfig) -> Self {
        Self {
            institutions: PathBuf::from(&config.institutions),
            boundaries: config.boundaries.as_ref().map(PathBuf::from),
            geo: GeoFilter {
                name_field: config.district_field.clone(),
                state_field: config.state_field.clone(),
                state: config
                    .state
                    .clone()
                    .filter(|s| !s.trim().is_empty() && !s.trim().eq_ignore_ascii_case("any")),
            },
        }
    }
}

/// Read CSV rows into a raw table.
pub fn read_csv_table<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(String::from)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(schema::clean_cell).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Read a JSON array of row objects into a raw table.
///
/// Column order follows first appearance across rows. Numbers and booleans
/// are stringified; nulls and missing keys are absent values.
pub fn read_json_table<R: Read>(reader: R) -> Result<RawTable, LoadError> {
    let value: Value = serde_json::from_reader(reader)?;
    let objects = value
        .as_array()
        .ok_or_else(|| LoadError::InvalidTable("expected a JSON array of rows".to_string()))?;

    let mut headers: Vec<String> = Vec::new();
    for object in objects {
        let map = object
            .as_object()
            .ok_or_else(|| LoadError::InvalidTable("every row must be a JSON object".to_string()))?;
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|h| match map.get(h) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => schema::clean_cell(s),
                    Some(other) => Some(other.to_string()),
                })
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

/// Read and adapt institution rows from any reader.
pub fn read_institutions<R: Read>(
    reader: R,
    format: TableFormat,
    source_name: &str,
) -> Result<Vec<InstitutionRecord>, LoadError> {
    let table = match format {
        TableFormat::Csv => read_csv_table(reader)?,
        TableFormat::Json => read_json_table(reader)?,
    };
    debug!(
        "Read {} columns and {} rows from {}",
        table.headers.len(),
        table.rows.len(),
        source_name
    );
    schema::adapt(&table, source_name)
}

/// Load institution rows from a file.
pub fn load_institutions(path: &Path) -> Result<Vec<InstitutionRecord>, LoadError> {
    let file = File::open(path)?;
    let format = TableFormat::from_path(path);
    read_institutions(
        BufReader::new(file),
        format,
        &path.display().to_string(),
    )
}

/// Load every source named by the configuration.
pub fn load_dataset(config: &LoadConfig) -> Result<Dataset, LoadError> {
    info!("Loading institutions from {}", config.institutions.display());
    let institutions = load_institutions(&config.institutions)?;

    let regions = match config.boundaries {
        Some(ref path) => {
            info!("Loading boundaries from {}", path.display());
            load_regions(path, &config.geo)?
        }
        None => {
            warn!("No boundary file configured; the choropleth will be empty");
            Vec::new()
        }
    };

    info!(
        "Loaded {} institutions and {} regions",
        institutions.len(),
        regions.len()
    );

    Ok(Dataset {
        institutions,
        regions,
    })
}
