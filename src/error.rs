//! Errors raised while loading and adapting the data sources.

use thiserror::Error;

/// Loader error type.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing required field '{field}' in {source_name}")]
    MissingField { field: String, source_name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("invalid tabular data: {0}")]
    InvalidTable(String),
}

impl LoadError {
    pub fn missing_field(field: impl Into<String>, source_name: impl Into<String>) -> Self {
        LoadError::MissingField {
            field: field.into(),
            source_name: source_name.into(),
        }
    }
}
