//! Schema adaptation for loosely-typed tabular rows.
//!
//! Raw sources (CSV files, spreadsheet exports) arrive as header names plus
//! string cells. This module cleans the header names, checks that every
//! required column is present and turns each row into an
//! [`InstitutionRecord`].

use crate::error::LoadError;
use crate::models::{columns, normalize_district, InstitutionRecord};
use std::collections::HashMap;
use tracing::debug;

/// A table of optional string cells with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Clean a header name: drop non-ASCII characters (NBSP, BOM, ...) and trim.
pub fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Turn a cell into a value, treating blanks as absent.
pub fn clean_cell(cell: &str) -> Option<String> {
    if cell.trim().is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Column positions of the required fields.
struct ColumnIndex {
    district: usize,
    taluka: usize,
    university_name: usize,
    college_name: usize,
    college_type: usize,
    area_type: usize,
    exclusivity: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String], source_name: &str) -> Result<Self, LoadError> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            // First occurrence wins on duplicate headers.
            positions.entry(normalize_header(header)).or_insert(i);
        }

        let mut found = [0usize; 7];
        for (slot, field) in found.iter_mut().zip(columns::REQUIRED) {
            *slot = positions
                .get(field)
                .copied()
                .ok_or_else(|| LoadError::missing_field(field, source_name))?;
        }

        let [district, taluka, university_name, college_name, college_type, area_type, exclusivity] =
            found;
        Ok(Self {
            district,
            taluka,
            university_name,
            college_name,
            college_type,
            area_type,
            exclusivity,
        })
    }
}

/// Adapt a raw table into institution records.
///
/// Fails with [`LoadError::MissingField`] as soon as a required column is
/// missing from the header row.
pub fn adapt(table: &RawTable, source_name: &str) -> Result<Vec<InstitutionRecord>, LoadError> {
    let index = ColumnIndex::resolve(&table.headers, source_name)?;

    let records: Vec<InstitutionRecord> = table
        .rows
        .iter()
        .map(|row| {
            let cell = |i: usize| row.get(i).cloned().flatten();
            InstitutionRecord {
                district: cell(index.district)
                    .map(|d| normalize_district(&d))
                    .filter(|d| !d.is_empty()),
                taluka: cell(index.taluka),
                university_name: cell(index.university_name),
                college_name: cell(index.college_name),
                college_type: cell(index.college_type),
                area_type: cell(index.area_type),
                exclusivity: cell(index.exclusivity),
            }
        })
        .collect();

    debug!("Adapted {} rows from {}", records.len(), source_name);
    Ok(records)
}
