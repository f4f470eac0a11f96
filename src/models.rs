//! Data models for the college dashboard.
//!
//! This module contains the core data structures shared by the loader,
//! the filter pipeline, the aggregator and the report layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::report::DashboardView;

/// Sentinel selection value meaning "no filter".
pub const ALL: &str = "ALL";

/// Area classification value counted as urban.
pub const URBAN: &str = "Urban";

/// Area classification value counted as rural.
pub const RURAL: &str = "Rural";

/// A categorical dimension the dashboard can be filtered on.
///
/// The declaration order is the cascade order of the filter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    District,
    Taluka,
    University,
    CollegeType,
    AreaType,
    Exclusivity,
}

impl Dimension {
    /// All dimensions in cascade order.
    pub const ALL: [Dimension; 6] = [
        Dimension::District,
        Dimension::Taluka,
        Dimension::University,
        Dimension::CollegeType,
        Dimension::AreaType,
        Dimension::Exclusivity,
    ];

    /// Position of this dimension in the cascade.
    pub fn index(self) -> usize {
        match self {
            Dimension::District => 0,
            Dimension::Taluka => 1,
            Dimension::University => 2,
            Dimension::CollegeType => 3,
            Dimension::AreaType => 4,
            Dimension::Exclusivity => 5,
        }
    }

    /// Source column backing this dimension.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::District => columns::DISTRICT,
            Dimension::Taluka => columns::TALUKA,
            Dimension::University => columns::UNIVERSITY_NAME,
            Dimension::CollegeType => columns::COLLEGE_TYPE,
            Dimension::AreaType => columns::AREA_TYPE,
            Dimension::Exclusivity => columns::EXCLUSIVITY,
        }
    }

    /// Selector label shown next to the choices.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::District => "Select District",
            Dimension::Taluka => "Select Taluka",
            Dimension::University => "Select University",
            Dimension::CollegeType => "Select a Type",
            Dimension::AreaType => "Select an area type",
            Dimension::Exclusivity => "Select exclusive type",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Column names of the tabular source, after header normalization.
pub mod columns {
    pub const DISTRICT: &str = "District";
    pub const TALUKA: &str = "Taluka";
    pub const UNIVERSITY_NAME: &str = "University Name";
    pub const COLLEGE_NAME: &str = "College Name";
    pub const COLLEGE_TYPE: &str = "College Type";
    pub const AREA_TYPE: &str = "College Types";
    pub const EXCLUSIVITY: &str = "Exclusively in Womens Colleges";

    /// Every column the dashboard needs, in source order.
    pub const REQUIRED: [&str; 7] = [
        DISTRICT,
        TALUKA,
        UNIVERSITY_NAME,
        COLLEGE_NAME,
        COLLEGE_TYPE,
        AREA_TYPE,
        EXCLUSIVITY,
    ];
}

/// The choice made for one dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    /// No filter; every row passes.
    #[default]
    All,
    /// Keep only rows whose value equals this one.
    Value(String),
}

impl Selection {
    /// Parse a user-supplied value. Blanks and the exact `ALL` sentinel mean
    /// no filter; anything else is matched verbatim.
    pub fn parse(value: &str) -> Self {
        if value.trim().is_empty() || value.trim() == ALL {
            Selection::All
        } else {
            Selection::Value(value.to_string())
        }
    }

    /// Parse a value for one dimension, putting District values into the
    /// same normalized form as the loaded rows.
    pub fn for_dimension(dimension: Dimension, value: &str) -> Self {
        match (dimension, Self::parse(value)) {
            (Dimension::District, Selection::Value(v)) => {
                Selection::Value(normalize_district(&v))
            }
            (_, selection) => selection,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// The selected value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Selection::All => None,
            Selection::Value(v) => Some(v.as_str()),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Value(v) => f.write_str(v),
        }
    }
}

impl Serialize for Selection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The selection for every dimension, in cascade order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    selections: [Selection; 6],
}

impl FilterState {
    /// A state with no filters applied.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: Dimension) -> &Selection {
        &self.selections[dimension.index()]
    }

    /// Set one dimension, leaving the others untouched.
    pub fn set(&mut self, dimension: Dimension, selection: Selection) {
        self.selections[dimension.index()] = selection;
    }

    /// Builder-style variant of [`FilterState::set`].
    pub fn with(mut self, dimension: Dimension, selection: Selection) -> Self {
        self.set(dimension, selection);
        self
    }

    /// Iterate `(dimension, selection)` pairs in cascade order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &Selection)> {
        Dimension::ALL.iter().map(move |d| (*d, self.get(*d)))
    }

    /// Whether every dimension is "no filter".
    pub fn is_unfiltered(&self) -> bool {
        self.selections.iter().all(Selection::is_all)
    }
}

/// One institution (one row of the tabular source).
///
/// Absent or blank source values are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionRecord {
    /// District, trimmed and upper-cased.
    pub district: Option<String>,
    pub taluka: Option<String>,
    pub university_name: Option<String>,
    pub college_name: Option<String>,
    pub college_type: Option<String>,
    /// Area classification ("Urban", "Rural", ...).
    pub area_type: Option<String>,
    pub exclusivity: Option<String>,
}

impl InstitutionRecord {
    /// Value of the field backing a filter dimension.
    pub fn field(&self, dimension: Dimension) -> Option<&str> {
        let value = match dimension {
            Dimension::District => &self.district,
            Dimension::Taluka => &self.taluka,
            Dimension::University => &self.university_name,
            Dimension::CollegeType => &self.college_type,
            Dimension::AreaType => &self.area_type,
            Dimension::Exclusivity => &self.exclusivity,
        };
        value.as_deref()
    }
}

/// Normalize a district name into its join key.
pub fn normalize_district(name: &str) -> String {
    name.trim().to_uppercase()
}

/// One administrative district polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRegion {
    /// Region name, trimmed and upper-cased.
    pub name: String,
    /// Boundary geometry, passed through untouched.
    pub geometry: serde_json::Value,
    /// Remaining feature properties, passed through untouched.
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// Everything loaded once per session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub institutions: Vec<InstitutionRecord>,
    pub regions: Vec<GeoRegion>,
}

/// A categorical value and the number of rows carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

impl ValueCount {
    pub fn new(value: impl Into<String>, count: usize) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// Distinct counts shown as KPIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinctCounts {
    pub colleges: usize,
    pub universities: usize,
    pub talukas: usize,
    pub districts: usize,
}

/// Per-district group-by row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictCount {
    pub district: String,
    /// Number of rows in the district.
    pub colleges: usize,
    /// Number of distinct universities in the district.
    pub universities: usize,
}

/// Urban/rural split of the working dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaSplit {
    pub urban: usize,
    pub rural: usize,
    pub urban_percent: f64,
    pub rural_percent: f64,
}

impl AreaSplit {
    pub fn total(&self) -> usize {
        self.urban + self.rural
    }
}

/// All summary values computed for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Rows in the working dataset.
    pub total_rows: usize,
    pub distinct: DistinctCounts,
    pub by_district: Vec<DistrictCount>,
    pub university_ranking: Vec<ValueCount>,
    pub area_split: AreaSplit,
    pub area_types: Vec<ValueCount>,
    pub college_types: Vec<ValueCount>,
    pub exclusivity: Vec<ValueCount>,
}

/// A geographic region with its district metrics attached.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRegion {
    pub region: GeoRegion,
    pub colleges: usize,
    pub universities: usize,
}

/// Result of joining per-district counts onto the regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapJoin {
    pub regions: Vec<JoinedRegion>,
    /// Districts present in the data but absent from the regions.
    pub unmatched_districts: Vec<String>,
}

/// Metadata about a generated dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Tabular data source.
    pub data_source: String,
    /// Boundary data source, if one was loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_source: Option<String>,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Institution rows loaded.
    pub institutions_loaded: usize,
    /// Regions loaded after the state restriction.
    pub regions_loaded: usize,
    /// Rows left after filtering.
    pub working_rows: usize,
    /// Selection per dimension, in cascade order.
    pub filters: Vec<(Dimension, Selection)>,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub view: DashboardView,
}
