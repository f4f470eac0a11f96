//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.collegedash.toml` files.

use crate::models::{Dimension, FilterState, Selection};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".collegedash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Initial filter selections.
    #[serde(default)]
    pub filters: FilterConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "dashboard_report.md".to_string()
}

/// Data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Institution rows (CSV, or a JSON array of objects).
    #[serde(default = "default_institutions")]
    pub institutions: String,

    /// District boundaries (GeoJSON FeatureCollection).
    #[serde(default)]
    pub boundaries: Option<String>,

    /// Boundary property holding the district name.
    #[serde(default = "default_district_field")]
    pub district_field: String,

    /// Boundary property holding the state name.
    #[serde(default = "default_state_field")]
    pub state_field: String,

    /// State whose districts are kept. Unset, empty or "ANY" keeps every feature.
    #[serde(default = "default_state")]
    pub state: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            institutions: default_institutions(),
            boundaries: None,
            district_field: default_district_field(),
            state_field: default_state_field(),
            state: default_state(),
        }
    }
}

fn default_institutions() -> String {
    "dashboard_data.csv".to_string()
}

fn default_district_field() -> String {
    "DISTRICT".to_string()
}

fn default_state_field() -> String {
    "ST_NM".to_string()
}

fn default_state() -> Option<String> {
    Some("MAHARASHTRA".to_string())
}

/// Initial selections, "ALL" when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub taluka: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub college_type: Option<String>,
    #[serde(default)]
    pub area_type: Option<String>,
    #[serde(default)]
    pub exclusivity: Option<String>,

    /// Reset selections that are unavailable under earlier filters.
    #[serde(default = "default_true")]
    pub reset_invalid: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            district: None,
            taluka: None,
            university: None,
            college_type: None,
            area_type: None,
            exclusivity: None,
            reset_invalid: true,
        }
    }
}

impl FilterConfig {
    fn slot(&mut self, dimension: Dimension) -> &mut Option<String> {
        match dimension {
            Dimension::District => &mut self.district,
            Dimension::Taluka => &mut self.taluka,
            Dimension::University => &mut self.university,
            Dimension::CollegeType => &mut self.college_type,
            Dimension::AreaType => &mut self.area_type,
            Dimension::Exclusivity => &mut self.exclusivity,
        }
    }

    fn get(&self, dimension: Dimension) -> Option<&String> {
        match dimension {
            Dimension::District => self.district.as_ref(),
            Dimension::Taluka => self.taluka.as_ref(),
            Dimension::University => self.university.as_ref(),
            Dimension::CollegeType => self.college_type.as_ref(),
            Dimension::AreaType => self.area_type.as_ref(),
            Dimension::Exclusivity => self.exclusivity.as_ref(),
        }
    }

    /// Build the filter state from the configured selections.
    pub fn to_state(&self) -> FilterState {
        Dimension::ALL.iter().fold(FilterState::new(), |state, &dimension| {
            match self.get(dimension) {
                Some(value) => state.with(dimension, Selection::for_dimension(dimension, value)),
                None => state,
            }
        })
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum universities in the ranking table (0 shows all).
    #[serde(default = "default_top_universities")]
    pub top_universities: usize,

    /// List the available options of every filter.
    #[serde(default = "default_true")]
    pub include_choices: bool,

    /// Color scale name passed to the choropleth.
    #[serde(default = "default_color_scale")]
    pub color_scale: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_universities: default_top_universities(),
            include_choices: true,
            color_scale: default_color_scale(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_top_universities() -> usize {
    25
}

fn default_color_scale() -> String {
    "Viridis".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.data.institutions = data.display().to_string();
        }
        if let Some(ref boundaries) = args.boundaries {
            self.data.boundaries = Some(boundaries.display().to_string());
        }
        if let Some(ref state) = args.state {
            self.data.state = Some(state.clone());
        }

        for (dimension, value) in args.selections() {
            if let Some(value) = value {
                *self.filters.slot(dimension) = Some(value.to_string());
            }
        }

        if args.keep_invalid {
            self.filters.reset_invalid = false;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(top) = args.top_universities {
            self.report.top_universities = top;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
