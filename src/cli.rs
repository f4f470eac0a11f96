//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Dimension;
use clap::Parser;
use std::path::PathBuf;

/// College Dashboard - regional higher-education summary
///
/// Load institution rows and district boundaries, apply cascading filters
/// and render KPIs, a choropleth table, rankings and distributions as a
/// Markdown or JSON report.
///
/// Examples:
///   college-dashboard --data colleges.csv --boundaries districts.geojson
///   college-dashboard --data colleges.csv --district PUNE --area-type Urban
///   college-dashboard --data colleges.json --format json --output dashboard.json
///   college-dashboard --data colleges.csv --district PUNE --choices
///   college-dashboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Institution rows (CSV, or a JSON array of objects)
    #[arg(short, long, value_name = "FILE", env = "COLLEGEDASH_DATA")]
    pub data: Option<PathBuf>,

    /// District boundaries (GeoJSON FeatureCollection)
    #[arg(short, long, value_name = "FILE", env = "COLLEGEDASH_BOUNDARIES")]
    pub boundaries: Option<PathBuf>,

    /// State whose districts are kept from the boundaries ("any" keeps all)
    #[arg(long, value_name = "NAME")]
    pub state: Option<String>,

    /// Filter by district ("ALL" for no filter)
    #[arg(long, value_name = "NAME")]
    pub district: Option<String>,

    /// Filter by taluka
    #[arg(long, value_name = "NAME")]
    pub taluka: Option<String>,

    /// Filter by university name
    #[arg(long, value_name = "NAME")]
    pub university: Option<String>,

    /// Filter by college type
    #[arg(long, value_name = "TYPE")]
    pub college_type: Option<String>,

    /// Filter by area type (e.g. Urban, Rural)
    #[arg(long, value_name = "TYPE")]
    pub area_type: Option<String>,

    /// Filter by women's exclusivity value
    #[arg(long, value_name = "VALUE")]
    pub exclusivity: Option<String>,

    /// Keep selections that earlier filters made unavailable
    ///
    /// By default such selections are reset to ALL. With this flag they are
    /// applied as given, which yields an empty dashboard.
    #[arg(long)]
    pub keep_invalid: bool,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the joined districts as a choropleth GeoJSON file
    #[arg(long, value_name = "FILE")]
    pub geojson: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Maximum universities in the ranking table (0 shows all)
    #[arg(long, value_name = "NUM")]
    pub top_universities: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .collegedash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the options of every filter under the current selections and exit
    #[arg(long)]
    pub choices: bool,

    /// Exit with code 2 when no institution matches the filters
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Generate a default .collegedash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Filter values given on the command line, in cascade order.
    pub fn selections(&self) -> Vec<(Dimension, Option<&str>)> {
        Dimension::ALL
            .iter()
            .map(|&dimension| {
                let value = match dimension {
                    Dimension::District => &self.district,
                    Dimension::Taluka => &self.taluka,
                    Dimension::University => &self.university,
                    Dimension::CollegeType => &self.college_type,
                    Dimension::AreaType => &self.area_type,
                    Dimension::Exclusivity => &self.exclusivity,
                };
                (dimension, value.as_deref())
            })
            .collect()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref data) = self.data {
            if !data.is_file() {
                return Err(format!("Data file does not exist: {}", data.display()));
            }
        }

        if let Some(ref boundaries) = self.boundaries {
            if !boundaries.is_file() {
                return Err(format!(
                    "Boundary file does not exist: {}",
                    boundaries.display()
                ));
            }
        }

        if self.choices && self.geojson.is_some() {
            return Err("--geojson has no effect together with --choices".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
