//! College Dashboard - regional higher-education summary
//!
//! A CLI tool that loads institution rows and district boundaries,
//! applies cascading filters and renders the dashboard aggregates as
//! a Markdown or JSON report plus an optional choropleth GeoJSON file.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing field, unreadable file, bad config, etc.)
//!   2 - No institution matched the filters and --fail-on-empty was set

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{Dataset, FilterState, Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration decides the default verbosity, so read it first
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("College Dashboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run_dashboard(&args, &config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .collegedash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the data files, default filters and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
///
/// Also returns the path the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        None => Ok((Config::default(), None)),
    }
}

/// Build the starting filter state, resetting unavailable selections if configured.
fn initial_filter_state(config: &Config, dataset: &Dataset) -> FilterState {
    let mut state = config.filters.to_state();

    if config.filters.reset_invalid {
        for (dimension, value) in state.reconcile(&dataset.institutions) {
            println!(
                "   ↩️  {} '{}' is not available under the earlier filters; using ALL",
                dimension, value
            );
        }
    }

    state
}

/// Run the complete dashboard workflow. Returns exit code (0 or 2).
fn run_dashboard(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Load both sources
    let load_config = loader::LoadConfig::from(&config.data);
    println!(
        "📥 Loading institutions: {}",
        load_config.institutions.display()
    );
    let dataset = loader::load_dataset(&load_config).with_context(|| {
        format!(
            "Failed to load data from {}",
            load_config.institutions.display()
        )
    })?;

    // Step 2: Resolve the selections
    let state = initial_filter_state(config, &dataset);
    if state.is_unfiltered() {
        debug!("No filters applied");
    }

    if args.choices {
        return handle_choices(&state, &dataset);
    }

    // Step 3: Filter, aggregate and join
    println!("\n🔬 Computing dashboard...");
    let result = analysis::recompute(&state, &dataset);

    if !result.map.unmatched_districts.is_empty() {
        warn!(
            "Districts without a boundary: {}",
            result.map.unmatched_districts.join(", ")
        );
    }

    // Step 4: Shape and render
    let options = report::PresentOptions {
        top_universities: Some(config.report.top_universities).filter(|&n| n > 0),
        color_scale: config.report.color_scale.clone(),
    };
    let view = report::present(&result, &options);

    let metadata = ReportMetadata {
        data_source: load_config.institutions.display().to_string(),
        boundary_source: load_config
            .boundaries
            .as_ref()
            .map(|p| p.display().to_string()),
        generated_at: Utc::now(),
        institutions_loaded: dataset.institutions.len(),
        regions_loaded: dataset.regions.len(),
        working_rows: result.aggregates.total_rows,
        filters: state.iter().map(|(d, s)| (d, s.clone())).collect(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report { metadata, view };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&report, config.report.include_choices)
        }
    };

    let output_path = output_path(args, config);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if let Some(ref geojson_path) = args.geojson {
        report::write_choropleth_geojson(&result.map, geojson_path)?;
        info!("Choropleth GeoJSON written to {}", geojson_path.display());
    }

    // Print summary
    let distinct = &result.aggregates.distinct;
    let split = &result.aggregates.area_split;
    println!("\n📊 Dashboard Summary:");
    println!(
        "   Institutions: {} of {}",
        result.aggregates.total_rows,
        dataset.institutions.len()
    );
    println!(
        "   Colleges: {} | Universities: {} | Talukas: {} | Districts: {}",
        distinct.colleges, distinct.universities, distinct.talukas, distinct.districts
    );
    println!(
        "   Urban: {:.1}% | Rural: {:.1}% (of {} classified)",
        split.urban_percent,
        split.rural_percent,
        split.total()
    );
    println!(
        "\n✅ Dashboard complete! Report saved to: {}",
        output_path.display()
    );

    if args.fail_on_empty && result.aggregates.total_rows == 0 {
        eprintln!("\n⛔ No institution matches the current filters. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Handle --choices: print every selector's options and exit.
fn handle_choices(state: &FilterState, dataset: &Dataset) -> Result<i32> {
    let outcome = analysis::run_pipeline(&dataset.institutions, state);

    println!("\n🔍 Filter options under the current selections:\n");
    for stage in &outcome.stages {
        let marker = if stage.selection_is_valid() { "" } else { " ⚠️" };
        println!(
            "   {} [{}]{}",
            stage.dimension.label(),
            stage.selected,
            marker
        );
        if stage.choices.is_empty() {
            println!("     (no options)");
        }
        for choice in &stage.choices {
            println!("     - {}", choice);
        }
    }

    println!(
        "\n✅ {} of {} institutions match.",
        outcome.working.len(),
        dataset.institutions.len()
    );
    Ok(0)
}

/// Resolve the report path, switching the default extension for JSON output.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);
    if args.output.is_none() && args.format == OutputFormat::Json {
        path.with_extension("json")
    } else {
        path
    }
}
