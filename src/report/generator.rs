//! Report rendering.
//!
//! This module renders a [`Report`] as Markdown or JSON, and writes the
//! joined regions as a GeoJSON FeatureCollection for choropleth tools.

use super::presenter::{CountTable, DashboardView, DonutView, SelectorView};
use crate::models::{MapJoin, Report, ReportMetadata};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;

/// Width of the text progress bars, in characters.
const BAR_WIDTH: usize = 20;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, include_choices: bool) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# College Info Dashboard\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_filters_section(&report.view.selectors, include_choices));
    output.push_str(&generate_kpi_section(&report.view));
    output.push_str(&generate_map_section(&report.view));
    output.push_str(&generate_universities_section(&report.view));
    output.push_str(&generate_area_section(&report.view));
    output.push_str(&generate_count_section(
        "Number of Colleges by Type",
        &report.view.college_types,
    ));
    output.push_str(&generate_count_section(
        "Women's Exclusivity",
        &report.view.exclusivity,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Source:** {}\n", metadata.data_source));
    if let Some(ref boundaries) = metadata.boundary_source {
        section.push_str(&format!("- **Boundaries:** {}\n", boundaries));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Institutions Loaded:** {}\n",
        metadata.institutions_loaded
    ));
    section.push_str(&format!("- **Regions Loaded:** {}\n", metadata.regions_loaded));
    section.push_str(&format!(
        "- **Institutions After Filters:** {}\n",
        metadata.working_rows
    ));
    section.push_str(&format!("- **Duration:** {:.2}s\n", metadata.duration_seconds));
    section.push('\n');

    section
}

/// Generate the filters section.
fn generate_filters_section(selectors: &[SelectorView], include_choices: bool) -> String {
    let mut section = String::new();

    section.push_str("## Filters\n\n");
    if include_choices {
        section.push_str("| Filter | Selected | Options |\n");
        section.push_str("|:---|:---|:---|\n");
    } else {
        section.push_str("| Filter | Selected |\n");
        section.push_str("|:---|:---|\n");
    }

    for selector in selectors {
        let selected = if selector.valid {
            selector.selected.to_string()
        } else {
            format!("{} (no longer available)", selector.selected)
        };

        if include_choices {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                selector.dimension,
                selected,
                selector.options.join(", ")
            ));
        } else {
            section.push_str(&format!("| {} | {} |\n", selector.dimension, selected));
        }
    }
    section.push('\n');

    section
}

/// Generate the KPI section.
fn generate_kpi_section(view: &DashboardView) -> String {
    let mut section = String::new();

    section.push_str("## KPIs\n\n");
    let labels: Vec<_> = view.kpis.iter().map(|k| k.label).collect();
    let values: Vec<_> = view.kpis.iter().map(|k| k.value.to_string()).collect();
    section.push_str(&format!("| {} |\n", labels.join(" | ")));
    section.push_str(&format!("|{}\n", ":---:|".repeat(labels.len())));
    section.push_str(&format!("| {} |\n\n", values.join(" | ")));

    section
}

/// Generate the choropleth section.
fn generate_map_section(view: &DashboardView) -> String {
    let map = &view.map;
    let mut section = String::new();

    section.push_str("## Choropleth Map\n\n");

    if map.features.is_empty() {
        section.push_str("No boundary regions were loaded.\n\n");
    } else {
        section.push_str(&format!(
            "*Color: {} ({} scale, {} to {})*\n\n",
            map.color_field, map.color_scale, map.color_domain[0], map.color_domain[1]
        ));
        section.push_str("| District | Colleges | Universities | |\n");
        section.push_str("|:---|:---:|:---:|:---|\n");

        for feature in &map.features {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                feature.district,
                feature.colleges,
                feature.universities,
                progress_bar(feature.colleges, map.color_domain[1])
            ));
        }
        section.push('\n');
    }

    if !map.unmatched_districts.is_empty() {
        section.push_str(&format!(
            "> Districts without a boundary: {}\n\n",
            map.unmatched_districts.join(", ")
        ));
    }

    section
}

/// Generate the university ranking section.
fn generate_universities_section(view: &DashboardView) -> String {
    let table = &view.universities;
    let mut section = String::new();

    section.push_str("## Universities by Number of Colleges\n\n");

    if table.rows.is_empty() {
        section.push_str("No universities match the current filters.\n\n");
        return section;
    }

    section.push_str(&format!("| {} | {} | |\n", table.columns[0], table.columns[1]));
    section.push_str("|:---|:---:|:---|\n");
    for row in &table.rows {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            row.value,
            row.count,
            progress_bar(row.count, table.max)
        ));
    }
    if view.universities_hidden > 0 {
        section.push_str(&format!(
            "\n*{} more universities not shown.*\n",
            view.universities_hidden
        ));
    }
    section.push('\n');

    section
}

/// Generate the urban/rural section.
fn generate_area_section(view: &DashboardView) -> String {
    let mut section = String::new();

    section.push_str("## Urban vs Rural Distribution\n\n");

    if !view.has_area_split() {
        section.push_str("No urban or rural colleges match the current filters.\n\n");
    } else {
        section.push_str(&generate_donut_line(&view.urban));
        section.push_str(&generate_donut_line(&view.rural));
        section.push('\n');
    }

    if !view.area_types.rows.is_empty() {
        section.push_str(&generate_count_table(&view.area_types));
    }

    section
}

fn generate_donut_line(donut: &DonutView) -> String {
    format!(
        "- **{}:** {:.1}% ({} colleges) {}\n",
        donut.label,
        donut.percent,
        donut.count,
        progress_bar((donut.percent * 10.0).round() as usize, 1000)
    )
}

/// Generate a titled section for a count table.
fn generate_count_section(title: &str, table: &CountTable) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));
    if table.rows.is_empty() {
        section.push_str("No colleges match the current filters.\n\n");
    } else {
        section.push_str(&generate_count_table(table));
    }

    section
}

fn generate_count_table(table: &CountTable) -> String {
    let mut block = String::new();

    block.push_str(&format!("| {} | {} | |\n", table.columns[0], table.columns[1]));
    block.push_str("|:---|:---:|:---|\n");
    for row in &table.rows {
        block.push_str(&format!(
            "| {} | {} | {} |\n",
            row.value,
            row.count,
            progress_bar(row.count, table.max)
        ));
    }
    block.push('\n');

    block
}

/// A fixed-width text bar for `value` out of `max`.
fn progress_bar(value: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = (value.min(max) * BAR_WIDTH + max / 2) / max;
    "█".repeat(filled)
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by college-dashboard v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Build the choropleth FeatureCollection.
///
/// Each feature keeps its original properties and geometry, with the
/// normalized `DISTRICT` name and the `Colleges` and `Universities` counts
/// set on top.
pub fn choropleth_geojson(map: &MapJoin) -> Value {
    let features: Vec<Value> = map
        .regions
        .iter()
        .map(|joined| {
            let mut properties = joined.region.properties.clone();
            properties.insert("DISTRICT".to_string(), json!(joined.region.name));
            properties.insert("Colleges".to_string(), json!(joined.colleges));
            properties.insert("Universities".to_string(), json!(joined.universities));

            json!({
                "type": "Feature",
                "geometry": joined.region.geometry,
                "properties": properties,
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Write the choropleth FeatureCollection to a file.
pub fn write_choropleth_geojson(map: &MapJoin, path: &Path) -> Result<()> {
    let content = serde_json::to_vec(&choropleth_geojson(map))
        .context("Failed to serialize choropleth GeoJSON")?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(&content)?;

    Ok(())
}
