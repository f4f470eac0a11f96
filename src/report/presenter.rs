//! Shaping aggregates for the visualization layer.
//!
//! Nothing here computes new values. Each view renames, orders or bounds
//! what the aggregator produced so a chart or table can be drawn from it
//! directly.

use crate::analysis::{Recomputation, StageChoices};
use crate::models::{Dimension, Selection, ValueCount, ALL};
use serde::Serialize;

const URBAN_COLORS: [&str; 2] = ["#00cc96", "#333333"];
const RURAL_COLORS: [&str; 2] = ["#EF553B", "#333333"];

/// A single KPI tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: usize,
}

/// One selector with its options, "ALL" first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorView {
    pub label: &'static str,
    pub dimension: Dimension,
    pub options: Vec<String>,
    pub selected: Selection,
    /// False when the selection is not among the options.
    pub valid: bool,
}

impl From<&StageChoices> for SelectorView {
    fn from(stage: &StageChoices) -> Self {
        let mut options = Vec::with_capacity(stage.choices.len() + 1);
        options.push(ALL.to_string());
        options.extend(stage.choices.iter().cloned());
        Self {
            label: stage.dimension.label(),
            dimension: stage.dimension,
            options,
            selected: stage.selected.clone(),
            valid: stage.selection_is_valid(),
        }
    }
}

/// One district on the choropleth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapFeature {
    #[serde(rename = "DISTRICT")]
    pub district: String,
    #[serde(rename = "Colleges")]
    pub colleges: usize,
    #[serde(rename = "Universities")]
    pub universities: usize,
}

/// Choropleth input: features plus the color scale bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoroplethView {
    pub color_field: &'static str,
    pub color_scale: String,
    /// `[0, max colleges]` over the features.
    pub color_domain: [usize; 2],
    pub hover_name: &'static str,
    pub features: Vec<MapFeature>,
    pub unmatched_districts: Vec<String>,
}

/// A two-column (label, count) table or chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountTable {
    pub columns: [&'static str; 2],
    pub x_title: &'static str,
    pub y_title: &'static str,
    pub rows: Vec<ValueCount>,
    /// Largest count, used as the progress/axis maximum.
    pub max: usize,
}

impl CountTable {
    fn new(
        columns: [&'static str; 2],
        x_title: &'static str,
        y_title: &'static str,
        rows: Vec<ValueCount>,
    ) -> Self {
        let max = rows.iter().map(|r| r.count).max().unwrap_or(0);
        Self {
            columns,
            x_title,
            y_title,
            rows,
            max,
        }
    }
}

/// One slice of a donut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutSlice {
    pub topic: String,
    pub percent: f64,
}

/// A proportion donut: the share and its complement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutView {
    pub label: &'static str,
    pub percent: f64,
    pub count: usize,
    /// `[("", 100 - percent), (label, percent)]`.
    pub slices: [DonutSlice; 2],
    pub colors: [&'static str; 2],
}

impl DonutView {
    fn new(label: &'static str, percent: f64, count: usize, colors: [&'static str; 2]) -> Self {
        let complement = ((100.0 - percent) * 10.0).round() / 10.0;
        Self {
            label,
            percent,
            count,
            slices: [
                DonutSlice {
                    topic: String::new(),
                    percent: complement,
                },
                DonutSlice {
                    topic: label.to_string(),
                    percent,
                },
            ],
            colors,
        }
    }
}

/// Everything the dashboard draws for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub kpis: Vec<KpiCard>,
    pub selectors: Vec<SelectorView>,
    pub map: ChoroplethView,
    pub universities: CountTable,
    /// Universities left out of the table by the display limit.
    pub universities_hidden: usize,
    pub urban: DonutView,
    pub rural: DonutView,
    pub area_types: CountTable,
    pub college_types: CountTable,
    pub exclusivity: CountTable,
}

impl DashboardView {
    /// Whether the urban/rural donuts have anything to show.
    pub fn has_area_split(&self) -> bool {
        self.urban.count + self.rural.count > 0
    }
}

/// Display settings for the views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentOptions {
    /// Maximum university rows; `None` shows every university.
    pub top_universities: Option<usize>,
    pub color_scale: String,
}

impl Default for PresentOptions {
    fn default() -> Self {
        Self {
            top_universities: None,
            color_scale: "Viridis".to_string(),
        }
    }
}

/// Shape one recomputation into dashboard views.
pub fn present(result: &Recomputation, options: &PresentOptions) -> DashboardView {
    let aggregates = &result.aggregates;
    let distinct = &aggregates.distinct;

    let kpis = vec![
        KpiCard {
            label: "COLLEGES",
            value: distinct.colleges,
        },
        KpiCard {
            label: "UNIVERSITIES",
            value: distinct.universities,
        },
        KpiCard {
            label: "TALUKAS",
            value: distinct.talukas,
        },
        KpiCard {
            label: "DISTRICTS",
            value: distinct.districts,
        },
    ];

    let features: Vec<MapFeature> = result
        .map
        .regions
        .iter()
        .map(|r| MapFeature {
            district: r.region.name.clone(),
            colleges: r.colleges,
            universities: r.universities,
        })
        .collect();
    let color_max = features.iter().map(|f| f.colleges).max().unwrap_or(0);

    let map = ChoroplethView {
        color_field: "Colleges",
        color_scale: options.color_scale.clone(),
        color_domain: [0, color_max],
        hover_name: "DISTRICT",
        features,
        unmatched_districts: result.map.unmatched_districts.clone(),
    };

    let mut ranking = aggregates.university_ranking.clone();
    let mut universities_hidden = 0;
    if let Some(limit) = options.top_universities {
        universities_hidden = ranking.len().saturating_sub(limit);
        ranking.truncate(limit);
    }
    let mut universities = CountTable::new(
        ["University", "College Count"],
        "University",
        "Colleges",
        ranking,
    );
    // The progress maximum covers the full ranking, not just the shown rows.
    universities.max = aggregates
        .university_ranking
        .first()
        .map(|r| r.count)
        .unwrap_or(0);

    let split = &aggregates.area_split;

    DashboardView {
        kpis,
        selectors: result.stages.iter().map(SelectorView::from).collect(),
        map,
        universities,
        universities_hidden,
        urban: DonutView::new("Urban", split.urban_percent, split.urban, URBAN_COLORS),
        rural: DonutView::new("Rural", split.rural_percent, split.rural, RURAL_COLORS),
        area_types: CountTable::new(
            ["Area Type", "Count"],
            "Area Type",
            "Number of Colleges",
            aggregates.area_types.clone(),
        ),
        college_types: CountTable::new(
            ["College Type", "Count"],
            "College Type",
            "Number of Colleges",
            aggregates.college_types.clone(),
        ),
        exclusivity: CountTable::new(
            ["Exclusivity", "Count"],
            "Exclusivity Type",
            "Number of Colleges",
            aggregates.exclusivity.clone(),
        ),
    }
}
