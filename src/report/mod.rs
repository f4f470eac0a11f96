//! Presentation and rendering of dashboard results.

pub mod generator;
pub mod presenter;

pub use generator::{generate_json_report, generate_markdown_report, write_choropleth_geojson};
pub use presenter::{present, DashboardView, PresentOptions};
