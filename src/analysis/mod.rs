//! Filtering and aggregation.
//!
//! [`recompute`] is the single entry point the host calls whenever a
//! selection changes: it runs the cascading filters, aggregates the working
//! dataset and joins the district counts onto the regions.

pub mod aggregator;
pub mod filter;

pub use aggregator::*;
pub use filter::{run_pipeline, StageChoices};

use crate::models::{AggregateResult, Dataset, FilterState, MapJoin};
use tracing::debug;

/// Everything derived from one filter state.
#[derive(Debug, Clone)]
pub struct Recomputation {
    /// Selector choices per stage, in cascade order.
    pub stages: Vec<StageChoices>,
    pub aggregates: AggregateResult,
    pub map: MapJoin,
}

/// Recompute every derived value from scratch.
pub fn recompute(state: &FilterState, dataset: &Dataset) -> Recomputation {
    let outcome = run_pipeline(&dataset.institutions, state);
    debug!(
        "Working dataset has {} of {} rows",
        outcome.working.len(),
        dataset.institutions.len()
    );

    let aggregates = aggregate(&outcome.working);
    let map = join_regions(&dataset.regions, &aggregates.by_district);

    Recomputation {
        stages: outcome.stages,
        aggregates,
        map,
    }
}
