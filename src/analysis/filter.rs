//! Cascading filter pipeline.
//!
//! Filters run in [`Dimension::ALL`] order. Each stage sees only the rows
//! kept by the stages before it, and the choices offered for a stage are the
//! distinct values of that stage's input.

use crate::models::{Dimension, FilterState, InstitutionRecord, Selection};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// The options available for one selector under the current cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageChoices {
    pub dimension: Dimension,
    /// Sorted distinct values of the stage input.
    pub choices: Vec<String>,
    pub selected: Selection,
}

impl StageChoices {
    /// Whether the current selection is one of the offered choices.
    pub fn selection_is_valid(&self) -> bool {
        match self.selected.value() {
            None => true,
            Some(v) => self.choices.iter().any(|c| c == v),
        }
    }
}

/// Output of a full pipeline run.
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    /// Rows surviving every stage, in source order.
    pub working: Vec<&'a InstitutionRecord>,
    /// Choices per stage, in cascade order.
    pub stages: Vec<StageChoices>,
}

/// Sorted distinct non-absent values of one dimension.
pub fn distinct_values(rows: &[&InstitutionRecord], dimension: Dimension) -> Vec<String> {
    rows.iter()
        .filter_map(|r| r.field(dimension))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

/// Apply one stage. "ALL" passes every row through.
pub fn apply_stage<'a>(
    rows: Vec<&'a InstitutionRecord>,
    dimension: Dimension,
    selection: &Selection,
) -> Vec<&'a InstitutionRecord> {
    match selection.value() {
        None => rows,
        Some(wanted) => rows
            .into_iter()
            .filter(|r| r.field(dimension) == Some(wanted))
            .collect(),
    }
}

/// Apply every stage and return the working dataset.
#[cfg(test)]
pub fn apply_filters<'a>(
    records: &'a [InstitutionRecord],
    state: &FilterState,
) -> Vec<&'a InstitutionRecord> {
    state
        .iter()
        .fold(records.iter().collect::<Vec<_>>(), |rows, (dimension, selection)| {
            apply_stage(rows, dimension, selection)
        })
}

/// Apply every stage, recording the choices each stage offers.
pub fn run_pipeline<'a>(records: &'a [InstitutionRecord], state: &FilterState) -> FilterOutcome<'a> {
    let mut rows: Vec<&InstitutionRecord> = records.iter().collect();
    let mut stages = Vec::with_capacity(Dimension::ALL.len());

    for (dimension, selection) in state.iter() {
        stages.push(StageChoices {
            dimension,
            choices: distinct_values(&rows, dimension),
            selected: selection.clone(),
        });
        rows = apply_stage(rows, dimension, selection);
        debug!("{} = {} leaves {} rows", dimension, selection, rows.len());
    }

    FilterOutcome {
        working: rows,
        stages,
    }
}

impl FilterState {
    /// Reset every selection that is not offered under the current cascade.
    ///
    /// Stages are checked in order, so resetting an early stage can widen the
    /// choices of later ones. Returns the dimensions that were reset together
    /// with the value they held.
    pub fn reconcile(&mut self, records: &[InstitutionRecord]) -> Vec<(Dimension, String)> {
        let mut rows: Vec<&InstitutionRecord> = records.iter().collect();
        let mut reset = Vec::new();

        for dimension in Dimension::ALL {
            let unavailable = match self.get(dimension).value() {
                Some(value) if !rows.iter().any(|r| r.field(dimension) == Some(value)) => {
                    Some(value.to_string())
                }
                _ => None,
            };
            if let Some(value) = unavailable {
                warn!(
                    "{} '{}' is not available under the current filters; resetting to ALL",
                    dimension, value
                );
                self.set(dimension, Selection::All);
                reset.push((dimension, value));
            }
            rows = apply_stage(rows, dimension, self.get(dimension));
        }

        reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(district: &str, taluka: &str, university: &str, area: &str) -> InstitutionRecord {
        InstitutionRecord {
            district: Some(district.to_string()),
            taluka: Some(taluka.to_string()),
            university_name: Some(university.to_string()),
            college_name: Some(format!("{} {} College", taluka, area)),
            college_type: Some("Arts".to_string()),
            area_type: Some(area.to_string()),
            exclusivity: Some("No".to_string()),
        }
    }

    fn sample() -> Vec<InstitutionRecord> {
        vec![
            record("PUNE", "Haveli", "SPPU", "Urban"),
            record("PUNE", "Junnar", "SPPU", "Urban"),
            record("PUNE", "Baramati", "Bharati", "Rural"),
            record("NASHIK", "Niphad", "YCMOU", "Rural"),
            record("NASHIK", "Sinnar", "YCMOU", "Rural"),
        ]
    }

    #[test]
    fn test_unfiltered_is_identity() {
        let records = sample();
        let working = apply_filters(&records, &FilterState::new());

        assert_eq!(working.len(), records.len());
        for (a, b) in working.iter().zip(records.iter()) {
            assert!(std::ptr::eq(*a, b));
        }
    }

    #[test]
    fn test_filters_are_deterministic() {
        let records = sample();
        let state = FilterState::new()
            .with(Dimension::District, Selection::parse("PUNE"))
            .with(Dimension::AreaType, Selection::parse("Urban"));

        let first: Vec<_> = apply_filters(&records, &state).into_iter().cloned().collect();
        let second: Vec<_> = apply_filters(&records, &state).into_iter().cloned().collect();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn test_choices_cascade_from_previous_stage() {
        let records = sample();
        let state = FilterState::new().with(Dimension::District, Selection::parse("PUNE"));

        let outcome = run_pipeline(&records, &state);
        let district = &outcome.stages[Dimension::District.index()];
        let taluka = &outcome.stages[Dimension::Taluka.index()];

        assert_eq!(district.choices, vec!["NASHIK", "PUNE"]);
        assert_eq!(taluka.choices, vec!["Baramati", "Haveli", "Junnar"]);
        assert!(!taluka.choices.contains(&"Niphad".to_string()));
    }

    #[test]
    fn test_choices_skip_absent_values() {
        let mut records = sample();
        records[0].taluka = None;

        let outcome = run_pipeline(&records, &FilterState::new());
        let taluka = &outcome.stages[Dimension::Taluka.index()];
        assert!(!taluka.choices.iter().any(|c| c.is_empty()));
        assert_eq!(taluka.choices.len(), 4);
    }

    #[test]
    fn test_unreachable_selection_yields_empty() {
        let records = sample();
        let state = FilterState::new()
            .with(Dimension::District, Selection::parse("PUNE"))
            .with(Dimension::University, Selection::parse("YCMOU"));

        let outcome = run_pipeline(&records, &state);
        assert!(outcome.working.is_empty());
        assert!(!outcome.stages[Dimension::University.index()].selection_is_valid());
        // Later stages see no rows, so offer nothing.
        assert!(outcome.stages[Dimension::Exclusivity.index()].choices.is_empty());
    }

    #[test]
    fn test_filter_is_case_sensitive() {
        let records = sample();
        let state = FilterState::new().with(Dimension::AreaType, Selection::parse("urban"));
        assert!(apply_filters(&records, &state).is_empty());
    }

    #[test]
    fn test_offered_choices_are_selectable() {
        let mut records = sample();
        records[0].area_type = Some("Urban ".to_string());
        records[3].exclusivity = Some("All".to_string());

        let outcome = run_pipeline(&records, &FilterState::new());
        let areas = &outcome.stages[Dimension::AreaType.index()].choices;
        let exclusive = &outcome.stages[Dimension::Exclusivity.index()].choices;
        assert!(areas.contains(&"Urban ".to_string()));
        assert!(exclusive.contains(&"All".to_string()));

        let state = FilterState::new().with(Dimension::AreaType, Selection::parse("Urban "));
        assert_eq!(apply_filters(&records, &state).len(), 1);

        let state = FilterState::new().with(Dimension::Exclusivity, Selection::parse("All"));
        assert_eq!(apply_filters(&records, &state).len(), 1);
    }

    #[test]
    fn test_absent_values_never_match() {
        let mut records = sample();
        records[0].taluka = None;
        let state = FilterState::new().with(Dimension::Taluka, Selection::parse("Haveli"));
        assert!(apply_filters(&records, &state).is_empty());
    }

    #[test]
    fn test_reconcile_resets_unreachable_selection() {
        let records = sample();
        let mut state = FilterState::new()
            .with(Dimension::District, Selection::parse("PUNE"))
            .with(Dimension::University, Selection::parse("YCMOU"))
            .with(Dimension::AreaType, Selection::parse("Rural"));

        let reset = state.reconcile(&records);

        assert_eq!(reset, vec![(Dimension::University, "YCMOU".to_string())]);
        assert!(state.get(Dimension::University).is_all());
        assert_eq!(state.get(Dimension::AreaType).value(), Some("Rural"));
        assert_eq!(apply_filters(&records, &state).len(), 1);
    }

    #[test]
    fn test_reconcile_keeps_valid_state() {
        let records = sample();
        let mut state = FilterState::new()
            .with(Dimension::District, Selection::parse("NASHIK"))
            .with(Dimension::Taluka, Selection::parse("Sinnar"));
        let before = state.clone();

        assert!(state.reconcile(&records).is_empty());
        assert_eq!(state, before);
    }
}
