//! Aggregation over the working dataset.
//!
//! Every function here accepts an empty working dataset and degrades to
//! zero counts and empty tables.

use crate::models::{
    AggregateResult, AreaSplit, DistinctCounts, DistrictCount, GeoRegion, InstitutionRecord,
    JoinedRegion, MapJoin, ValueCount, RURAL, URBAN,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Number of distinct non-absent values of a field.
pub fn distinct_count<'a, F>(rows: &[&'a InstitutionRecord], field: F) -> usize
where
    F: Fn(&'a InstitutionRecord) -> Option<&'a str>,
{
    rows.iter()
        .filter_map(|r| field(*r))
        .collect::<HashSet<_>>()
        .len()
}

/// Row count per non-absent value, in first-seen order.
pub fn count_values<'a, F>(rows: &[&'a InstitutionRecord], field: F) -> Vec<ValueCount>
where
    F: Fn(&'a InstitutionRecord) -> Option<&'a str>,
{
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();

    for value in rows.iter().filter_map(|r| field(*r)) {
        match position.get(value) {
            Some(&i) => counts[i].count += 1,
            None => {
                position.insert(value, counts.len());
                counts.push(ValueCount::new(value, 1));
            }
        }
    }

    counts
}

/// Sort counts descending. The sort is stable, so ties keep their order.
pub fn rank_descending(mut counts: Vec<ValueCount>) -> Vec<ValueCount> {
    counts.sort_by_key(|c| std::cmp::Reverse(c.count));
    counts
}

/// Sort counts by value, ascending.
pub fn sort_by_value(mut counts: Vec<ValueCount>) -> Vec<ValueCount> {
    counts.sort_by(|a, b| a.value.cmp(&b.value));
    counts
}

/// Distinct colleges, universities, talukas and districts.
pub fn distinct_counts(rows: &[&InstitutionRecord]) -> DistinctCounts {
    DistinctCounts {
        colleges: distinct_count(rows, |r| r.college_name.as_deref()),
        universities: distinct_count(rows, |r| r.university_name.as_deref()),
        talukas: distinct_count(rows, |r| r.taluka.as_deref()),
        districts: distinct_count(rows, |r| r.district.as_deref()),
    }
}

/// Rows and distinct universities per district, ordered by district.
pub fn district_counts(rows: &[&InstitutionRecord]) -> Vec<DistrictCount> {
    let mut grouped: BTreeMap<&str, (usize, HashSet<&str>)> = BTreeMap::new();

    for row in rows {
        let Some(district) = row.district.as_deref() else {
            continue;
        };
        let entry = grouped.entry(district).or_default();
        entry.0 += 1;
        if let Some(university) = row.university_name.as_deref() {
            entry.1.insert(university);
        }
    }

    grouped
        .into_iter()
        .map(|(district, (colleges, universities))| DistrictCount {
            district: district.to_string(),
            colleges,
            universities: universities.len(),
        })
        .collect()
}

/// Share of `part` in `total` as a percentage, in tenths of a percent.
fn percent_tenths(part: usize, total: usize) -> u64 {
    if total == 0 {
        return 0;
    }
    let (part, total) = (part as u64, total as u64);
    // Round half up.
    (part * 2000 + total) / (2 * total)
}

/// Urban and rural row counts with their percentages of the two combined.
///
/// Percentages are rounded to one decimal and always sum to 100, or are
/// both zero when neither value occurs.
pub fn area_split(rows: &[&InstitutionRecord]) -> AreaSplit {
    let urban = rows
        .iter()
        .filter(|r| r.area_type.as_deref() == Some(URBAN))
        .count();
    let rural = rows
        .iter()
        .filter(|r| r.area_type.as_deref() == Some(RURAL))
        .count();
    let total = urban + rural;

    if total == 0 {
        return AreaSplit::default();
    }

    let urban_tenths = percent_tenths(urban, total);
    AreaSplit {
        urban,
        rural,
        urban_percent: urban_tenths as f64 / 10.0,
        rural_percent: (1000 - urban_tenths) as f64 / 10.0,
    }
}

/// Compute every aggregate for one working dataset.
pub fn aggregate(rows: &[&InstitutionRecord]) -> AggregateResult {
    AggregateResult {
        total_rows: rows.len(),
        distinct: distinct_counts(rows),
        by_district: district_counts(rows),
        university_ranking: rank_descending(count_values(rows, |r| r.university_name.as_deref())),
        area_split: area_split(rows),
        area_types: rank_descending(count_values(rows, |r| r.area_type.as_deref())),
        college_types: rank_descending(count_values(rows, |r| r.college_type.as_deref())),
        exclusivity: sort_by_value(count_values(rows, |r| r.exclusivity.as_deref())),
    }
}

/// Attach district counts to every region.
///
/// Regions without matching rows get zero counts. Districts without a
/// region are left out of the regions and listed as unmatched.
pub fn join_regions(regions: &[GeoRegion], by_district: &[DistrictCount]) -> MapJoin {
    let lookup: HashMap<&str, &DistrictCount> = by_district
        .iter()
        .map(|d| (d.district.as_str(), d))
        .collect();

    let joined = regions
        .iter()
        .map(|region| {
            let counts = lookup.get(region.name.as_str());
            JoinedRegion {
                region: region.clone(),
                colleges: counts.map(|c| c.colleges).unwrap_or(0),
                universities: counts.map(|c| c.universities).unwrap_or(0),
            }
        })
        .collect();

    let region_names: HashSet<&str> = regions.iter().map(|r| r.name.as_str()).collect();
    let unmatched_districts = by_district
        .iter()
        .filter(|d| !region_names.contains(d.district.as_str()))
        .map(|d| d.district.clone())
        .collect();

    MapJoin {
        regions: joined,
        unmatched_districts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dimension, FilterState, Selection};
    use crate::analysis::filter::apply_filters;
    use serde_json::Value;

    fn create_test_record(district: &str, university: &str, area: &str) -> InstitutionRecord {
        InstitutionRecord {
            district: Some(district.to_string()),
            taluka: Some(format!("{} Taluka", district)),
            university_name: Some(university.to_string()),
            college_name: Some(format!("{} {} {}", district, university, area)),
            college_type: Some("Arts".to_string()),
            area_type: Some(area.to_string()),
            exclusivity: Some("No".to_string()),
        }
    }

    fn region(name: &str) -> GeoRegion {
        GeoRegion {
            name: name.to_string(),
            geometry: Value::Null,
            properties: serde_json::Map::new(),
        }
    }

    /// Three colleges in PUNE (two urban), two in NASHIK (both rural).
    fn pune_nashik() -> Vec<InstitutionRecord> {
        vec![
            create_test_record("PUNE", "SPPU", "Urban"),
            create_test_record("PUNE", "SPPU", "Urban"),
            create_test_record("PUNE", "Bharati", "Rural"),
            create_test_record("NASHIK", "YCMOU", "Rural"),
            create_test_record("NASHIK", "MUHS", "Rural"),
        ]
    }

    #[test]
    fn test_pune_nashik_scenario() {
        let records = pune_nashik();
        let rows = apply_filters(&records, &FilterState::new());
        let result = aggregate(&rows);

        assert_eq!(result.total_rows, 5);
        assert_eq!(result.distinct.districts, 2);
        assert_eq!(result.area_split.urban, 2);
        assert_eq!(result.area_split.rural, 3);
        assert_eq!(result.area_split.urban_percent, 40.0);
        assert_eq!(result.area_split.rural_percent, 60.0);
        assert_eq!(
            result.by_district,
            vec![
                DistrictCount {
                    district: "NASHIK".to_string(),
                    colleges: 2,
                    universities: 2
                },
                DistrictCount {
                    district: "PUNE".to_string(),
                    colleges: 3,
                    universities: 2
                },
            ]
        );
    }

    #[test]
    fn test_empty_cascade_scenario() {
        let records = pune_nashik();
        let state = FilterState::new()
            .with(Dimension::District, Selection::parse("PUNE"))
            .with(Dimension::University, Selection::parse("YCMOU"));
        let rows = apply_filters(&records, &state);
        assert!(rows.is_empty());

        let result = aggregate(&rows);
        assert_eq!(result.total_rows, 0);
        assert_eq!(result.distinct, DistinctCounts::default());
        assert!(result.by_district.is_empty());
        assert!(result.university_ranking.is_empty());
        assert_eq!(result.area_split.urban_percent, 0.0);
        assert_eq!(result.area_split.rural_percent, 0.0);
        assert!(result.college_types.is_empty());
        assert!(result.exclusivity.is_empty());

        let map = join_regions(&[region("PUNE"), region("NASHIK")], &result.by_district);
        assert!(map.regions.iter().all(|r| r.colleges == 0 && r.universities == 0));
    }

    #[test]
    fn test_university_ranking_is_stable() {
        let records = vec![
            create_test_record("PUNE", "A", "Urban"),
            create_test_record("PUNE", "B", "Urban"),
            create_test_record("PUNE", "C", "Urban"),
            create_test_record("PUNE", "B", "Urban"),
            create_test_record("PUNE", "A", "Urban"),
            create_test_record("PUNE", "B", "Urban"),
            create_test_record("PUNE", "A", "Urban"),
        ];
        let rows: Vec<_> = records.iter().collect();

        let ranking = aggregate(&rows).university_ranking;
        assert_eq!(
            ranking,
            vec![
                ValueCount::new("A", 3),
                ValueCount::new("B", 3),
                ValueCount::new("C", 1)
            ]
        );
    }

    #[test]
    fn test_area_type_counts_sum_to_rows() {
        let mut records = pune_nashik();
        records.push(create_test_record("PUNE", "SPPU", "Semi-Urban"));
        let rows: Vec<_> = records.iter().collect();

        let result = aggregate(&rows);
        let sum: usize = result.area_types.iter().map(|c| c.count).sum();
        assert_eq!(sum, result.total_rows);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        for (urban, rural) in [(1, 2), (1, 6), (2, 1), (7, 0), (0, 3), (1, 7), (5, 3)] {
            let mut records = Vec::new();
            records.extend((0..urban).map(|_| create_test_record("PUNE", "A", "Urban")));
            records.extend((0..rural).map(|_| create_test_record("PUNE", "A", "Rural")));
            let rows: Vec<_> = records.iter().collect();

            let split = area_split(&rows);
            assert!((split.urban_percent + split.rural_percent - 100.0).abs() < 1e-9);
        }

        let split = area_split(&[]);
        assert_eq!(split.urban_percent, 0.0);
        assert_eq!(split.rural_percent, 0.0);
    }

    #[test]
    fn test_percentages_round_to_one_decimal() {
        let records = vec![
            create_test_record("PUNE", "A", "Urban"),
            create_test_record("PUNE", "A", "Rural"),
            create_test_record("PUNE", "A", "Rural"),
        ];
        let rows: Vec<_> = records.iter().collect();

        let split = area_split(&rows);
        assert_eq!(split.urban_percent, 33.3);
        assert_eq!(split.rural_percent, 66.7);
    }

    #[test]
    fn test_other_area_types_do_not_count() {
        let records = vec![create_test_record("PUNE", "A", "Tribal")];
        let rows: Vec<_> = records.iter().collect();

        let split = area_split(&rows);
        assert_eq!(split.total(), 0);
        assert_eq!(split.urban_percent, 0.0);
    }

    #[test]
    fn test_college_type_and_exclusivity_ordering() {
        let mut records = pune_nashik();
        records[0].college_type = Some("Science".to_string());
        records[1].college_type = Some("Science".to_string());
        records[2].college_type = Some("Science".to_string());
        records[0].exclusivity = Some("Yes".to_string());
        records[3].exclusivity = Some("Co-ed".to_string());
        let rows: Vec<_> = records.iter().collect();

        let result = aggregate(&rows);
        assert_eq!(
            result.college_types,
            vec![ValueCount::new("Science", 3), ValueCount::new("Arts", 2)]
        );
        assert_eq!(
            result.exclusivity,
            vec![
                ValueCount::new("Co-ed", 1),
                ValueCount::new("No", 3),
                ValueCount::new("Yes", 1)
            ]
        );
    }

    #[test]
    fn test_distinct_counts_skip_absent_values() {
        let mut records = pune_nashik();
        records[0].college_name = None;
        records[1].taluka = None;
        let rows: Vec<_> = records.iter().collect();

        let distinct = distinct_counts(&rows);
        assert_eq!(distinct.colleges, 4);
        assert_eq!(distinct.universities, 4);
        assert_eq!(distinct.talukas, 2);
        assert_eq!(distinct.districts, 2);
    }

    #[test]
    fn test_join_regions_left_join() {
        let mut records = pune_nashik();
        records.push(create_test_record("MUMBAI SUBURBAN", "MU", "Urban"));
        let rows: Vec<_> = records.iter().collect();
        let result = aggregate(&rows);

        let regions = vec![region("PUNE"), region("NASHIK"), region("SATARA")];
        let map = join_regions(&regions, &result.by_district);

        let counts: Vec<_> = map
            .regions
            .iter()
            .map(|r| (r.region.name.as_str(), r.colleges, r.universities))
            .collect();
        assert_eq!(
            counts,
            vec![("PUNE", 3, 2), ("NASHIK", 2, 2), ("SATARA", 0, 0)]
        );
        assert_eq!(map.unmatched_districts, vec!["MUMBAI SUBURBAN"]);

        // Joined colleges = rows minus rows without a region.
        let joined: usize = map.regions.iter().map(|r| r.colleges).sum();
        assert_eq!(joined, result.total_rows - 1);
        // The unmatched district is still counted.
        assert_eq!(result.distinct.districts, 3);
    }
}
