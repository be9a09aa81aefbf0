//! The record filter pipeline: search, industry, distance, then sort.
//!
//! Every stage is a pure predicate or a stable sort, so the same records and
//! criteria always yield the same ordered output, and applying the pipeline
//! to its own output changes nothing.

use std::collections::BTreeMap;

use bizmap_core::{distance_km, BusinessRecord, Coordinates};
use serde::Serialize;

use crate::criteria::FilterCriteria;
use crate::sort::RecordComparator;

/// Filters and sorts `records`, returning references in display order.
#[must_use]
pub fn apply<'a>(records: &'a [BusinessRecord], criteria: &FilterCriteria) -> Vec<&'a BusinessRecord> {
    apply_indices(records, criteria)
        .into_iter()
        .map(|idx| &records[idx])
        .collect()
}

/// Same as [`apply`] but yields positions into `records`.
#[must_use]
pub fn apply_indices(records: &[BusinessRecord], criteria: &FilterCriteria) -> Vec<usize> {
    let needle = normalized_search(&criteria.search_term);
    let distance = criteria.distance_filter();

    let mut matched: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| needle.as_deref().is_none_or(|n| matches_search(r, n)))
        .filter(|(_, r)| matches_industry(r, criteria))
        .filter(|(_, r)| {
            distance.is_none_or(|(origin, limit_km)| within_distance(r, &origin, limit_km))
        })
        .map(|(idx, _)| idx)
        .collect();

    let comparator = RecordComparator::for_descriptor(&criteria.sort);
    let sorted = comparator.is_some();
    if let Some(mut cmp) = comparator {
        matched.sort_by(|a, b| cmp.compare(&records[*a], &records[*b]));
    }

    tracing::debug!(
        total = records.len(),
        matched = matched.len(),
        sort_field = %criteria.sort.field,
        sorted,
        "applied record filters"
    );
    matched
}

/// Lower-cased search needle, or `None` when the term is blank.
fn normalized_search(term: &str) -> Option<String> {
    let trimmed = term.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// `needle` must already be lower-cased.
fn matches_search(record: &BusinessRecord, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle)
}

/// Records without an industry code never match an active industry filter.
#[must_use]
pub fn matches_industry(record: &BusinessRecord, criteria: &FilterCriteria) -> bool {
    if criteria.selected_industries.is_empty() {
        return true;
    }
    record
        .industry_code
        .as_ref()
        .is_some_and(|code| criteria.selected_industries.contains(code))
}

/// Fail-closed: records without valid coordinates are outside every radius.
#[must_use]
pub fn within_distance(record: &BusinessRecord, origin: &Coordinates, limit_km: f64) -> bool {
    record
        .coordinates()
        .is_some_and(|c| distance_km(origin, &c) <= limit_km)
}

/// One selectable industry with how many records carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndustryFacet {
    pub code: String,
    pub description: Option<String>,
    pub count: usize,
}

/// Distinct industry codes in `records`, ordered by code.
///
/// The first non-empty description seen for a code is kept.
#[must_use]
pub fn industry_facets(records: &[BusinessRecord]) -> Vec<IndustryFacet> {
    let mut by_code: BTreeMap<&str, IndustryFacet> = BTreeMap::new();
    for record in records {
        let Some(code) = record.industry_code.as_deref() else {
            continue;
        };
        let facet = by_code.entry(code).or_insert_with(|| IndustryFacet {
            code: code.to_owned(),
            description: None,
            count: 0,
        });
        facet.count += 1;
        if facet.description.is_none() {
            facet.description.clone_from(&record.industry_description);
        }
    }
    by_code.into_values().collect()
}

#[cfg(test)]
mod tests {
    use bizmap_core::Address;

    use super::*;
    use crate::criteria::{SortDescriptor, SortDirection};

    fn record(id: &str, name: &str, industry: Option<&str>) -> BusinessRecord {
        let mut r = BusinessRecord::new(id, name);
        r.industry_code = industry.map(str::to_owned);
        r
    }

    fn at(mut r: BusinessRecord, lat: f64, lon: f64) -> BusinessRecord {
        r.address = Some(Address {
            coordinates: Coordinates::new(lat, lon),
            ..Address::default()
        });
        r
    }

    fn ids(records: &[&BusinessRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    fn sample() -> Vec<BusinessRecord> {
        vec![
            record("1", "Acme Oy", Some("62")),
            record("2", "Beta Ab", Some("47")),
            record("3", "acme logistics", None),
            record("4", "Gamma Tmi", Some("62")),
        ]
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let criteria = FilterCriteria {
            search_term: "ACME".into(),
            ..FilterCriteria::default()
        };
        let records = sample();
        let out = apply(&records, &criteria);
        // "acme logistics" < "acme oy" once case is ignored
        assert_eq!(ids(&out), ["3", "1"]);
    }

    #[test]
    fn blank_search_is_pass_through() {
        let records = sample();
        let criteria = FilterCriteria {
            search_term: "   ".into(),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&records, &criteria).len(), records.len());
    }

    #[test]
    fn null_industry_excluded_only_when_filter_active() {
        let records = vec![record("n", "Nameless", None)];
        let mut criteria = FilterCriteria::default();
        assert_eq!(apply(&records, &criteria).len(), 1);

        criteria.selected_industries.insert("62".into());
        assert!(apply(&records, &criteria).is_empty());
    }

    #[test]
    fn distance_filter_keeps_only_nearby_records() {
        let helsinki = at(record("A", "Helsinki Oy", None), 60.1699, 24.9384);
        let tampere = at(record("B", "Tampere Oy", None), 61.4978, 23.7610);
        let criteria = FilterCriteria {
            user_location: helsinki.coordinates(),
            distance_limit_km: Some(50.0),
            ..FilterCriteria::default()
        };
        let records = vec![helsinki, tampere];
        assert_eq!(ids(&apply(&records, &criteria)), ["A"]);
    }

    #[test]
    fn distance_filter_excludes_records_without_coordinates() {
        let located = at(record("A", "Here", None), 60.1699, 24.9384);
        let nowhere = record("B", "Nowhere", None);
        let criteria = FilterCriteria {
            user_location: located.coordinates(),
            distance_limit_km: Some(10_000.0),
            ..FilterCriteria::default()
        };
        let records = vec![located, nowhere];
        assert_eq!(ids(&apply(&records, &criteria)), ["A"]);
    }

    #[test]
    fn distance_limit_without_location_is_ignored() {
        let records = vec![record("B", "Nowhere", None)];
        let criteria = FilterCriteria {
            distance_limit_km: Some(1.0),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&records, &criteria).len(), 1);
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        let records = sample();
        let criteria = FilterCriteria {
            search_term: "a".into(),
            sort: SortDescriptor::new("name", SortDirection::Desc),
            ..FilterCriteria::default()
        };
        let once: Vec<BusinessRecord> = apply(&records, &criteria).into_iter().cloned().collect();
        let twice: Vec<BusinessRecord> = apply(&once, &criteria).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn sorting_twice_preserves_equal_key_order() {
        let records = vec![
            record("1", "Same", Some("62")),
            record("2", "Other", Some("47")),
            record("3", "same", Some("10")),
        ];
        let criteria = FilterCriteria::default();
        let once = apply(&records, &criteria);
        assert_eq!(ids(&once), ["2", "1", "3"]);
        let owned: Vec<BusinessRecord> = once.into_iter().cloned().collect();
        assert_eq!(ids(&apply(&owned, &criteria)), ["2", "1", "3"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(apply(&[], &FilterCriteria::default()).is_empty());
    }

    #[test]
    fn industry_facets_counts_codes_in_order() {
        let mut records = sample();
        records[0].industry_description = Some("Computer programming".into());
        let facets = industry_facets(&records);
        let codes: Vec<(&str, usize)> = facets.iter().map(|f| (f.code.as_str(), f.count)).collect();
        assert_eq!(codes, [("47", 1), ("62", 2)]);
        assert_eq!(facets[1].description.as_deref(), Some("Computer programming"));
    }
}
