//! Holder for the active city and [`FilterCriteria`].
//!
//! Mutators return `true` when they published a new snapshot, so the caller
//! knows whether dependent views need recomputing.

use std::collections::BTreeSet;
use std::sync::Arc;

use bizmap_core::Coordinates;

use crate::criteria::{FilterCriteria, SortDescriptor};
use crate::observe::{Observable, SubscriptionId};

#[derive(Debug, Default)]
pub struct FilterState {
    city: Option<String>,
    criteria: Observable<FilterCriteria>,
}

impl FilterState {
    #[must_use]
    pub fn new(criteria: FilterCriteria) -> Self {
        Self {
            city: None,
            criteria: Observable::new(criteria),
        }
    }

    #[must_use]
    pub fn criteria(&self) -> &Arc<FilterCriteria> {
        self.criteria.get()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.criteria.revision()
    }

    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// Records which city the loaded records belong to. Blank clears it.
    pub fn set_city(&mut self, city: Option<&str>) -> bool {
        let next = city.map(str::trim).filter(|c| !c.is_empty()).map(str::to_owned);
        if next == self.city {
            return false;
        }
        self.city = next;
        true
    }

    pub fn set_search_term(&mut self, term: &str) -> bool {
        self.criteria.update(|c| term.clone_into(&mut c.search_term))
    }

    /// Replaces the whole industry selection.
    pub fn set_selected_industries<I, S>(&mut self, industries: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: BTreeSet<String> = industries
            .into_iter()
            .map(Into::into)
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        self.criteria.update(|c| c.selected_industries = next)
    }

    /// Adds `code` if absent, removes it if present.
    pub fn toggle_industry(&mut self, code: &str) -> bool {
        let code = code.trim();
        if code.is_empty() {
            return false;
        }
        self.criteria.update(|c| {
            if !c.selected_industries.remove(code) {
                c.selected_industries.insert(code.to_owned());
            }
        })
    }

    pub fn set_user_location(&mut self, location: Option<Coordinates>) -> bool {
        self.criteria.update(|c| c.user_location = location)
    }

    /// Negative radii clamp to zero; non-finite values clear the limit.
    pub fn set_distance_limit(&mut self, limit_km: Option<f64>) -> bool {
        let limit_km = limit_km.filter(|km| km.is_finite()).map(|km| km.max(0.0));
        self.criteria.update(|c| c.distance_limit_km = limit_km)
    }

    pub fn set_sort_descriptor(&mut self, sort: SortDescriptor) -> bool {
        self.criteria.update(|c| c.sort = sort)
    }

    /// Clears every filter but keeps the sort order.
    pub fn reset_filters(&mut self) -> bool {
        self.criteria.update(|c| {
            *c = FilterCriteria {
                sort: c.sort.clone(),
                ..FilterCriteria::default()
            };
        })
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Arc<FilterCriteria>) + Send + 'static,
    {
        self.criteria.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.criteria.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::criteria::SortDirection;

    #[test]
    fn toggle_industry_adds_then_removes() {
        let mut state = FilterState::default();
        assert!(state.toggle_industry("62"));
        assert!(state.criteria().selected_industries.contains("62"));
        assert!(state.toggle_industry("62"));
        assert!(state.criteria().selected_industries.is_empty());
    }

    #[test]
    fn set_selected_industries_replaces_and_trims() {
        let mut state = FilterState::default();
        state.toggle_industry("10");
        state.set_selected_industries([" 62 ", "47", ""]);
        let selected: Vec<&str> = state
            .criteria()
            .selected_industries
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(selected, ["47", "62"]);
    }

    #[test]
    fn distance_limit_is_clamped_to_zero() {
        let mut state = FilterState::default();
        state.set_distance_limit(Some(-5.0));
        assert_eq!(state.criteria().distance_limit_km, Some(0.0));
        state.set_distance_limit(Some(f64::NAN));
        assert_eq!(state.criteria().distance_limit_km, None);
    }

    #[test]
    fn unchanged_values_do_not_publish() {
        let mut state = FilterState::default();
        assert!(state.set_search_term("acme"));
        let rev = state.revision();
        assert!(!state.set_search_term("acme"));
        assert!(!state.set_sort_descriptor(SortDescriptor::default()));
        assert_eq!(state.revision(), rev);
    }

    #[test]
    fn subscribers_see_each_new_snapshot() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut state = FilterState::default();
        state.subscribe(move |c| sink.lock().unwrap().push(c.search_term.clone()));

        state.set_search_term("a");
        state.set_search_term("ab");
        assert_eq!(*seen.lock().unwrap(), ["a", "ab"]);
    }

    #[test]
    fn reset_filters_keeps_sort() {
        let mut state = FilterState::default();
        state.set_search_term("x");
        state.toggle_industry("62");
        state.set_sort_descriptor(SortDescriptor::new("city", SortDirection::Desc));
        assert!(state.reset_filters());
        let c = state.criteria();
        assert!(c.search_term.is_empty());
        assert!(c.selected_industries.is_empty());
        assert_eq!(c.sort.field, "city");
    }

    #[test]
    fn set_city_ignores_blank_and_repeats() {
        let mut state = FilterState::default();
        assert!(state.set_city(Some(" Helsinki ")));
        assert_eq!(state.city(), Some("Helsinki"));
        assert!(!state.set_city(Some("Helsinki")));
        assert!(state.set_city(Some("  ")));
        assert!(state.city().is_none());
    }
}
