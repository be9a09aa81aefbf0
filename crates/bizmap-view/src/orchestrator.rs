//! Composition point for the record view.
//!
//! [`ViewOrchestrator`] owns the raw records and the injected state
//! containers. Every mutation that can change the filtered set re-runs the
//! pipeline synchronously, corrects the page index if the result shrank, and
//! publishes a fresh [`ViewSnapshot`]. The table reads one page; the map
//! reads every match; both come from the same `filtered` list.

use std::collections::HashSet;
use std::sync::Arc;

use bizmap_core::{BusinessRecord, Coordinates};
use serde::Serialize;

use crate::criteria::{FilterCriteria, SortDescriptor};
use crate::filter_state::FilterState;
use crate::observe::{Observable, SubscriptionId};
use crate::paginate::paginate;
use crate::pipeline;
use crate::selection::{SelectionMode, SelectionScope, SelectionSet, SelectionState};
use crate::session::SessionSnapshot;
use crate::view_state::{ColumnKey, ViewMode, ViewState};

/// Summary republished after every recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub record_count: usize,
    pub filtered_count: usize,
    pub page_index: usize,
    pub total_pages: usize,
    pub selected_count: usize,
    pub selection_mode: SelectionMode,
}

/// The table's current page.
#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub items: Vec<&'a BusinessRecord>,
    pub total_pages: usize,
    pub page_index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TableRow<'a> {
    pub record: &'a BusinessRecord,
    pub selected: bool,
}

/// Everything the map draws: all matches, unpaginated.
#[derive(Debug, Clone)]
pub struct MapView<'a> {
    pub features: Vec<&'a BusinessRecord>,
    pub selected_feature_ids: Vec<&'a str>,
}

/// Read-side view of the selection, narrowed to the live records.
#[derive(Debug, Clone)]
pub struct SelectionView<'a> {
    set: &'a SelectionSet,
    known: &'a HashSet<String>,
    filtered: HashSet<&'a str>,
}

impl SelectionView<'_> {
    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.set.mode
    }

    /// All-filtered selects exactly the current matches; explicit selection
    /// never reports ids that vanished from the record set.
    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        match self.set.mode {
            SelectionMode::AllFiltered => self.filtered.contains(id),
            SelectionMode::Explicit => self.set.explicit.contains(id) && self.known.contains(id),
        }
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        match self.set.mode {
            SelectionMode::AllFiltered => self.filtered.len(),
            SelectionMode::Explicit => self
                .set
                .explicit
                .iter()
                .filter(|id| self.known.contains(*id))
                .count(),
        }
    }
}

#[derive(Debug)]
pub struct ViewOrchestrator {
    records: Vec<BusinessRecord>,
    known_ids: HashSet<String>,
    filter: FilterState,
    selection: SelectionState,
    view: ViewState,
    page_index: usize,
    page_size: usize,
    /// Positions into `records`, in display order.
    filtered: Vec<usize>,
    snapshot: Observable<ViewSnapshot>,
}

impl ViewOrchestrator {
    #[must_use]
    pub fn new(
        filter: FilterState,
        selection: SelectionState,
        view: ViewState,
        page_size: usize,
    ) -> Self {
        let mut orchestrator = Self {
            records: Vec::new(),
            known_ids: HashSet::new(),
            filter,
            selection,
            view,
            page_index: 1,
            page_size: page_size.max(1),
            filtered: Vec::new(),
            snapshot: Observable::default(),
        };
        orchestrator.recompute();
        orchestrator
    }

    /// Fresh state containers with default criteria.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self::new(
            FilterState::default(),
            SelectionState::default(),
            ViewState::default(),
            page_size,
        )
    }

    /// Rebuilds an orchestrator from a persisted session. Records are not
    /// part of the session and must be loaded again; the saved page index is
    /// only clamped once they arrive.
    #[must_use]
    pub fn from_session(session: SessionSnapshot) -> Self {
        let mut filter = FilterState::new(session.criteria);
        filter.set_city(session.city.as_deref());
        let mut orchestrator = Self::new(
            filter,
            SelectionState::new(session.selection),
            ViewState::new(session.view),
            session.page_size,
        );
        orchestrator.page_index = session.page_index.max(1);
        orchestrator
    }

    #[must_use]
    pub fn session_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            city: self.filter.city().map(str::to_owned),
            criteria: (**self.filter.criteria()).clone(),
            selection: (**self.selection.snapshot()).clone(),
            view: (**self.view.settings()).clone(),
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }

    // ----------------------------------------------------------------------
    // Records
    // ----------------------------------------------------------------------

    /// Replaces the record collection wholesale (a new city query arrived).
    ///
    /// Explicitly selected ids that no longer exist are dropped.
    pub fn replace_records(&mut self, records: Vec<BusinessRecord>) {
        self.known_ids = records.iter().map(|r| r.id.clone()).collect();
        self.records = records;
        let pruned = self.selection.retain_known(&self.known_ids);
        if pruned > 0 {
            tracing::debug!(pruned, "dropped stale selection ids after record replacement");
        }
        self.recompute();
    }

    /// Degrades to an empty view, e.g. after a failed fetch.
    ///
    /// Unlike [`Self::replace_records`] this keeps explicitly selected ids:
    /// they are hidden on read while no records are loaded and pruned only
    /// when a real record set arrives.
    pub fn clear_records(&mut self) {
        self.records.clear();
        self.known_ids.clear();
        self.recompute();
    }

    #[must_use]
    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }

    // ----------------------------------------------------------------------
    // State access
    // ----------------------------------------------------------------------

    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub fn criteria(&self) -> &Arc<FilterCriteria> {
        self.filter.criteria()
    }

    #[must_use]
    pub fn selection_state(&self) -> &SelectionState {
        &self.selection
    }

    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[must_use]
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn snapshot(&self) -> &Arc<ViewSnapshot> {
        self.snapshot.get()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Arc<ViewSnapshot>) + Send + 'static,
    {
        self.snapshot.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.snapshot.unsubscribe(id)
    }

    // ----------------------------------------------------------------------
    // Filter mutators
    // ----------------------------------------------------------------------

    pub fn set_city(&mut self, city: Option<&str>) -> bool {
        self.filter.set_city(city)
    }

    pub fn set_search_term(&mut self, term: &str) {
        if self.filter.set_search_term(term) {
            self.recompute();
        }
    }

    pub fn set_selected_industries<I, S>(&mut self, industries: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.filter.set_selected_industries(industries) {
            self.recompute();
        }
    }

    pub fn toggle_industry(&mut self, code: &str) {
        if self.filter.toggle_industry(code) {
            self.recompute();
        }
    }

    pub fn set_user_location(&mut self, location: Option<Coordinates>) {
        if self.filter.set_user_location(location) {
            self.recompute();
        }
    }

    pub fn set_distance_limit(&mut self, limit_km: Option<f64>) {
        if self.filter.set_distance_limit(limit_km) {
            self.recompute();
        }
    }

    pub fn set_sort_descriptor(&mut self, sort: SortDescriptor) {
        if self.filter.set_sort_descriptor(sort) {
            self.recompute();
        }
    }

    pub fn reset_filters(&mut self) {
        if self.filter.reset_filters() {
            self.recompute();
        }
    }

    // ----------------------------------------------------------------------
    // Pagination
    // ----------------------------------------------------------------------

    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
        self.clamp_page();
        self.publish();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page_index.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page_index.saturating_sub(1));
    }

    /// Changing the page size starts over at page 1.
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        if page_size == self.page_size {
            return;
        }
        self.page_size = page_size;
        self.page_index = 1;
        self.publish();
    }

    // ----------------------------------------------------------------------
    // View mutators
    // ----------------------------------------------------------------------

    pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        self.view.set_view(mode)
    }

    pub fn toggle_column_visibility(&mut self, key: ColumnKey) -> bool {
        self.view.toggle_column_visibility(key)
    }

    pub fn reset_columns(&mut self) -> bool {
        self.view.reset_columns()
    }

    // ----------------------------------------------------------------------
    // Selection mutators
    // ----------------------------------------------------------------------

    /// Flips one record's selection; ids not in the record set are ignored.
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        let filtered: Vec<&str> = self
            .filtered
            .iter()
            .map(|&idx| self.records[idx].id.as_str())
            .collect();
        let changed = self
            .selection
            .toggle(id, SelectionScope::new(&self.known_ids, &filtered));
        if changed {
            self.publish();
        }
        changed
    }

    /// The table's "select all": every record matching the filter, on every
    /// page, tracked live as the filter changes.
    pub fn select_all_filtered(&mut self) {
        if self.selection.select_all_filtered() {
            self.publish();
        }
    }

    /// Adds only the visible page's records to the selection.
    pub fn select_page(&mut self) {
        let page = paginate(&self.filtered, self.page_index, self.page_size);
        let page_ids: Vec<&str> = page
            .items
            .iter()
            .map(|&idx| self.records[idx].id.as_str())
            .collect();
        let filtered: Vec<&str> = self
            .filtered
            .iter()
            .map(|&idx| self.records[idx].id.as_str())
            .collect();
        let changed = self.selection.select_page(
            page_ids.iter().copied(),
            SelectionScope::new(&self.known_ids, &filtered),
        );
        if changed {
            self.publish();
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.publish();
        }
    }

    // ----------------------------------------------------------------------
    // Reads for presentation
    // ----------------------------------------------------------------------

    /// All matching records in display order (the map's input).
    #[must_use]
    pub fn filtered_set(&self) -> Vec<&BusinessRecord> {
        self.filtered.iter().map(|&idx| &self.records[idx]).collect()
    }

    #[must_use]
    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    /// The table's page. The page index is already clamped.
    #[must_use]
    pub fn current_page(&self) -> PageView<'_> {
        let page = paginate(&self.filtered, self.page_index, self.page_size);
        PageView {
            items: page.items.iter().map(|&idx| &self.records[idx]).collect(),
            total_pages: page.total_pages,
            page_index: page.clamped_page_index,
        }
    }

    /// Current page with each row's selection flag.
    #[must_use]
    pub fn table_rows(&self) -> Vec<TableRow<'_>> {
        let selection = self.selection();
        self.current_page()
            .items
            .into_iter()
            .map(|record| TableRow {
                record,
                selected: selection.is_selected(&record.id),
            })
            .collect()
    }

    #[must_use]
    pub fn map_view(&self) -> MapView<'_> {
        let selection = self.selection();
        let features = self.filtered_set();
        let selected_feature_ids = features
            .iter()
            .map(|r| r.id.as_str())
            .filter(|id| selection.is_selected(id))
            .collect();
        MapView {
            features,
            selected_feature_ids,
        }
    }

    #[must_use]
    pub fn selection(&self) -> SelectionView<'_> {
        SelectionView {
            set: self.selection.snapshot(),
            known: &self.known_ids,
            filtered: self
                .filtered
                .iter()
                .map(|&idx| self.records[idx].id.as_str())
                .collect(),
        }
    }

    /// Selected ids: visible matches in display order, then selected records
    /// hidden by the current filter in id order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<&str> {
        let selection = self.selection();
        let mut ids: Vec<&str> = self
            .filtered
            .iter()
            .map(|&idx| self.records[idx].id.as_str())
            .filter(|id| selection.is_selected(id))
            .collect();
        if selection.mode() == SelectionMode::Explicit {
            let shown: HashSet<&str> = ids.iter().copied().collect();
            ids.extend(
                self.selection
                    .snapshot()
                    .explicit
                    .iter()
                    .map(String::as_str)
                    .filter(|id| self.known_ids.contains(*id) && !shown.contains(id)),
            );
        }
        ids
    }

    // ----------------------------------------------------------------------
    // Internals
    // ----------------------------------------------------------------------

    fn recompute(&mut self) {
        self.filtered = pipeline::apply_indices(&self.records, self.filter.criteria());
        self.clamp_page();
        self.publish();
    }

    fn clamp_page(&mut self) {
        let page = paginate(&self.filtered, self.page_index, self.page_size);
        if page.was_clamped(self.page_index) {
            tracing::debug!(
                requested = self.page_index,
                corrected = page.clamped_page_index,
                total_pages = page.total_pages,
                "page index out of range, clamping"
            );
            self.page_index = page.clamped_page_index;
        }
    }

    fn publish(&mut self) {
        let selection = self.selection();
        let next = ViewSnapshot {
            record_count: self.records.len(),
            filtered_count: self.filtered.len(),
            page_index: self.page_index,
            total_pages: self.filtered.len().div_ceil(self.page_size).max(1),
            selected_count: selection.selected_count(),
            selection_mode: selection.mode(),
        };
        self.snapshot.update(|s| *s = next);
    }
}

impl Default for ViewOrchestrator {
    fn default() -> Self {
        Self::with_page_size(25)
    }
}
