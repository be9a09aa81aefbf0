//! Cross-page selection of record ids.
//!
//! In [`SelectionMode::AllFiltered`] the selection is "whatever currently
//! matches the filter" and follows filter changes live; `explicit` is empty
//! and carries no meaning. Leaving that mode (by toggling one id) first
//! materializes the current matches into `explicit`.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::observe::{Observable, SubscriptionId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    #[default]
    Explicit,
    AllFiltered,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionMode::Explicit => write!(f, "explicit"),
            SelectionMode::AllFiltered => write!(f, "all-filtered"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    pub explicit: BTreeSet<String>,
    pub mode: SelectionMode,
}

impl SelectionSet {
    /// Raw membership test: any id in all-filtered mode, listed ids otherwise.
    ///
    /// This does not know what currently matches; [`crate::SelectionView`]
    /// narrows it to live records.
    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.mode == SelectionMode::AllFiltered || self.explicit.contains(id)
    }
}

/// What the selection needs to know about the records in view.
#[derive(Debug, Clone, Copy)]
pub struct SelectionScope<'a> {
    known: &'a HashSet<String>,
    filtered: &'a [&'a str],
}

impl<'a> SelectionScope<'a> {
    /// `known` is every id in the raw collection, `filtered` the ids the
    /// pipeline currently produces.
    #[must_use]
    pub fn new(known: &'a HashSet<String>, filtered: &'a [&'a str]) -> Self {
        Self { known, filtered }
    }
}

#[derive(Debug, Default)]
pub struct SelectionState {
    inner: Observable<SelectionSet>,
}

impl SelectionState {
    #[must_use]
    pub fn new(initial: SelectionSet) -> Self {
        Self {
            inner: Observable::new(initial),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &Arc<SelectionSet> {
        self.inner.get()
    }

    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.inner.get().mode
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.inner.get().is_selected(id)
    }

    /// Flips one id. Unknown ids are ignored and `false` is returned.
    ///
    /// From all-filtered mode the current matches are materialized first, so
    /// "select all, then deselect one" leaves everything else selected.
    pub fn toggle(&mut self, id: &str, scope: SelectionScope<'_>) -> bool {
        if !scope.known.contains(id) {
            tracing::debug!(id, "ignoring selection toggle for unknown record id");
            return false;
        }
        self.inner.update(|set| {
            if set.mode == SelectionMode::AllFiltered {
                set.explicit = scope.filtered.iter().map(|s| (*s).to_owned()).collect();
                set.mode = SelectionMode::Explicit;
            }
            if !set.explicit.remove(id) {
                set.explicit.insert(id.to_owned());
            }
        })
    }

    /// Switches to live "everything matching the filter" selection.
    pub fn select_all_filtered(&mut self) -> bool {
        self.inner.update(|set| {
            set.explicit.clear();
            set.mode = SelectionMode::AllFiltered;
        })
    }

    /// Adds the given page's ids to the explicit set.
    ///
    /// A no-op in all-filtered mode, where those ids are already selected.
    pub fn select_page<'i, I>(&mut self, page_ids: I, scope: SelectionScope<'_>) -> bool
    where
        I: IntoIterator<Item = &'i str>,
    {
        if self.mode() == SelectionMode::AllFiltered {
            return false;
        }
        let ids: Vec<&str> = page_ids
            .into_iter()
            .filter(|id| scope.known.contains(*id))
            .collect();
        self.inner.update(|set| {
            set.explicit.extend(ids.into_iter().map(str::to_owned));
        })
    }

    pub fn clear(&mut self) -> bool {
        self.inner.update(|set| {
            set.explicit.clear();
            set.mode = SelectionMode::Explicit;
        })
    }

    /// Drops explicit ids missing from `known`, returning how many went.
    pub fn retain_known(&mut self, known: &HashSet<String>) -> usize {
        let stale = self
            .inner
            .get()
            .explicit
            .iter()
            .filter(|id| !known.contains(*id))
            .count();
        if stale > 0 {
            self.inner
                .update(|set| set.explicit.retain(|id| known.contains(id)));
        }
        stale
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Arc<SelectionSet>) + Send + 'static,
    {
        self.inner.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }
}
