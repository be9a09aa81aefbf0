use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::observe::{Observable, SubscriptionId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Map,
    Split,
}

impl ViewMode {
    #[must_use]
    pub fn shows_table(self) -> bool {
        matches!(self, ViewMode::Table | ViewMode::Split)
    }

    #[must_use]
    pub fn shows_map(self) -> bool {
        matches!(self, ViewMode::Map | ViewMode::Split)
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(ViewMode::Table),
            "map" => Ok(ViewMode::Map),
            "split" => Ok(ViewMode::Split),
            other => Err(format!("unknown view mode '{other}'")),
        }
    }
}

/// Table columns in their canonical left-to-right order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKey {
    Name,
    BusinessId,
    Industry,
    RegisteredAt,
    Status,
    Street,
    PostalCode,
    City,
    Latitude,
    Longitude,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 10] = [
        ColumnKey::Name,
        ColumnKey::BusinessId,
        ColumnKey::Industry,
        ColumnKey::RegisteredAt,
        ColumnKey::Status,
        ColumnKey::Street,
        ColumnKey::PostalCode,
        ColumnKey::City,
        ColumnKey::Latitude,
        ColumnKey::Longitude,
    ];

    pub const DEFAULT_VISIBLE: [ColumnKey; 5] = [
        ColumnKey::Name,
        ColumnKey::BusinessId,
        ColumnKey::Industry,
        ColumnKey::City,
        ColumnKey::Status,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ColumnKey::Name => "Name",
            ColumnKey::BusinessId => "Business ID",
            ColumnKey::Industry => "Industry",
            ColumnKey::RegisteredAt => "Registered",
            ColumnKey::Status => "Status",
            ColumnKey::Street => "Street",
            ColumnKey::PostalCode => "Postal code",
            ColumnKey::City => "City",
            ColumnKey::Latitude => "Latitude",
            ColumnKey::Longitude => "Longitude",
        }
    }

    /// Field name understood by [`crate::SortKey::parse`].
    #[must_use]
    pub fn sort_field(self) -> &'static str {
        match self {
            ColumnKey::Name => "name",
            ColumnKey::BusinessId => "id",
            ColumnKey::Industry => "industryCode",
            ColumnKey::RegisteredAt => "registeredAt",
            ColumnKey::Status => "active",
            ColumnKey::Street => "street",
            ColumnKey::PostalCode => "postalCode",
            ColumnKey::City => "city",
            ColumnKey::Latitude => "latitude",
            ColumnKey::Longitude => "longitude",
        }
    }

    fn canonical_index(self) -> usize {
        Self::ALL
            .iter()
            .position(|c| *c == self)
            .unwrap_or(Self::ALL.len())
    }
}

impl std::str::FromStr for ColumnKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ColumnKey::ALL
            .into_iter()
            .find(|c| {
                c.sort_field().eq_ignore_ascii_case(wanted)
                    || format!("{c:?}").eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| format!("unknown column '{wanted}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    pub current_view: ViewMode,
    pub visible_columns: Vec<ColumnKey>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            current_view: ViewMode::default(),
            visible_columns: ColumnKey::DEFAULT_VISIBLE.to_vec(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewState {
    inner: Observable<ViewSettings>,
}

impl ViewState {
    #[must_use]
    pub fn new(initial: ViewSettings) -> Self {
        Self {
            inner: Observable::new(initial),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Arc<ViewSettings> {
        self.inner.get()
    }

    #[must_use]
    pub fn current_view(&self) -> ViewMode {
        self.inner.get().current_view
    }

    #[must_use]
    pub fn visible_columns(&self) -> &[ColumnKey] {
        &self.inner.get().visible_columns
    }

    pub fn set_view(&mut self, mode: ViewMode) -> bool {
        self.inner.update(|s| s.current_view = mode)
    }

    /// Hides a visible column or shows a hidden one.
    ///
    /// A column coming back is placed before the first visible column that
    /// follows it canonically; the others keep their order.
    pub fn toggle_column_visibility(&mut self, key: ColumnKey) -> bool {
        self.inner.update(|s| {
            if let Some(pos) = s.visible_columns.iter().position(|c| *c == key) {
                s.visible_columns.remove(pos);
                return;
            }
            let at = s
                .visible_columns
                .iter()
                .position(|c| c.canonical_index() > key.canonical_index())
                .unwrap_or(s.visible_columns.len());
            s.visible_columns.insert(at, key);
        })
    }

    pub fn reset_columns(&mut self) -> bool {
        self.inner
            .update(|s| s.visible_columns = ColumnKey::DEFAULT_VISIBLE.to_vec())
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Arc<ViewSettings>) + Send + 'static,
    {
        self.inner.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hiding_a_column_keeps_others_in_order() {
        let mut state = ViewState::default();
        state.toggle_column_visibility(ColumnKey::Industry);
        assert_eq!(
            state.visible_columns(),
            [ColumnKey::Name, ColumnKey::BusinessId, ColumnKey::City, ColumnKey::Status]
        );
    }

    #[test]
    fn showing_a_column_inserts_at_canonical_slot() {
        let mut state = ViewState::default();
        state.toggle_column_visibility(ColumnKey::RegisteredAt);
        assert_eq!(
            state.visible_columns(),
            [
                ColumnKey::Name,
                ColumnKey::BusinessId,
                ColumnKey::Industry,
                ColumnKey::RegisteredAt,
                ColumnKey::City,
                ColumnKey::Status,
            ]
        );
    }

    #[test]
    fn trailing_column_is_appended() {
        let mut state = ViewState::default();
        state.toggle_column_visibility(ColumnKey::Longitude);
        assert_eq!(state.visible_columns().last(), Some(&ColumnKey::Longitude));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut state = ViewState::default();
        state.toggle_column_visibility(ColumnKey::Name);
        state.toggle_column_visibility(ColumnKey::Street);
        assert!(state.reset_columns());
        assert_eq!(state.visible_columns(), ColumnKey::DEFAULT_VISIBLE);
        assert!(!state.reset_columns());
    }

    #[test]
    fn view_mode_parse_and_flags() {
        let split: ViewMode = "Split".parse().unwrap();
        assert!(split.shows_map() && split.shows_table());
        assert!(!ViewMode::Map.shows_table());
        assert!("grid".parse::<ViewMode>().is_err());
    }

    #[test]
    fn column_key_parses_sort_field_or_variant_name() {
        assert_eq!("postalCode".parse::<ColumnKey>(), Ok(ColumnKey::PostalCode));
        assert_eq!("businessid".parse::<ColumnKey>(), Ok(ColumnKey::BusinessId));
        assert!("revenue".parse::<ColumnKey>().is_err());
    }

    #[test]
    fn unsubscribed_listener_stops_hearing_changes() {
        use std::sync::{Arc, Mutex};

        let mut state = ViewState::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = state.subscribe(move |s| sink.lock().unwrap().push(s.current_view));

        state.set_view(ViewMode::Map);
        assert!(state.unsubscribe(id));
        state.set_view(ViewMode::Split);

        assert_eq!(*seen.lock().unwrap(), [ViewMode::Map]);
        assert!(!state.unsubscribe(id), "second removal is a no-op");
    }
}
