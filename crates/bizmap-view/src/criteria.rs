use std::collections::BTreeSet;

use bizmap_core::Coordinates;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Column to sort by plus direction.
///
/// `field` stays a free-form string: the table header hands over whatever
/// column key was clicked, and unknown keys simply leave the order alone
/// (see [`crate::sort::SortKey::parse`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub field: String,
    pub direction: SortDirection,
}

impl SortDescriptor {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Parses `field` or `field:asc|desc`; a missing direction means ascending.
    ///
    /// # Errors
    ///
    /// Returns a message when the direction part is not `asc` or `desc`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.split_once(':') {
            Some((field, direction)) => Ok(Self::new(field.trim(), direction.parse()?)),
            None => Ok(Self::new(raw.trim(), SortDirection::Asc)),
        }
    }
}

impl Default for SortDescriptor {
    fn default() -> Self {
        Self::new("name", SortDirection::Asc)
    }
}

/// Snapshot of every active filter. The pipeline is a pure function of
/// `(records, FilterCriteria)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against the record name.
    pub search_term: String,
    /// Empty means no industry restriction.
    pub selected_industries: BTreeSet<String>,
    pub user_location: Option<Coordinates>,
    /// Only applied when `user_location` is also set.
    pub distance_limit_km: Option<f64>,
    pub sort: SortDescriptor,
}

impl FilterCriteria {
    /// Origin and radius when both halves of the distance filter are set.
    #[must_use]
    pub fn distance_filter(&self) -> Option<(Coordinates, f64)> {
        self.user_location.zip(self.distance_limit_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_descriptor_parse_with_direction() {
        let d = SortDescriptor::parse("city:desc").unwrap();
        assert_eq!(d, SortDescriptor::new("city", SortDirection::Desc));
    }

    #[test]
    fn sort_descriptor_parse_defaults_to_ascending() {
        let d = SortDescriptor::parse("registeredAt").unwrap();
        assert_eq!(d.direction, SortDirection::Asc);
        assert_eq!(d.field, "registeredAt");
    }

    #[test]
    fn sort_descriptor_parse_rejects_bad_direction() {
        assert!(SortDescriptor::parse("name:sideways").is_err());
    }

    #[test]
    fn distance_filter_requires_both_halves() {
        let mut c = FilterCriteria {
            distance_limit_km: Some(10.0),
            ..FilterCriteria::default()
        };
        assert!(c.distance_filter().is_none());
        c.user_location = Coordinates::new(60.0, 25.0);
        assert!(c.distance_filter().is_some());
    }

    #[test]
    fn criteria_round_trip_through_json_keeps_industries_sorted() {
        let mut c = FilterCriteria::default();
        c.selected_industries.insert("62".into());
        c.selected_industries.insert("47".into());
        let json = serde_json::to_string(&c).unwrap();
        let back: FilterCriteria = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert!(json.find("\"47\"").unwrap() < json.find("\"62\"").unwrap());
    }
}
