//! Field resolution and comparison for sorting records.
//!
//! Scalar fields compare by their declared type, address sub-fields resolve
//! through `address` with an empty-string default, and coordinates compare as
//! floats so `9.5` sorts before `10.1`. Text uses Unicode collation (CLDR
//! root order) on lower-cased values, so `Éclair` sorts among the `E`s and
//! names differing only in case compare equal. Callers sort with the standard
//! stable sort, so equal keys keep their incoming order.

use std::cmp::Ordering;

use bizmap_core::BusinessRecord;
use feruca::Collator;

use crate::criteria::{SortDescriptor, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    IndustryCode,
    IndustryDescription,
    RegisteredAt,
    Active,
    Street,
    BuildingNumber,
    PostalCode,
    City,
    Latitude,
    Longitude,
}

impl SortKey {
    /// Resolves a column key as sent by the table header.
    ///
    /// Returns `None` for anything unrecognised; callers treat that as
    /// "keep current order".
    #[must_use]
    pub fn parse(field: &str) -> Option<Self> {
        let key = match field.trim() {
            "id" | "businessId" => SortKey::Id,
            "name" => SortKey::Name,
            "industryCode" | "industry" => SortKey::IndustryCode,
            "industryDescription" => SortKey::IndustryDescription,
            "registeredAt" | "registrationDate" => SortKey::RegisteredAt,
            "active" | "status" => SortKey::Active,
            "street" => SortKey::Street,
            "buildingNumber" => SortKey::BuildingNumber,
            "postalCode" => SortKey::PostalCode,
            "city" => SortKey::City,
            "latitude" => SortKey::Latitude,
            "longitude" => SortKey::Longitude,
            _ => return None,
        };
        Some(key)
    }
}

/// Comparator for one [`SortDescriptor`], holding the text collator.
pub struct RecordComparator {
    key: SortKey,
    direction: SortDirection,
    collator: Collator,
}

impl std::fmt::Debug for RecordComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordComparator")
            .field("key", &self.key)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

impl RecordComparator {
    /// Returns `None` (and logs at debug) when the field is unknown, meaning
    /// the caller should keep the current order.
    #[must_use]
    pub fn for_descriptor(descriptor: &SortDescriptor) -> Option<Self> {
        let Some(key) = SortKey::parse(&descriptor.field) else {
            tracing::debug!(field = %descriptor.field, "unknown sort field, keeping current order");
            return None;
        };
        Some(Self {
            key,
            direction: descriptor.direction,
            collator: Collator::default(),
        })
    }

    #[must_use]
    pub fn key(&self) -> SortKey {
        self.key
    }

    /// Orders `a` and `b` by the key, reversed for descending sorts.
    pub fn compare(&mut self, a: &BusinessRecord, b: &BusinessRecord) -> Ordering {
        let ordering = self.compare_ascending(a, b);
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    fn compare_ascending(&mut self, a: &BusinessRecord, b: &BusinessRecord) -> Ordering {
        match self.key {
            SortKey::Id => self.compare_text(&a.id, &b.id),
            SortKey::Name => self.compare_text(&a.name, &b.name),
            SortKey::IndustryCode => self.compare_text(
                a.industry_code.as_deref().unwrap_or_default(),
                b.industry_code.as_deref().unwrap_or_default(),
            ),
            SortKey::IndustryDescription => self.compare_text(
                a.industry_description.as_deref().unwrap_or_default(),
                b.industry_description.as_deref().unwrap_or_default(),
            ),
            SortKey::RegisteredAt => a.registered_at.cmp(&b.registered_at),
            SortKey::Active => a.active.cmp(&b.active),
            key @ (SortKey::Street
            | SortKey::BuildingNumber
            | SortKey::PostalCode
            | SortKey::City) => self.compare_text(address_text(a, key), address_text(b, key)),
            SortKey::Latitude => compare_degrees(
                a.coordinates().map(|c| c.latitude),
                b.coordinates().map(|c| c.latitude),
            ),
            SortKey::Longitude => compare_degrees(
                a.coordinates().map(|c| c.longitude),
                b.coordinates().map(|c| c.longitude),
            ),
        }
    }

    /// Case-insensitive collation. Lower-casing first makes case-only
    /// differences compare `Equal`, so the stable sort keeps their order.
    fn compare_text(&mut self, a: &str, b: &str) -> Ordering {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        if a == b {
            return Ordering::Equal;
        }
        self.collator.collate(a.as_str(), b.as_str())
    }
}

fn address_text(record: &BusinessRecord, key: SortKey) -> &str {
    let Some(address) = record.address.as_ref() else {
        return "";
    };
    let value = match key {
        SortKey::Street => &address.street,
        SortKey::BuildingNumber => &address.building_number,
        SortKey::PostalCode => &address.postal_code,
        SortKey::City => &address.city,
        _ => return "",
    };
    value.as_deref().unwrap_or_default()
}

/// Missing coordinates sort before any real value.
fn compare_degrees(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use bizmap_core::{Address, Coordinates};

    use super::*;

    fn located(id: &str, lat: f64) -> BusinessRecord {
        let mut r = BusinessRecord::new(id, id);
        r.address = Some(Address {
            coordinates: Coordinates::new(lat, 25.0),
            ..Address::default()
        });
        r
    }

    fn in_city(id: &str, city: Option<&str>) -> BusinessRecord {
        let mut r = BusinessRecord::new(id, id);
        r.address = city.map(|c| Address {
            city: Some(c.to_owned()),
            ..Address::default()
        });
        r
    }

    fn ids(records: &[BusinessRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn sorted(
        mut records: Vec<BusinessRecord>,
        field: &str,
        direction: SortDirection,
    ) -> Vec<BusinessRecord> {
        let descriptor = SortDescriptor::new(field, direction);
        if let Some(mut cmp) = RecordComparator::for_descriptor(&descriptor) {
            records.sort_by(|a, b| cmp.compare(a, b));
        }
        records
    }

    fn names(records: &[BusinessRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn parse_known_and_unknown_fields() {
        assert_eq!(SortKey::parse("postalCode"), Some(SortKey::PostalCode));
        assert_eq!(SortKey::parse("latitude"), Some(SortKey::Latitude));
        assert_eq!(SortKey::parse("revenue"), None);
    }

    #[test]
    fn coordinates_sort_numerically() {
        let records = vec![located("ten", 10.0), located("nine", 9.0), located("hundred", 60.0)];
        let records = sorted(records, "latitude", SortDirection::Asc);
        assert_eq!(ids(&records), ["nine", "ten", "hundred"]);
    }

    #[test]
    fn missing_address_sorts_as_empty_city() {
        let records = vec![
            in_city("a", Some("Turku")),
            in_city("b", None),
            in_city("c", Some("Espoo")),
        ];
        let records = sorted(records, "city", SortDirection::Asc);
        assert_eq!(ids(&records), ["b", "c", "a"]);
    }

    #[test]
    fn descending_keeps_ties_in_original_order() {
        let records = vec![
            in_city("first", Some("Oulu")),
            in_city("x", Some("Vaasa")),
            in_city("second", Some("oulu")),
        ];
        let records = sorted(records, "city", SortDirection::Desc);
        assert_eq!(ids(&records), ["x", "first", "second"]);
    }

    #[test]
    fn unknown_field_has_no_comparator() {
        let descriptor = SortDescriptor::new("revenue", SortDirection::Asc);
        assert!(RecordComparator::for_descriptor(&descriptor).is_none());
        let records = vec![in_city("b", None), in_city("a", None)];
        let records = sorted(records, "revenue", SortDirection::Asc);
        assert_eq!(ids(&records), ["b", "a"]);
    }

    #[test]
    fn name_comparison_ignores_case() {
        let descriptor = SortDescriptor::new("name", SortDirection::Asc);
        let mut cmp = RecordComparator::for_descriptor(&descriptor).expect("name is a known field");
        assert_eq!(cmp.compare_text("acme", "ACME"), Ordering::Equal);
        assert_eq!(cmp.compare_text("beta", "Acme"), Ordering::Greater);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let records = ["Zeta Oy", "Éclair Oy", "Fazer Oy", "Eagle Oy"]
            .into_iter()
            .map(|n| BusinessRecord::new(n, n))
            .collect();
        let records = sorted(records, "name", SortDirection::Asc);
        assert_eq!(names(&records), ["Eagle Oy", "Éclair Oy", "Fazer Oy", "Zeta Oy"]);
    }

    #[test]
    fn nordic_letters_do_not_sort_after_z() {
        let records = ["Zeta Oy", "Öljy Oy", "Ääni Oy", "Bravo Oy"]
            .into_iter()
            .map(|n| BusinessRecord::new(n, n))
            .collect();
        let records = sorted(records, "name", SortDirection::Asc);
        assert_eq!(names(&records), ["Ääni Oy", "Bravo Oy", "Öljy Oy", "Zeta Oy"]);
    }

    #[test]
    fn registered_at_missing_sorts_first() {
        let mut dated = BusinessRecord::new("dated", "dated");
        dated.registered_at = chrono::NaiveDate::from_ymd_opt(2020, 1, 1);
        let undated = BusinessRecord::new("undated", "undated");
        let records = sorted(vec![dated, undated], "registeredAt", SortDirection::Asc);
        assert_eq!(ids(&records), ["undated", "dated"]);
    }
}
