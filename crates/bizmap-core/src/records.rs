//! Business records as served by the directory API and as used by the view
//! engine.
//!
//! The `Raw*` types mirror the wire JSON, where coordinates may arrive as
//! numbers, numeric strings, empty strings or `null`. [`normalize_record`]
//! converts them once on ingest; everything downstream works with
//! [`BusinessRecord`] and never re-parses text.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::geo::{parse_degrees, Coordinates};

/// A coordinate value exactly as the API sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    fn degrees(&self) -> Option<f64> {
        match self {
            RawCoordinate::Number(n) => n.is_finite().then_some(*n),
            RawCoordinate::Text(s) => parse_degrees(s),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub building_number: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<RawCoordinate>,
    #[serde(default)]
    pub longitude: Option<RawCoordinate>,
}

/// An identifier or code that some feeds send as a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Text(String),
    Integer(i64),
}

impl RawScalar {
    fn into_text(self) -> String {
        match self {
            RawScalar::Text(s) => s,
            RawScalar::Integer(n) => n.to_string(),
        }
    }
}

/// One record as sent on the wire. Every field is optional so a record with
/// a `null` name or a missing id still deserializes; [`normalize_records`]
/// decides what to keep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBusinessRecord {
    #[serde(default)]
    pub id: Option<RawScalar>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub industry_code: Option<RawScalar>,
    #[serde(default)]
    pub industry_description: Option<String>,
    #[serde(default)]
    pub registered_at: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub address: Option<RawAddress>,
}

/// Postal address with coordinates already validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub building_number: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    /// `None` when either latitude or longitude was missing or unparsable.
    pub coordinates: Option<Coordinates>,
}

/// One discoverable business.
///
/// `id` is the only identity used for selection and table rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub id: String,
    pub name: String,
    pub industry_code: Option<String>,
    pub industry_description: Option<String>,
    pub registered_at: Option<NaiveDate>,
    pub active: bool,
    pub address: Option<Address>,
}

impl BusinessRecord {
    /// Minimal record with no industry, registration date or address.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            industry_code: None,
            industry_description: None,
            registered_at: None,
            active: true,
            address: None,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.address.as_ref().and_then(|a| a.coordinates)
    }

    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.address.as_ref().and_then(|a| a.city.as_deref())
    }
}

/// Converts one wire record into a [`BusinessRecord`].
///
/// Blank optional strings become `None`, a missing name becomes `""`, and
/// numeric ids or codes become their decimal text. Coordinates are kept only
/// when both halves parse into a valid pair.
#[must_use]
pub fn normalize_record(raw: RawBusinessRecord) -> BusinessRecord {
    let registered_at = raw.registered_at.as_deref().and_then(parse_registration_date);

    BusinessRecord {
        id: raw
            .id
            .map(RawScalar::into_text)
            .map(|id| id.trim().to_owned())
            .unwrap_or_default(),
        name: raw.name.as_deref().map(str::trim).unwrap_or_default().to_owned(),
        industry_code: non_blank(raw.industry_code.map(RawScalar::into_text)),
        industry_description: non_blank(raw.industry_description),
        registered_at,
        active: raw.active.unwrap_or(false),
        address: raw.address.map(normalize_address),
    }
}

/// Normalizes a batch, keeping the first record for each `id`.
#[must_use]
pub fn normalize_records(raws: Vec<RawBusinessRecord>) -> Vec<BusinessRecord> {
    let mut seen = HashSet::with_capacity(raws.len());
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        let record = normalize_record(raw);
        if record.id.is_empty() {
            tracing::debug!(name = %record.name, "dropping record without id");
            continue;
        }
        if !seen.insert(record.id.clone()) {
            tracing::debug!(id = %record.id, "dropping duplicate record id");
            continue;
        }
        out.push(record);
    }
    out
}

fn normalize_address(raw: RawAddress) -> Address {
    let coordinates = match (&raw.latitude, &raw.longitude) {
        (Some(lat), Some(lon)) => lat
            .degrees()
            .zip(lon.degrees())
            .and_then(|(lat, lon)| Coordinates::new(lat, lon)),
        _ => None,
    };

    Address {
        street: non_blank(raw.street),
        building_number: non_blank(raw.building_number),
        postal_code: non_blank(raw.postal_code),
        city: non_blank(raw.city),
        coordinates,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_registration_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
