//! Great-circle distance on a spherical Earth.
//!
//! Only [`Coordinates`] that passed validation reach [`distance_km`], so the
//! math never sees NaN, infinities or out-of-range degrees. Records whose
//! coordinates failed to parse carry `None` instead and are excluded by the
//! distance filter before any geometry runs.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds a coordinate pair, rejecting non-finite or out-of-range degrees.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Parses a pair of textual degrees such as `"60.1699"` / `"24,9384"`.
    ///
    /// Surrounding whitespace is ignored and a single decimal comma is
    /// accepted. Returns `None` when either half does not parse.
    #[must_use]
    pub fn parse_pair(latitude: &str, longitude: &str) -> Option<Self> {
        Self::new(parse_degrees(latitude)?, parse_degrees(longitude)?)
    }
}

/// Parses one textual degree value.
#[must_use]
pub fn parse_degrees(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1).parse::<f64>().ok()?
    } else {
        trimmed.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

/// Haversine distance between two points in kilometres.
#[must_use]
pub fn distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `h` a hair above 1.0 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * c
}
