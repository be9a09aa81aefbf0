//! Shared domain types for bizmap: business records, coordinates and the
//! great-circle math used by distance filtering, plus environment config.

pub mod app_config;
pub mod config;
pub mod error;
pub mod geo;
pub mod records;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use geo::{distance_km, Coordinates, EARTH_RADIUS_KM};
pub use records::{
    normalize_record, normalize_records, Address, BusinessRecord, RawAddress, RawBusinessRecord,
    RawCoordinate, RawScalar,
};
