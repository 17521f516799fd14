//! Core library for the `panahon` weather-risk proxy.
//!
//! This crate defines:
//! - The canonical forecast model and the normalization rules that collapse
//!   heterogeneous backend payloads into it
//! - Severity and rain-chance classification for presentation
//! - Clients for the external prediction backend and geocoding service
//! - Configuration handling
//!
//! It is used by `panahon-server`, but can also be reused by other binaries
//! or services.

pub mod backend;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod geocode;
pub mod model;
pub mod normalize;
pub mod units;

pub use backend::{ForecastBackend, HttpForecastBackend};
pub use classify::{classify_rain_chance, classify_severity};
pub use config::{BackendConfig, Config, GeocoderConfig, ServerConfig};
pub use error::ForecastError;
pub use geocode::{GeocodeClient, GeocodedPlace};
pub use model::{
    BackendEnvelope, Coordinates, ForecastQuery, HourSelection, LocationInfo, NormalizedForecast,
    NormalizedForecastSeries, NormalizedResponse, RawForecastEntry, RiskAssessment, RiskCategory,
};
pub use normalize::normalize_envelope;
