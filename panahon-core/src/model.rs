use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Validated geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ForecastError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ForecastError::InvalidCoordinate(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ForecastError::InvalidCoordinate(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// The hour portion of a forecast query: a single local hour, or the
/// `"all"` sentinel meaning "every available hour of the day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HourSelection {
    #[default]
    All,
    At(u8),
}

impl fmt::Display for HourSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::At(h) => write!(f, "{h}"),
        }
    }
}

impl FromStr for HourSelection {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match s.trim().parse::<u8>() {
            Ok(h) if h <= 23 => Ok(Self::At(h)),
            _ => Err(ForecastError::InvalidParameter(format!(
                "target_hour must be \"all\" or an hour between 0 and 23, got \"{s}\""
            ))),
        }
    }
}

/// A fully validated inbound forecast query, ready for the backend client.
#[derive(Debug, Clone)]
pub struct ForecastQuery {
    pub coordinates: Coordinates,
    /// Human-readable place name, when the query came in by name and was
    /// geocoded. Absent for raw coordinate queries.
    pub location_name: Option<String>,
    pub target_date: NaiveDate,
    pub target_hour: HourSelection,
}

/// One qualitative band of an upstream risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCategory {
    pub category: String,
    pub severity: f64,
    pub safe: bool,
}

impl RiskCategory {
    fn unknown() -> Self {
        Self {
            category: "Unknown".to_string(),
            severity: 0.0,
            safe: true,
        }
    }
}

/// The upstream backend's risk assessment, passed through verbatim. The
/// normalizer never derives these bands from raw predictions itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub wind: RiskCategory,
    pub precipitation: RiskCategory,
    pub temperature: RiskCategory,
    pub humidity: RiskCategory,
    pub overall_risk: f64,
    pub safe_for_outdoors: bool,
    pub recommendation: String,
}

impl RiskAssessment {
    /// Placeholder emitted when the upstream omits its assessment block,
    /// so the canonical record never has missing fields.
    pub fn unknown() -> Self {
        Self {
            wind: RiskCategory::unknown(),
            precipitation: RiskCategory::unknown(),
            temperature: RiskCategory::unknown(),
            humidity: RiskCategory::unknown(),
            overall_risk: 0.0,
            safe_for_outdoors: true,
            recommendation: "No data available".to_string(),
        }
    }
}

/// One forecast entry as the backend sends it. No field is guaranteed;
/// backend versions have shipped wind as a scalar or as u/v components,
/// rain as millimetres or as several differently named probability fields,
/// and temperature in Celsius or Kelvin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawForecastEntry {
    pub datetime: Option<String>,
    pub timestamp: Option<i64>,
    pub predicted_wind_speed: Option<f64>,
    pub predicted_wind_u: Option<f64>,
    pub predicted_wind_v: Option<f64>,
    pub predicted_precip_mm: Option<f64>,
    pub chance_of_rain: Option<f64>,
    pub precip_chance: Option<f64>,
    pub precip_probability: Option<f64>,
    pub precip_prob: Option<f64>,
    pub predicted_temp_c: Option<f64>,
    pub predicted_humidity: Option<f64>,
    pub assessment: Option<RiskAssessment>,
}

/// Top-level backend response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendEnvelope {
    pub status: BackendStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub location: Option<BackendLocation>,
    #[serde(default)]
    pub forecast: Vec<RawForecastEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    Success,
    Loading,
    Error,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BackendLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub name: Option<String>,
}

/// Location block of a normalized forecast, always fully populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

/// Numeric predictions of a normalized forecast. Every field is always
/// present (defaulted to 0 when the upstream omits it) so the UI never has
/// to null-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub wind_speed_ms: f64,
    pub chance_of_rain: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precipitation_mm: Option<f64>,
    pub temperature_c: f64,
    pub humidity_percent: f64,
}

/// The canonical forecast record this crate guarantees to produce
/// regardless of which upstream shape was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    pub datetime: String,
    /// Local hour of the entry; attached for multi-hour series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u8>,
    pub location: LocationInfo,
    pub predictions: Predictions,
    pub assessment: RiskAssessment,
}

/// Multi-hour answer for a `target_hour = "all"` query. Entries keep the
/// backend's order; they are never re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecastSeries {
    pub location: LocationInfo,
    pub forecasts: Vec<NormalizedForecast>,
}

/// What the gateway returns: a bare forecast object for single-hour
/// queries, a `{ location, forecasts }` wrapper for series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedResponse {
    Single(NormalizedForecast),
    Series(NormalizedForecastSeries),
}

impl NormalizedResponse {
    pub fn location(&self) -> &LocationInfo {
        match self {
            Self::Single(forecast) => &forecast.location,
            Self::Series(series) => &series.location,
        }
    }
}
