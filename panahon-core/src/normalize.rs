//! The forecast response normalization layer.
//!
//! Upstream payloads vary across backend versions: wind as a scalar or as
//! u/v components, rain as millimetres or one of several probability
//! fields, temperature in Celsius or Kelvin, assessments present or
//! absent. Everything funnels through here into one canonical record with
//! a fixed fallback chain per field, instead of per-route null-coalescing.

use chrono::{DateTime, NaiveDateTime, Timelike};

use crate::error::ForecastError;
use crate::model::{
    BackendEnvelope, BackendLocation, BackendStatus, LocationInfo, NormalizedForecast,
    NormalizedForecastSeries, NormalizedResponse, Predictions, RawForecastEntry, RiskAssessment,
};
use crate::units;

/// Timestamp format the backend emits for entry datetimes.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Normalize a backend envelope into the canonical response shape.
///
/// A single forecast entry becomes a bare [`NormalizedForecast`]; several
/// become a [`NormalizedForecastSeries`] in backend order. `fallback`
/// supplies the location block when the upstream omits (parts of) its own.
///
/// "loading" and "error" envelopes are not normalized; they surface as
/// [`ForecastError::UpstreamLoading`] / [`ForecastError::UpstreamError`].
pub fn normalize_envelope(
    envelope: &BackendEnvelope,
    fallback: &LocationInfo,
) -> Result<NormalizedResponse, ForecastError> {
    match envelope.status {
        BackendStatus::Loading => return Err(ForecastError::UpstreamLoading),
        BackendStatus::Error => {
            return Err(ForecastError::UpstreamError(
                envelope
                    .error
                    .clone()
                    .unwrap_or_else(|| "unspecified backend failure".to_string()),
            ));
        }
        BackendStatus::Success => {}
    }

    let location = resolve_location(envelope.location.as_ref(), fallback);

    match envelope.forecast.as_slice() {
        [] => Err(ForecastError::UpstreamError(
            "No forecast available".to_string(),
        )),
        [entry] => Ok(NormalizedResponse::Single(normalize_entry(
            entry, &location, false,
        ))),
        entries => Ok(NormalizedResponse::Series(NormalizedForecastSeries {
            location: location.clone(),
            forecasts: entries
                .iter()
                .map(|entry| normalize_entry(entry, &location, true))
                .collect(),
        })),
    }
}

/// Normalize one raw entry. Every output field is populated; upstream
/// omissions are defaulted rather than surfaced, so the record is always
/// renderable.
pub fn normalize_entry(
    entry: &RawForecastEntry,
    location: &LocationInfo,
    with_hour: bool,
) -> NormalizedForecast {
    let wind_speed_ms = entry
        .predicted_wind_speed
        .or_else(|| match (entry.predicted_wind_u, entry.predicted_wind_v) {
            (Some(u), Some(v)) => Some(units::wind_speed_from_components(u, v)),
            _ => None,
        })
        .unwrap_or(0.0)
        .max(0.0);

    // Explicit probability fields win over the mm-derived approximation,
    // in this exact order.
    let chance_of_rain = entry
        .chance_of_rain
        .or(entry.precip_chance)
        .or(entry.precip_probability)
        .or(entry.precip_prob)
        .map(units::probability_to_percent)
        .or_else(|| {
            entry
                .predicted_precip_mm
                .map(units::precip_mm_to_chance_percent)
        })
        .unwrap_or(0.0);

    let precipitation_mm = entry.predicted_precip_mm.map(|mm| mm.max(0.0));

    let temperature_c = entry
        .predicted_temp_c
        .map(units::normalize_temperature)
        .unwrap_or(0.0);

    let humidity_percent = entry.predicted_humidity.unwrap_or(0.0).clamp(0.0, 100.0);

    let (datetime, hour) = resolve_timestamp(entry);

    NormalizedForecast {
        datetime,
        hour: if with_hour { hour } else { None },
        location: location.clone(),
        predictions: Predictions {
            wind_speed_ms,
            chance_of_rain,
            precipitation_mm,
            temperature_c,
            humidity_percent,
        },
        assessment: entry
            .assessment
            .clone()
            .unwrap_or_else(RiskAssessment::unknown),
    }
}

fn resolve_location(upstream: Option<&BackendLocation>, fallback: &LocationInfo) -> LocationInfo {
    let Some(loc) = upstream else {
        return fallback.clone();
    };
    LocationInfo {
        latitude: loc.latitude.unwrap_or(fallback.latitude),
        longitude: loc.longitude.unwrap_or(fallback.longitude),
        name: loc.name.clone().unwrap_or_else(|| fallback.name.clone()),
    }
}

/// Resolve an entry's display datetime and its local hour. Prefers the
/// formatted `datetime` string; falls back to the unix `timestamp`.
fn resolve_timestamp(entry: &RawForecastEntry) -> (String, Option<u8>) {
    if let Some(raw) = &entry.datetime
        && let Ok(parsed) = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
    {
        return (raw.clone(), Some(parsed.hour() as u8));
    }
    if let Some(dt) = entry.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)) {
        return (
            dt.format(DATETIME_FORMAT).to_string(),
            Some(dt.hour() as u8),
        );
    }
    (entry.datetime.clone().unwrap_or_default(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RiskAssessment, RiskCategory};

    fn manila() -> LocationInfo {
        LocationInfo {
            latitude: 14.6,
            longitude: 121.0,
            name: "14.6, 121".to_string(),
        }
    }

    fn envelope(entries: Vec<RawForecastEntry>) -> BackendEnvelope {
        BackendEnvelope {
            status: BackendStatus::Success,
            error: None,
            location: None,
            forecast: entries,
        }
    }

    fn entry_at(hour: u8) -> RawForecastEntry {
        RawForecastEntry {
            datetime: Some(format!("2025-06-01 {hour:02}:00:00")),
            timestamp: None,
            ..Default::default()
        }
    }

    #[test]
    fn single_entry_normalizes_to_single_record() {
        let result = normalize_envelope(&envelope(vec![entry_at(8)]), &manila()).unwrap();
        assert!(matches!(result, NormalizedResponse::Single(_)));
    }

    #[test]
    fn many_entries_normalize_to_series_in_backend_order() {
        let entries: Vec<_> = (0..24).map(entry_at).collect();
        let result = normalize_envelope(&envelope(entries), &manila()).unwrap();
        let NormalizedResponse::Series(series) = result else {
            panic!("expected a series");
        };
        assert_eq!(series.forecasts.len(), 24);
        for (i, forecast) in series.forecasts.iter().enumerate() {
            assert_eq!(forecast.hour, Some(i as u8));
        }
    }

    #[test]
    fn scalar_wind_wins_over_components() {
        let entry = RawForecastEntry {
            predicted_wind_speed: Some(2.0),
            predicted_wind_u: Some(3.0),
            predicted_wind_v: Some(4.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert_eq!(forecast.predictions.wind_speed_ms, 2.0);
    }

    #[test]
    fn wind_derived_from_components_when_scalar_absent() {
        let entry = RawForecastEntry {
            predicted_wind_u: Some(3.0),
            predicted_wind_v: Some(4.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert_eq!(forecast.predictions.wind_speed_ms, 5.0);
    }

    #[test]
    fn wind_defaults_to_zero_with_one_component_missing() {
        let entry = RawForecastEntry {
            predicted_wind_u: Some(3.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert_eq!(forecast.predictions.wind_speed_ms, 0.0);
    }

    #[test]
    fn rain_chain_prefers_explicit_probability_over_mm() {
        let entry = RawForecastEntry {
            chance_of_rain: Some(0.65),
            precip_probability: Some(10.0),
            predicted_precip_mm: Some(20.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        // chance_of_rain is first in the chain and arrives as a fraction
        assert_eq!(forecast.predictions.chance_of_rain, 65.0);
    }

    #[test]
    fn rain_chain_walks_aliases_in_order() {
        let entry = RawForecastEntry {
            precip_prob: Some(40.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert_eq!(forecast.predictions.chance_of_rain, 40.0);

        let entry = RawForecastEntry {
            precip_chance: Some(55.0),
            precip_prob: Some(10.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert_eq!(forecast.predictions.chance_of_rain, 55.0);
    }

    #[test]
    fn rain_falls_back_to_mm_heuristic_then_zero() {
        let entry = RawForecastEntry {
            predicted_precip_mm: Some(3.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert_eq!(forecast.predictions.chance_of_rain, 50.0);
        assert_eq!(forecast.predictions.precipitation_mm, Some(3.0));

        let forecast = normalize_entry(&RawForecastEntry::default(), &manila(), false);
        assert_eq!(forecast.predictions.chance_of_rain, 0.0);
        assert_eq!(forecast.predictions.precipitation_mm, None);
    }

    #[test]
    fn kelvin_range_temperature_is_converted() {
        let entry = RawForecastEntry {
            predicted_temp_c: Some(300.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert!((forecast.predictions.temperature_c - 26.85).abs() < 1e-9);
    }

    #[test]
    fn humidity_is_clamped() {
        let entry = RawForecastEntry {
            predicted_humidity: Some(130.0),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert_eq!(forecast.predictions.humidity_percent, 100.0);
    }

    #[test]
    fn missing_assessment_synthesizes_unknown_default() {
        let forecast = normalize_entry(&RawForecastEntry::default(), &manila(), false);
        let assessment = forecast.assessment;
        assert_eq!(assessment.wind.category, "Unknown");
        assert_eq!(assessment.precipitation.category, "Unknown");
        assert_eq!(assessment.temperature.category, "Unknown");
        assert_eq!(assessment.humidity.category, "Unknown");
        assert_eq!(assessment.overall_risk, 0.0);
        assert!(assessment.safe_for_outdoors);
        assert_eq!(assessment.recommendation, "No data available");
    }

    #[test]
    fn upstream_assessment_passes_through_verbatim() {
        let upstream = RiskAssessment {
            wind: RiskCategory {
                category: "Very Windy".to_string(),
                severity: 0.9,
                safe: false,
            },
            precipitation: RiskCategory {
                category: "Dry".to_string(),
                severity: 0.0,
                safe: true,
            },
            temperature: RiskCategory {
                category: "Hot".to_string(),
                severity: 0.6,
                safe: false,
            },
            humidity: RiskCategory {
                category: "Humid".to_string(),
                severity: 0.4,
                safe: true,
            },
            overall_risk: 0.48,
            safe_for_outdoors: true,
            recommendation: "Proceed with caution.".to_string(),
        };
        let entry = RawForecastEntry {
            assessment: Some(upstream.clone()),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), false);
        assert_eq!(forecast.assessment, upstream);
    }

    #[test]
    fn hour_falls_back_to_unix_timestamp() {
        let entry = RawForecastEntry {
            // 2025-06-01 13:00:00 UTC
            timestamp: Some(1_748_782_800),
            ..Default::default()
        };
        let forecast = normalize_entry(&entry, &manila(), true);
        assert_eq!(forecast.hour, Some(13));
        assert_eq!(forecast.datetime, "2025-06-01 13:00:00");
    }

    #[test]
    fn loading_status_surfaces_unchanged() {
        let envelope = BackendEnvelope {
            status: BackendStatus::Loading,
            error: None,
            location: None,
            forecast: vec![],
        };
        let err = normalize_envelope(&envelope, &manila()).unwrap_err();
        assert!(matches!(err, ForecastError::UpstreamLoading));
    }

    #[test]
    fn error_status_carries_the_backend_message() {
        let envelope = BackendEnvelope {
            status: BackendStatus::Error,
            error: Some("model blew up".to_string()),
            location: None,
            forecast: vec![],
        };
        let err = normalize_envelope(&envelope, &manila()).unwrap_err();
        assert!(matches!(err, ForecastError::UpstreamError(msg) if msg == "model blew up"));
    }

    #[test]
    fn upstream_location_fills_gaps_from_fallback() {
        let envelope = BackendEnvelope {
            status: BackendStatus::Success,
            error: None,
            location: Some(BackendLocation {
                latitude: None,
                longitude: None,
                name: Some("Quezon City".to_string()),
            }),
            forecast: vec![entry_at(8)],
        };
        let result = normalize_envelope(&envelope, &manila()).unwrap();
        let location = result.location();
        assert_eq!(location.name, "Quezon City");
        assert_eq!(location.latitude, 14.6);
    }
}
