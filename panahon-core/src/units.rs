//! Unit normalization for upstream payloads that disagree about units.

const KELVIN_OFFSET: f64 = 273.15;

/// Above this magnitude a temperature is assumed to be Kelvin. Pure
/// heuristic, not a guarantee: backend versions have shipped both units
/// under the same field name, and no schema pins it down. Kept as a single
/// named policy so it can be deleted once the upstream standardizes.
const KELVIN_DETECTION_THRESHOLD: f64 = 100.0;

pub fn kelvin_to_celsius(value: f64) -> f64 {
    value - KELVIN_OFFSET
}

/// Apply the Kelvin-magnitude heuristic: convert values that look like
/// Kelvin, pass plausible Celsius through unchanged.
pub fn normalize_temperature(value: f64) -> f64 {
    if value > KELVIN_DETECTION_THRESHOLD {
        kelvin_to_celsius(value)
    } else {
        value
    }
}

/// Wind speed magnitude from orthogonal u/v components, for backend
/// variants that never computed the scalar.
pub fn wind_speed_from_components(u: f64, v: f64) -> f64 {
    u.hypot(v)
}

/// Probability fields arrive either as a 0-1 fraction or as an already
/// scaled percentage; normalize both to a whole percentage.
pub fn probability_to_percent(value: f64) -> f64 {
    if value <= 1.0 {
        (value * 100.0).round()
    } else {
        value.round()
    }
}

/// Rough millimetres-to-chance mapping, used only when the payload carries
/// no probability field at all. An approximation, not a physical model.
pub fn precip_mm_to_chance_percent(mm: f64) -> f64 {
    if mm <= 0.0 {
        0.0
    } else if mm < 1.0 {
        20.0
    } else if mm < 5.0 {
        50.0
    } else if mm < 15.0 {
        80.0
    } else {
        95.0
    }
}
