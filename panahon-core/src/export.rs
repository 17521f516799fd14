//! Downloadable forecast documents.
//!
//! The dashboard lets users save the currently displayed forecast as a
//! JSON file; the filename is derived deterministically from location,
//! date, and hour selection so repeated exports of the same view collide.

use chrono::NaiveDate;

use crate::model::{HourSelection, NormalizedResponse};

/// Filename for an exported forecast document, e.g.
/// `weather_quezon_city_2025-06-01_all.json`.
pub fn export_filename(location_name: &str, date: NaiveDate, hour: HourSelection) -> String {
    format!(
        "weather_{}_{}_{}.json",
        slugify(location_name),
        date.format("%Y-%m-%d"),
        hour
    )
}

/// Serialize a normalized response as a pretty-printed JSON document.
pub fn export_document(response: &NormalizedResponse) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(response)
}

// Lowercase alphanumerics; every other run of characters collapses to one
// underscore.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_separator = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator {
            slug.push('_');
            last_was_separator = true;
        }
    }
    slug.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn filename_is_deterministic() {
        let a = export_filename("Quezon City", june_first(), HourSelection::All);
        let b = export_filename("Quezon City", june_first(), HourSelection::All);
        assert_eq!(a, b);
        assert_eq!(a, "weather_quezon_city_2025-06-01_all.json");
    }

    #[test]
    fn filename_carries_the_selected_hour() {
        let name = export_filename("Cebu", june_first(), HourSelection::At(14));
        assert_eq!(name, "weather_cebu_2025-06-01_14.json");
    }

    #[test]
    fn coordinate_names_slugify_cleanly() {
        let name = export_filename("14.6, 121.0", june_first(), HourSelection::All);
        assert_eq!(name, "weather_14_6_121_0_2025-06-01_all.json");
    }
}
