//! Forward geocoding: convert a place name to coordinates.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::GeocoderConfig;
use crate::error::ForecastError;
use crate::model::Coordinates;

/// One geocoded candidate, reduced to what the gateway needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub coordinates: Coordinates,
    pub display_name: String,
    /// Compact "City, Province" label for forecast headers and export
    /// filenames.
    pub short_name: String,
}

// Nominatim serializes lat/lon as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: Option<String>,
    #[serde(default)]
    address: SearchAddress,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchAddress {
    city: Option<String>,
    town: Option<String>,
    municipality: Option<String>,
    village: Option<String>,
    province: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    http: Client,
    base_url: String,
    country_codes: String,
    timeout_secs: u64,
}

impl GeocodeClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, ForecastError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ForecastError::UpstreamUnreachable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country_codes: config.country_codes.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Resolve a place name to the best candidate within the configured
    /// country filter.
    pub async fn search(&self, name: &str) -> Result<GeocodedPlace, ForecastError> {
        let url = format!("{}/search", self.base_url);

        tracing::debug!(%url, name, "geocoding location name");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", name),
                ("format", "json"),
                ("limit", "1"),
                ("countrycodes", self.country_codes.as_str()),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::from_reqwest(e, self.timeout_secs))?;

        let status = res.status();
        if !status.is_success() {
            return Err(ForecastError::UpstreamError(format!(
                "geocoder returned {status}"
            )));
        }

        let hits: Vec<SearchHit> = res
            .json()
            .await
            .map_err(|e| ForecastError::MalformedUpstream(e.to_string()))?;

        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::LocationNotFound(name.to_string()))?;

        let latitude: f64 = hit.lat.parse().map_err(|_| {
            ForecastError::MalformedUpstream(format!("geocoder lat \"{}\" is not numeric", hit.lat))
        })?;
        let longitude: f64 = hit.lon.parse().map_err(|_| {
            ForecastError::MalformedUpstream(format!("geocoder lon \"{}\" is not numeric", hit.lon))
        })?;

        let coordinates = Coordinates::new(latitude, longitude)?;
        let display_name = hit.display_name.unwrap_or_else(|| name.to_string());
        let short_name = short_name(&hit.address).unwrap_or_else(|| display_name.clone());

        tracing::info!(name, %short_name, "geocoded location");

        Ok(GeocodedPlace {
            coordinates,
            display_name,
            short_name,
        })
    }
}

// Prefer city > town > municipality > village for the primary place name,
// suffixed with the province when it differs.
fn short_name(address: &SearchAddress) -> Option<String> {
    let place = address
        .city
        .clone()
        .or_else(|| address.town.clone())
        .or_else(|| address.municipality.clone())
        .or_else(|| address.village.clone())?;

    let province = address
        .province
        .as_ref()
        .or(address.state.as_ref())
        .filter(|p| !p.is_empty() && p.as_str() != place);

    Some(match province {
        Some(p) => format!("{place}, {p}"),
        None => place,
    })
}
