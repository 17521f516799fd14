//! The proxy gateway: client-facing weather endpoints.
//!
//! Each inbound request is validated, optionally geocoded, forwarded to
//! the prediction backend once, and the raw payload piped through the
//! normalizer on its way back out. Handlers are stateless across requests.

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use panahon_core::normalize::normalize_envelope;
use panahon_core::{
    Config, Coordinates, ForecastBackend, ForecastError, ForecastQuery, GeocodeClient,
    HourSelection, HttpForecastBackend, LocationInfo, NormalizedResponse, export,
};

use crate::error::ApiError;

pub struct AppState {
    backend: HttpForecastBackend,
    geocoder: GeocodeClient,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ForecastError> {
        Ok(Self {
            backend: HttpForecastBackend::new(&config.backend)?,
            geocoder: GeocodeClient::new(&config.geocoder)?,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    // The dashboard is served from a different origin; the original
    // service allowed all of them.
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/weather", get(weather_get).post(weather_post))
        .route("/weather/export", get(weather_export))
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "Weather proxy is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Raw request fields before validation. Everything is a string so that a
/// bad number surfaces as our own 400, not a framework rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WeatherParams {
    lat: Option<String>,
    lon: Option<String>,
    city: Option<String>,
    target_date: Option<String>,
    target_hour: Option<String>,
}

/// Legacy single-shot query by coordinates. `target_date` defaults to the
/// current date here; the preferred POST form requires it.
async fn weather_get(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<NormalizedResponse>, ApiError> {
    let query = resolve_query(&state, params, false).await?;
    let response = run_query(&state, &query).await?;
    Ok(Json(response))
}

async fn weather_post(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<NormalizedResponse>, ApiError> {
    let params = WeatherParams {
        lat: field_as_string(&body, "lat"),
        lon: field_as_string(&body, "lon"),
        city: field_as_string(&body, "city"),
        target_date: field_as_string(&body, "target_date"),
        target_hour: field_as_string(&body, "target_hour"),
    };
    let query = resolve_query(&state, params, true).await?;
    let response = run_query(&state, &query).await?;
    Ok(Json(response))
}

/// Same query surface as the GET form, but the response carries a
/// deterministic attachment filename so the browser saves it as a file.
async fn weather_export(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<WeatherParams>,
) -> Result<Response, ApiError> {
    let query = resolve_query(&state, params, true).await?;
    let response = run_query(&state, &query).await?;

    let filename = export::export_filename(
        &response.location().name,
        query.target_date,
        query.target_hour,
    );
    let document = export::export_document(&response)
        .map_err(|e| ApiError::Internal(format!("could not serialize export document: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        document,
    )
        .into_response())
}

/// Validate raw fields into a [`ForecastQuery`], geocoding name-based
/// queries first.
async fn resolve_query(
    state: &AppState,
    params: WeatherParams,
    date_required: bool,
) -> Result<ForecastQuery, ForecastError> {
    let target_hour = match &params.target_hour {
        Some(raw) => raw.parse()?,
        None => HourSelection::All,
    };

    let target_date = match &params.target_date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ForecastError::InvalidParameter(format!(
                "target_date must use YYYY-MM-DD, got \"{raw}\""
            ))
        })?,
        None if date_required => {
            return Err(ForecastError::MissingParameter(
                "target_date is required".to_string(),
            ));
        }
        None => Utc::now().date_naive(),
    };

    let (coordinates, location_name) = match (&params.city, &params.lat, &params.lon) {
        (Some(city), _, _) if !city.trim().is_empty() => {
            let place = state.geocoder.search(city.trim()).await?;
            (place.coordinates, Some(place.short_name))
        }
        (_, Some(lat), Some(lon)) => {
            let latitude = parse_coordinate(lat, "lat")?;
            let longitude = parse_coordinate(lon, "lon")?;
            (Coordinates::new(latitude, longitude)?, None)
        }
        _ => {
            return Err(ForecastError::MissingParameter(
                "provide lat and lon, or a city name".to_string(),
            ));
        }
    };

    Ok(ForecastQuery {
        coordinates,
        location_name,
        target_date,
        target_hour,
    })
}

async fn run_query(
    state: &AppState,
    query: &ForecastQuery,
) -> Result<NormalizedResponse, ForecastError> {
    tracing::info!(
        lat = query.coordinates.latitude,
        lon = query.coordinates.longitude,
        date = %query.target_date,
        hour = %query.target_hour,
        "forecast request"
    );

    let envelope = state.backend.fetch_forecast(query).await?;

    let fallback = LocationInfo {
        latitude: query.coordinates.latitude,
        longitude: query.coordinates.longitude,
        name: query.location_name.clone().unwrap_or_else(|| {
            format!(
                "{}, {}",
                query.coordinates.latitude, query.coordinates.longitude
            )
        }),
    };

    normalize_envelope(&envelope, &fallback)
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64, ForecastError> {
    raw.trim()
        .parse()
        .map_err(|_| ForecastError::InvalidCoordinate(format!("{field} \"{raw}\" is not numeric")))
}

fn field_as_string(body: &Value, key: &str) -> Option<String> {
    match body.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
