//! Client for the external weather-prediction backend.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use futures::future;
use reqwest::Client;

use crate::config::BackendConfig;
use crate::error::ForecastError;
use crate::model::{BackendEnvelope, BackendStatus, Coordinates, ForecastQuery, HourSelection};

/// Abstraction over the prediction backend, so the gateway can be driven
/// against a stub in tests.
#[async_trait]
pub trait ForecastBackend: Send + Sync + Debug {
    /// Fetch the raw forecast envelope for a validated query. One logical
    /// upstream lookup per call; no retry, no backoff.
    async fn fetch_forecast(&self, query: &ForecastQuery) -> Result<BackendEnvelope, ForecastError>;
}

#[derive(Debug, Clone)]
pub struct HttpForecastBackend {
    base_url: String,
    timeout_secs: u64,
    hourly_fan_out: bool,
    http: Client,
}

impl HttpForecastBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, ForecastError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ForecastError::UpstreamUnreachable(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            hourly_fan_out: config.hourly_fan_out,
            http,
        })
    }

    async fn fetch_once(
        &self,
        coordinates: Coordinates,
        target_date: chrono::NaiveDate,
        target_hour: &str,
    ) -> Result<BackendEnvelope, ForecastError> {
        let url = format!("{}/api/weather", self.base_url);

        tracing::debug!(%url, %target_date, target_hour, "querying forecast backend");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("target_date", target_date.format("%Y-%m-%d").to_string()),
                ("target_hour", target_hour.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::from_reqwest(e, self.timeout_secs))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ForecastError::from_reqwest(e, self.timeout_secs))?;

        if !status.is_success() {
            return Err(ForecastError::UpstreamError(format!(
                "backend returned {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ForecastError::MalformedUpstream(format!(
                "{e} in body {}",
                truncate_body(&body)
            ))
        })
    }

    /// Fan-out mode for backend variants that reject `target_hour=all`:
    /// one request per hour, issued concurrently, assembled in hour order.
    /// Any failed hour fails the whole batch; there is no partial-result
    /// salvage.
    async fn fetch_fanned_out(
        &self,
        coordinates: Coordinates,
        target_date: chrono::NaiveDate,
    ) -> Result<BackendEnvelope, ForecastError> {
        let requests = (0..24).map(|hour: u8| {
            let hour_str = hour.to_string();
            async move { self.fetch_once(coordinates, target_date, &hour_str).await }
        });
        let envelopes: Vec<BackendEnvelope> = future::join_all(requests)
            .await
            .into_iter()
            .collect::<Result<_, _>>()?;

        let mut merged = BackendEnvelope {
            status: BackendStatus::Success,
            error: None,
            location: None,
            forecast: Vec::with_capacity(24),
        };
        for envelope in envelopes {
            match envelope.status {
                BackendStatus::Loading => return Err(ForecastError::UpstreamLoading),
                BackendStatus::Error => {
                    return Err(ForecastError::UpstreamError(
                        envelope
                            .error
                            .unwrap_or_else(|| "unspecified backend failure".to_string()),
                    ));
                }
                BackendStatus::Success => {}
            }
            if merged.location.is_none() {
                merged.location = envelope.location;
            }
            merged.forecast.extend(envelope.forecast);
        }
        Ok(merged)
    }
}

#[async_trait]
impl ForecastBackend for HttpForecastBackend {
    async fn fetch_forecast(&self, query: &ForecastQuery) -> Result<BackendEnvelope, ForecastError> {
        match query.target_hour {
            HourSelection::All if self.hourly_fan_out => {
                self.fetch_fanned_out(query.coordinates, query.target_date)
                    .await
            }
            selection => {
                self.fetch_once(query.coordinates, query.target_date, &selection.to_string())
                    .await
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query(hour: HourSelection) -> ForecastQuery {
        ForecastQuery {
            coordinates: Coordinates {
                latitude: 14.6,
                longitude: 121.0,
            },
            location_name: None,
            target_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            target_hour: hour,
        }
    }

    fn backend_for(server: &MockServer, timeout_secs: u64, fan_out: bool) -> HttpForecastBackend {
        HttpForecastBackend::new(&BackendConfig {
            base_url: server.uri(),
            timeout_secs,
            hourly_fan_out: fan_out,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn forwards_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("lat", "14.6"))
            .and(query_param("lon", "121"))
            .and(query_param("target_date", "2025-06-01"))
            .and(query_param("target_hour", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "forecast": [{"predicted_temp_c": 25.0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, 5, false);
        let envelope = backend.fetch_forecast(&query(HourSelection::All)).await.unwrap();
        assert_eq!(envelope.forecast.len(), 1);
    }

    #[tokio::test]
    async fn single_hour_is_sent_as_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("target_hour", "14"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "forecast": [{}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, 5, false);
        backend
            .fetch_forecast(&query(HourSelection::At(14)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn timeout_maps_to_upstream_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server, 1, false);
        let err = backend.fetch_forecast(&query(HourSelection::All)).await.unwrap_err();
        assert!(matches!(err, ForecastError::UpstreamTimeout(1)));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let backend = backend_for(&server, 5, false);
        let err = backend.fetch_forecast(&query(HourSelection::All)).await.unwrap_err();
        assert!(matches!(err, ForecastError::UpstreamError(msg) if msg.contains("boom")));
    }

    #[tokio::test]
    async fn undecodable_body_maps_to_malformed_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let backend = backend_for(&server, 5, false);
        let err = backend.fetch_forecast(&query(HourSelection::All)).await.unwrap_err();
        assert!(matches!(err, ForecastError::MalformedUpstream(_)));
    }

    #[tokio::test]
    async fn fan_out_assembles_hours_in_order() {
        let server = MockServer::start().await;
        for hour in 0..24u8 {
            Mock::given(method("GET"))
                .and(path("/api/weather"))
                .and(query_param("target_hour", hour.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "status": "success",
                    "forecast": [{"datetime": format!("2025-06-01 {hour:02}:00:00")}]
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let backend = backend_for(&server, 5, true);
        let envelope = backend.fetch_forecast(&query(HourSelection::All)).await.unwrap();
        assert_eq!(envelope.forecast.len(), 24);
        let datetimes: Vec<_> = envelope
            .forecast
            .iter()
            .map(|e| e.datetime.clone().unwrap())
            .collect();
        let mut sorted = datetimes.clone();
        sorted.sort();
        assert_eq!(datetimes, sorted);
    }
}
