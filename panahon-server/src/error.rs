use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use panahon_core::ForecastError;

/// Boundary error type: every failure becomes a `{ "error": ... }` JSON
/// body with the status the taxonomy prescribes. Nothing propagates to the
/// client as an unhandled fault.
pub enum ApiError {
    Forecast(ForecastError),
    Internal(String),
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        Self::Forecast(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Forecast(err) => match err {
                ForecastError::MissingParameter(_)
                | ForecastError::InvalidCoordinate(_)
                | ForecastError::InvalidParameter(_)
                | ForecastError::LocationNotFound(_) => StatusCode::BAD_REQUEST,
                ForecastError::UpstreamLoading => StatusCode::SERVICE_UNAVAILABLE,
                ForecastError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                ForecastError::UpstreamUnreachable(_)
                | ForecastError::UpstreamError(_)
                | ForecastError::MalformedUpstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Forecast(err) => err.to_string(),
            Self::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!(%status, message, "request failed");
        } else {
            tracing::warn!(%status, message, "request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
