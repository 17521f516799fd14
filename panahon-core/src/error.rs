use thiserror::Error;

/// Everything that can go wrong between an inbound query and a normalized
/// forecast. The gateway maps each variant to an HTTP status; nothing here
/// escapes as an unhandled fault.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Missing required parameters: {0}")]
    MissingParameter(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Request timeout: the forecast backend did not respond within {0} seconds")]
    UpstreamTimeout(u64),

    /// The backend's model is still warming up. Transient; the caller
    /// should retry later.
    #[error("Forecast model is still loading, try again shortly")]
    UpstreamLoading,

    #[error("Could not reach the forecast backend: {0}")]
    UpstreamUnreachable(String),

    #[error("Forecast backend reported an error: {0}")]
    UpstreamError(String),

    #[error("Malformed response from the forecast backend: {0}")]
    MalformedUpstream(String),
}

impl ForecastError {
    /// Classify a transport-level failure from an outbound call.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout(timeout_secs)
        } else if err.is_connect() {
            Self::UpstreamUnreachable(err.to_string())
        } else if err.is_decode() {
            Self::MalformedUpstream(err.to_string())
        } else {
            Self::UpstreamError(err.to_string())
        }
    }
}
