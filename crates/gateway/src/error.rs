//! API error type mapping to HTTP status codes.
//!
//! Every failure the façades produce goes through [`ApiError`], which
//! renders as `{"detail": "..."}` with the matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use wayfarer_core::error::{GeoError, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server is missing a secret it needs to authenticate callers.
    #[error("Server misconfiguration: {0}")]
    Misconfigured(String),

    #[error("Forbidden: invalid key")]
    Forbidden,

    /// The LLM call itself failed.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The model reply could not be turned into the expected object.
    #[error("Convert to JSON error: {0}")]
    Conversion(String),

    /// A mapping provider answered with a non-200 or unusable body.
    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Misconfigured(_) | Self::Generation(_) | Self::Conversion(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        ApiError::Generation(e.to_string())
    }
}

impl From<GeoError> for ApiError {
    fn from(e: GeoError) -> Self {
        match e {
            GeoError::Unavailable { service, .. } => {
                ApiError::UpstreamUnavailable(format!("{service} unavailable"))
            }
            GeoError::NotFound(detail) => ApiError::NotFound(detail),
        }
    }
}

/// Error body, shaped like the clients already expect.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), detail = %detail, "Request failed");
        } else {
            warn!(status = status.as_u16(), detail = %detail, "Request rejected");
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
