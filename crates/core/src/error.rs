//! Error types for the Wayfarer domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each upstream boundary has its own error enum; the gateway maps them
//! to HTTP status codes in one place.

use thiserror::Error;

/// The top-level error type for Wayfarer operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Geocoding errors ---
    #[error("Geocoding error: {0}")]
    Geo(#[from] GeoError),

    // --- I/O (listener bind, serve) ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the LLM provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider")]
    RateLimited,

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures talking to the mapping provider.
///
/// `Unavailable` is a transport-level problem (non-200, network, garbage
/// body); `NotFound` means the payload arrived but lacked the fields we
/// need.
#[derive(Debug, Clone, Error)]
pub enum GeoError {
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    #[error("{0}")]
    NotFound(String),
}

/// The model's reply could not be coerced into a JSON object.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct RepairError {
    pub reason: String,
}
