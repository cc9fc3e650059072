//! Shared-secret authentication for the chat façade.
//!
//! Callers send the secret in the `AI_BACKEND_KEY` header. A server with
//! no secret configured rejects everything (500) instead of letting
//! requests through.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::chat::SharedChatState;
use crate::error::ApiError;

/// Header carrying the backend shared secret.
pub const BACKEND_KEY_HEADER: &str = "ai_backend_key";

/// Compare the provided key against the configured one.
pub fn verify_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Err(ApiError::Misconfigured("AI_BACKEND_KEY is not set.".into()));
    };

    match provided {
        Some(key) if key == expected => Ok(()),
        _ => Err(ApiError::Forbidden),
    }
}

/// Middleware guarding the chat routes.
pub async fn require_backend_key(
    State(state): State<SharedChatState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(BACKEND_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    verify_key(state.backend_key.as_deref(), provided)?;
    Ok(next.run(req).await)
}
