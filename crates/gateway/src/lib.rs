//! HTTP façades for Wayfarer.
//!
//! Two independent services share this crate:
//!
//! - the **chat** façade ([`chat`]) in front of an OpenAI-compatible LLM
//! - the **maps** façade ([`maps`]) in front of Yandex Geocoder / Geosuggest
//!
//! Each is started by its own `start_*` function and shares no state with
//! the other. Built on Axum.

pub mod auth;
pub mod chat;
pub mod error;
pub mod maps;
mod prompts;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, Request, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use wayfarer_config::AppConfig;
use wayfarer_core::provider::Provider;
use wayfarer_providers::{OpenAiCompatProvider, YandexGeocoder, YandexSuggest};

use crate::chat::ChatState;
use crate::maps::MapsState;

/// Request bodies above this are rejected before reaching a handler.
const BODY_LIMIT: usize = 1024 * 1024;

/// Wrap a façade router with the layers both services share.
///
/// - Request body size limit (1 MB)
/// - CORS, only when `allowed_origins` is non-empty
/// - HTTP trace logging with a per-request id
pub fn with_common_layers(router: Router, allowed_origins: &[String]) -> Router {
    let router = router.layer(DefaultBodyLimit::max(BODY_LIMIT));

    let router = match cors_layer(allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(
        TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            let request_id = uuid::Uuid::new_v4();
            tracing::info_span!(
                "request",
                %request_id,
                method = %req.method(),
                uri = %req.uri()
            )
        }),
    )
}

fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                header::CONTENT_TYPE,
                HeaderName::from_static(auth::BACKEND_KEY_HEADER),
            ])
            .max_age(std::time::Duration::from_secs(3600)),
    )
}

/// Build the chat application (router plus layers) from config.
pub fn chat_app(config: &AppConfig) -> wayfarer_core::Result<Router> {
    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::from_config(&config.chat)?);

    if config.chat.backend_key.is_none() {
        warn!("AI_BACKEND_KEY is not set; every chat request will fail with 500");
    }

    let state = Arc::new(ChatState::from_config(provider, &config.chat));
    Ok(with_common_layers(
        chat::chat_router(state),
        &config.chat.allowed_origins,
    ))
}

/// Build the maps application (router plus layers) from config.
pub fn maps_app(config: &AppConfig) -> wayfarer_core::Result<Router> {
    let maps = &config.maps;

    if maps.geocoder_key.is_none() {
        warn!("GEOCODER_KEY is not set; geocoding requests will be rejected upstream");
    }
    if maps.geosuggest_key.is_none() {
        warn!("GEOSUGGEST_KEY is not set; address suggestions will be rejected upstream");
    }

    let state = Arc::new(MapsState {
        geocoder: Arc::new(YandexGeocoder::from_config(maps)?),
        suggester: Arc::new(YandexSuggest::from_config(maps)?),
        maps_key: maps.maps_api_key.clone(),
    });

    Ok(with_common_layers(
        maps::maps_router(state),
        &maps.allowed_origins,
    ))
}

/// Start the chat façade HTTP server.
pub async fn start_chat(config: &AppConfig) -> wayfarer_core::Result<()> {
    let app = chat_app(config)?;
    let addr = format!("{}:{}", config.chat.host, config.chat.port);

    info!(
        addr = %addr,
        provider = %config.chat.provider_name,
        model = %config.chat.model,
        "Chat service starting"
    );
    serve(&addr, app).await
}

/// Start the maps façade HTTP server.
pub async fn start_maps(config: &AppConfig) -> wayfarer_core::Result<()> {
    let app = maps_app(config)?;
    let addr = format!("{}:{}", config.maps.host, config.maps.port);

    info!(addr = %addr, "Maps service starting");
    serve(&addr, app).await
}

async fn serve(addr: &str, app: Router) -> wayfarer_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
