//! Maps façade: geocoding and address suggestions.
//!
//! Endpoints:
//!
//! - `POST /api/maps/coords`: `{name, address}` → `{name, address, coords: [lat, lon]}`
//! - `POST /api/maps/addresses`: `{name}` → `{name, address}`
//! - `GET  /api/maps-key`: client-side map display key
//! - `GET  /api/health`: liveness probe

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use wayfarer_core::geo::{AddressSuggester, GeoResult, Geocoder};

use crate::error::ApiError;

pub struct MapsState {
    pub geocoder: Arc<dyn Geocoder>,
    pub suggester: Arc<dyn AddressSuggester>,
    /// Display key handed to browsers; never the geocoder/suggest keys.
    pub maps_key: Option<String>,
}

pub type SharedMapsState = Arc<MapsState>;

/// Build the maps façade router.
pub fn maps_router(state: SharedMapsState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/maps-key", get(maps_key_handler))
        .route("/api/maps/coords", post(coords_handler))
        .route("/api/maps/addresses", post(addresses_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CoordsRequest {
    name: String,
    address: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CoordsResponse {
    name: String,
    address: String,
    coords: Option<[f64; 2]>,
}

impl From<GeoResult> for CoordsResponse {
    fn from(result: GeoResult) -> Self {
        Self {
            name: result.name,
            address: result.address,
            coords: result.coordinates.map(|c| c.to_lat_lon()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddressRequest {
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AddressResponse {
    name: String,
    address: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MapsKeyResponse {
    key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn maps_key_handler(State(state): State<SharedMapsState>) -> Json<MapsKeyResponse> {
    Json(MapsKeyResponse {
        key: state.maps_key.clone(),
    })
}

async fn coords_handler(
    State(state): State<SharedMapsState>,
    Json(payload): Json<CoordsRequest>,
) -> Result<Json<CoordsResponse>, ApiError> {
    let geocoded = state.geocoder.geocode(&payload.address).await?;
    info!(name = %payload.name, address = %geocoded.formatted, "Geocoded place");

    let result = GeoResult {
        name: payload.name,
        address: geocoded.formatted,
        coordinates: Some(geocoded.coordinates),
    };
    Ok(Json(result.into()))
}

async fn addresses_handler(
    State(state): State<SharedMapsState>,
    Json(payload): Json<AddressRequest>,
) -> Result<Json<AddressResponse>, ApiError> {
    let address = state.suggester.suggest(&payload.name).await?;
    info!(name = %payload.name, address = %address, "Suggested address");

    Ok(Json(AddressResponse {
        name: payload.name,
        address,
    }))
}
