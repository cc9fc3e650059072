//! Geocoding traits and result types.
//!
//! The maps façade asks two questions of its provider: "where is this
//! address?" and "what is the address of this place?". Each is a trait so
//! the HTTP clients and test doubles are interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// A point in latitude/longitude order.
///
/// Providers often report `lon lat`; convert before constructing this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `[lat, lon]`, the order clients receive.
    pub fn to_lat_lon(self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoResult {
    pub name: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
}

/// The geocoder's answer for a free-text address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Provider-formatted address
    pub formatted: String,
    pub coordinates: Coordinates,
}

/// Resolves a free-text address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeoError>;
}

/// Suggests a formatted address for a place name.
#[async_trait]
pub trait AddressSuggester: Send + Sync {
    async fn suggest(&self, text: &str) -> Result<String, GeoError>;
}
