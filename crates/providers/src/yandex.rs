//! Yandex Geocoder and Geosuggest clients.
//!
//! Both APIs answer with deeply nested JSON. Bodies are first read as
//! untyped JSON (a body that is not JSON at all means the service is
//! unusable), then decoded into the typed records below. A decode failure
//! there means the fields we need are absent, which callers treat as
//! "not found" rather than as a transport error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use wayfarer_core::error::GeoError;
use wayfarer_core::geo::{AddressSuggester, Coordinates, GeocodedAddress, Geocoder};

const GEOCODER: &str = "Geocoder";
const SUGGEST: &str = "Suggest service";

/// Detail returned when a geocode payload lacks a usable point/address.
pub const COORDINATES_NOT_FOUND: &str = "Coordinates not found";
/// Detail returned when a suggestion has neither address nor subtitle.
pub const ADDRESS_NOT_FOUND: &str = "Address not found";

fn http_client(timeout: Duration, service: &'static str) -> Result<reqwest::Client, GeoError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GeoError::Unavailable {
            service,
            reason: format!("HTTP client: {e}"),
        })
}

/// GET `url` with `params` and return the body as JSON.
async fn fetch_json(
    client: &reqwest::Client,
    service: &'static str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<Value, GeoError> {
    let unavailable = |reason: String| GeoError::Unavailable { service, reason };

    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    debug!(service, url = %response.url().path(), status = %response.status(), "Upstream responded");

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        warn!(service, status = status.as_u16(), body = %body, "Upstream returned error");
        return Err(unavailable(format!("status {}", status.as_u16())));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| unavailable(format!("invalid body: {e}")))
}

// ── Geocoder ──────────────────────────────────────────────────────────────

/// Client for the Yandex HTTP Geocoder.
pub struct YandexGeocoder {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl YandexGeocoder {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeoError> {
        Ok(Self {
            url: url.into(),
            api_key: api_key.into(),
            client: http_client(timeout, GEOCODER)?,
        })
    }

    pub fn from_config(config: &wayfarer_config::MapsConfig) -> Result<Self, GeoError> {
        Self::new(
            &config.geocode_url,
            config.geocoder_key.clone().unwrap_or_default(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl Geocoder for YandexGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeoError> {
        let params = [
            ("apikey", self.api_key.as_str()),
            ("geocode", address),
            ("format", "json"),
        ];
        let body = fetch_json(&self.client, GEOCODER, &self.url, &params).await?;
        parse_geocode(body)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeEnvelope {
    response: GeocodeBody,
}

#[derive(Debug, Deserialize)]
struct GeocodeBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Debug, Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    feature_member: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Debug, Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: Point,
    #[serde(rename = "metaDataProperty")]
    meta: MetaDataProperty,
}

#[derive(Debug, Deserialize)]
struct Point {
    pos: String,
}

#[derive(Debug, Deserialize)]
struct MetaDataProperty {
    #[serde(rename = "GeocoderMetaData")]
    geocoder: GeocoderMetaData,
}

#[derive(Debug, Deserialize)]
struct GeocoderMetaData {
    #[serde(rename = "Address")]
    address: AddressData,
}

#[derive(Debug, Deserialize)]
struct AddressData {
    formatted: String,
}

/// Pull the first feature's point and formatted address out of a geocoder
/// payload. `pos` is `"lon lat"`; the result is in lat/lon order.
pub fn parse_geocode(body: Value) -> Result<GeocodedAddress, GeoError> {
    let not_found = || GeoError::NotFound(COORDINATES_NOT_FOUND.into());

    let envelope: GeocodeEnvelope = serde_json::from_value(body).map_err(|_| not_found())?;
    let first = envelope
        .response
        .collection
        .feature_member
        .into_iter()
        .next()
        .ok_or_else(not_found)?;
    let member: FeatureMember = serde_json::from_value(first).map_err(|_| not_found())?;
    let object = member.geo_object;

    let coordinates = parse_pos(&object.point.pos).ok_or_else(not_found)?;

    Ok(GeocodedAddress {
        formatted: object.meta.geocoder.address.formatted,
        coordinates,
    })
}

/// Parse `"lon lat"` into lat/lon coordinates. Exactly two numbers.
fn parse_pos(pos: &str) -> Option<Coordinates> {
    let mut parts = pos.split_whitespace();
    let lon: f64 = parts.next()?.parse().ok()?;
    let lat: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Coordinates::new(lat, lon))
}

// ── Suggest ───────────────────────────────────────────────────────────────

/// Client for the Yandex Geosuggest API.
pub struct YandexSuggest {
    url: String,
    api_key: String,
    lang: String,
    client: reqwest::Client,
}

impl YandexSuggest {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        lang: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeoError> {
        Ok(Self {
            url: url.into(),
            api_key: api_key.into(),
            lang: lang.into(),
            client: http_client(timeout, SUGGEST)?,
        })
    }

    pub fn from_config(config: &wayfarer_config::MapsConfig) -> Result<Self, GeoError> {
        Self::new(
            &config.suggest_url,
            config.geosuggest_key.clone().unwrap_or_default(),
            &config.lang,
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait]
impl AddressSuggester for YandexSuggest {
    async fn suggest(&self, text: &str) -> Result<String, GeoError> {
        let text = text.replace(' ', "+");
        let params = [
            ("apikey", self.api_key.as_str()),
            ("text", text.as_str()),
            ("lang", self.lang.as_str()),
            ("results", "1"),
        ];
        let body = fetch_json(&self.client, SUGGEST, &self.url, &params).await?;
        parse_suggestion(body)
    }
}

#[derive(Debug, Deserialize)]
struct SuggestEnvelope {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SuggestResult {
    #[serde(default)]
    address: Option<SuggestAddress>,
    #[serde(default)]
    subtitle: Option<Subtitle>,
}

#[derive(Debug, Deserialize)]
struct SuggestAddress {
    #[serde(default)]
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Subtitle {
    #[serde(default)]
    text: Option<String>,
}

/// Take the first suggestion's formatted address, falling back to its
/// subtitle. Empty strings count as missing.
pub fn parse_suggestion(body: Value) -> Result<String, GeoError> {
    let not_found = || GeoError::NotFound(ADDRESS_NOT_FOUND.into());

    let envelope: SuggestEnvelope = serde_json::from_value(body).map_err(|_| not_found())?;
    let first = envelope.results.into_iter().next().ok_or_else(not_found)?;
    let result: SuggestResult = serde_json::from_value(first).map_err(|_| not_found())?;

    let formatted = result
        .address
        .and_then(|a| a.formatted_address)
        .filter(|s| !s.is_empty());
    let subtitle = || {
        result
            .subtitle
            .and_then(|s| s.text)
            .filter(|s| !s.is_empty())
    };

    formatted.or_else(subtitle).ok_or_else(not_found)
}
