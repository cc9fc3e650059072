//! Upstream provider clients for Wayfarer.
//!
//! - [`OpenAiCompatProvider`] implements `wayfarer_core::Provider` over any
//!   OpenAI-compatible `/chat/completions` endpoint (DeepSeek by default).
//! - [`YandexGeocoder`] and [`YandexSuggest`] implement the geocoding
//!   traits over the Yandex Geocoder and Geosuggest HTTP APIs.

pub mod openai_compat;
pub mod yandex;

pub use openai_compat::OpenAiCompatProvider;
pub use yandex::{YandexGeocoder, YandexSuggest};
