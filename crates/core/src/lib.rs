//! # Wayfarer Core
//!
//! Domain types, traits, and error definitions shared by the Wayfarer
//! chat and maps façades. This crate has **no HTTP dependencies**: it
//! defines the conversation model, the two pieces of pure logic
//! (context trimming and JSON repair), and the traits the upstream
//! clients implement.
//!
//! Upstream clients live in `wayfarer-providers`, HTTP routing in
//! `wayfarer-gateway`. Both depend inward on this crate.

pub mod context;
pub mod error;
pub mod geo;
pub mod message;
pub mod provider;
pub mod repair;

// Re-export key types at crate root for ergonomics
pub use context::{DEFAULT_KEEP_LAST, trim_context};
pub use error::{Error, GeoError, ProviderError, RepairError, Result};
pub use geo::{AddressSuggester, Coordinates, GeoResult, GeocodedAddress, Geocoder};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use repair::{RepairOutcome, extract};
