//! Provider adapters: Primary (commercial autocomplete), Secondary (open
//! geocoder), and the offline Local gazetteer search.
//!
//! Each adapter maps its provider-native payload into the common
//! [`Suggestion`] shape and fails closed: transport errors, non-success
//! statuses, and malformed payloads become an `Unavailable` failure the
//! aggregator folds into an empty list, never an escaping error.
//! Cancellations stay silent.

pub mod local;
pub mod primary;
pub mod secondary;

pub use local::LocalProvider;
pub use primary::PrimaryProvider;
pub use secondary::SecondaryProvider;

use crate::cancel::QueryToken;
use crate::types::{Coordinates, PlaceQuery, Suggestion};
use async_trait::async_trait;

/// Every remote query is restricted to this country.
pub const COUNTRY_CODE: &str = "in";
pub const COUNTRY_NAME: &str = "India";

/// Why a remote adapter produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    /// The query generation was superseded; swallow silently.
    Cancelled,
    /// Transport error, non-success status, or malformed payload.
    Unavailable,
}

/// A concrete place returned by the details / lookup / reverse endpoints.
#[derive(Debug, Clone)]
pub struct ProviderPlace {
    pub coords: Coordinates,
    /// Full display label (formatted address).
    pub label: Option<String>,
    /// Area-level label, preferred for the free-text area field.
    pub short_label: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
}

/// A remote suggestion source participating in the fan-out, plus the
/// details step that turns one of its suggestions into coordinates.
#[async_trait]
pub trait AutocompleteProvider: Send + Sync {
    /// Candidate suggestions for a scoped query.
    async fn suggest(
        &self,
        query: &PlaceQuery,
        token: &QueryToken,
    ) -> Result<Vec<Suggestion>, ProviderFailure>;

    /// Convert a suggestion lacking coordinates into a concrete place via
    /// its provider-native reference. `None` on any failure.
    async fn resolve(&self, suggestion: &Suggestion) -> Option<ProviderPlace>;
}

/// Coordinate-oriented lookups backed by the open geocoder.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Nearest administrative address for a coordinate.
    async fn reverse(&self, coords: Coordinates) -> Option<ProviderPlace>;

    /// Best single match for a free-form place string (district centroids,
    /// local suggestion resolution).
    async fn locate(&self, text: &str) -> Option<ProviderPlace>;
}

/// No-op provider used for offline operation. Always empty, never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

#[async_trait]
impl AutocompleteProvider for DisabledProvider {
    async fn suggest(
        &self,
        _query: &PlaceQuery,
        _token: &QueryToken,
    ) -> Result<Vec<Suggestion>, ProviderFailure> {
        Ok(Vec::new())
    }

    async fn resolve(&self, _suggestion: &Suggestion) -> Option<ProviderPlace> {
        None
    }
}

#[async_trait]
impl Geocoder for DisabledProvider {
    async fn reverse(&self, _coords: Coordinates) -> Option<ProviderPlace> {
        None
    }

    async fn locate(&self, _text: &str) -> Option<ProviderPlace> {
        None
    }
}
