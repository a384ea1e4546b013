//! Engine assembly: configuration plus the wired-together aggregator,
//! resolvers, and boundary cache. One engine serves many picking sessions.

use crate::aggregator::{Aggregate, AggregatorConfig, SuggestionAggregator};
use crate::boundary::{
    BoundaryCache, BoundaryLoader, DisabledBoundaryLoader, FileBoundaryLoader, HttpBoundaryLoader,
};
use crate::gazetteer::Gazetteer;
use crate::providers::local::LocalSearchConfig;
use crate::providers::{
    AutocompleteProvider, DisabledProvider, Geocoder, LocalProvider, PrimaryProvider,
    SecondaryProvider,
};
use crate::resolver::{ResolutionOutcome, SuggestionResolver};
use crate::reverse::{ReverseOutcome, ReverseResolver};
use crate::types::{Advisory, Coordinates, EngineError, PlaceQuery, Suggestion};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where the district boundary dataset comes from.
#[derive(Debug, Clone)]
pub enum BoundarySource {
    Url(String),
    File(PathBuf),
    Disabled,
}

/// All engine knobs. The empirically chosen constants (debounce, fuzzy
/// thresholds, list caps) are parameters rather than hard-coded.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub primary_base_url: String,
    /// Empty key leaves the primary provider out of the fan-out.
    pub primary_api_key: String,
    pub secondary_base_url: String,
    pub boundary_source: BoundarySource,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub debounce: Duration,
    pub min_query_len: usize,
    pub max_merged: usize,
    /// Per-provider result cap on remote autocomplete calls.
    pub remote_limit: usize,
    pub local: LocalSearchConfig,
    /// Offline mode: gazetteer search only, no network anywhere.
    pub offline: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_base_url: "https://maps.googleapis.com/maps/api/place".into(),
            primary_api_key: String::new(),
            secondary_base_url: "https://nominatim.openstreetmap.org".into(),
            boundary_source: BoundarySource::File(PathBuf::from("data/india_district.geojson")),
            user_agent: format!("gramdisha/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(10),
            debounce: Duration::from_millis(300),
            min_query_len: 3,
            max_merged: 8,
            remote_limit: 6,
            local: LocalSearchConfig::default(),
            offline: false,
        }
    }
}

/// The place resolution engine.
pub struct Engine {
    pub(crate) aggregator: SuggestionAggregator,
    pub(crate) resolver: SuggestionResolver,
    pub(crate) reverse: ReverseResolver,
    pub(crate) boundary: BoundaryCache,
    pub(crate) geocoder: Arc<dyn Geocoder>,
    gazetteer: Gazetteer,
}

impl Engine {
    /// Build an engine against the real providers described by `config`.
    pub fn new(config: EngineConfig) -> Self {
        if config.offline {
            let disabled = Arc::new(DisabledProvider);
            return Self::with_providers(
                config,
                disabled.clone(),
                disabled.clone(),
                disabled,
                BoundaryCache::new(Box::new(DisabledBoundaryLoader)),
            );
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()
            .expect("HTTP client construction cannot fail with static settings");

        let primary: Arc<dyn AutocompleteProvider> = Arc::new(PrimaryProvider::new(
            client.clone(),
            config.primary_base_url.clone(),
            config.primary_api_key.clone(),
            config.remote_limit,
        ));
        let secondary = Arc::new(SecondaryProvider::new(
            client.clone(),
            config.secondary_base_url.clone(),
            config.remote_limit,
        ));
        let geocoder: Arc<dyn Geocoder> = secondary.clone();

        let loader: Box<dyn BoundaryLoader> = match &config.boundary_source {
            BoundarySource::Url(url) => Box::new(HttpBoundaryLoader::new(client, url.clone())),
            BoundarySource::File(path) => Box::new(FileBoundaryLoader::new(path.clone())),
            BoundarySource::Disabled => Box::new(DisabledBoundaryLoader),
        };

        Self::with_providers(config, primary, secondary, geocoder, BoundaryCache::new(loader))
    }

    /// Wire an engine from explicit parts. This is the seam the tests (and
    /// any embedder with custom providers) use.
    pub fn with_providers(
        config: EngineConfig,
        primary: Arc<dyn AutocompleteProvider>,
        secondary: Arc<dyn AutocompleteProvider>,
        geocoder: Arc<dyn Geocoder>,
        boundary: BoundaryCache,
    ) -> Self {
        let gazetteer = Gazetteer::new();
        let local = LocalProvider::new(gazetteer, config.local.clone());
        let aggregator = SuggestionAggregator::new(
            primary.clone(),
            secondary.clone(),
            local,
            AggregatorConfig {
                debounce: config.debounce,
                min_query_len: config.min_query_len,
                max_merged: config.max_merged,
            },
        );
        let resolver = SuggestionResolver::new(primary, secondary, geocoder.clone(), gazetteer);
        let reverse = ReverseResolver::new(geocoder.clone(), gazetteer);

        Self {
            aggregator,
            resolver,
            reverse,
            boundary,
            geocoder,
            gazetteer,
        }
    }

    pub fn gazetteer(&self) -> Gazetteer {
        self.gazetteer
    }

    /// One-shot debounced suggestion search (the session wraps this with
    /// its own state handling).
    pub async fn suggest(&self, text: &str, state: &str, district: &str) -> Aggregate {
        let query = PlaceQuery {
            text: text.to_string(),
            state: Some(state.to_string()),
            district: Some(district.to_string()),
        };
        self.aggregator.search(&query).await
    }

    /// One-shot reverse resolution for a manual coordinate.
    pub async fn reverse_resolve(&self, lat: f64, lng: f64) -> Result<ReverseOutcome, EngineError> {
        let coords = Coordinates::new(lat, lng)?;
        Ok(self.reverse.resolve_pin(coords).await)
    }

    /// One-shot resolution of a chosen suggestion.
    pub async fn resolve_suggestion(
        &self,
        suggestion: &Suggestion,
    ) -> Result<ResolutionOutcome, Advisory> {
        self.resolver.resolve(suggestion).await
    }
}
