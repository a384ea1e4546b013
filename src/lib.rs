//! GramDisha place resolution engine.
//!
//! Turns free-text location queries and manual map interactions into a
//! single, confidence-rated geographic location by orchestrating a
//! commercial autocomplete service, an open geocoder, and an offline
//! gazetteer — with debounced, cancellable fan-out, fuzzy name matching,
//! multi-source merge/rank, and reconciliation of pin drops against the
//! known administrative hierarchy.

pub mod aggregator;
pub mod boundary;
pub mod cancel;
pub mod engine;
pub mod gazetteer;
pub mod normalize;
pub mod providers;
pub mod resolver;
pub mod reverse;
pub mod server;
pub mod session;
pub mod types;

pub use aggregator::{Aggregate, AggregatorConfig, SuggestionAggregator};
pub use engine::{BoundarySource, Engine, EngineConfig};
pub use gazetteer::Gazetteer;
pub use session::{PickerEvent, PickerPhase, PickerSession};
pub use types::{
    AdministrativeSelection, Advisory, Confidence, Coordinates, EngineError, PlaceQuery,
    ResolutionSource, ResolvedLocation, Suggestion, SuggestionSource,
};
