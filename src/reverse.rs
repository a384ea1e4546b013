//! Reverse resolution: a manually placed or dragged pin becomes an
//! administrative label.
//!
//! The geocoder's answer is reconciled against the gazetteer — a state is
//! adopted only when known, a district only when it belongs to that state.
//! The human placement is the ground truth: confidence stays Low no matter
//! how detailed the reverse-geocode result is.

use crate::gazetteer::Gazetteer;
use crate::providers::Geocoder;
use crate::types::{Confidence, Coordinates};
use std::sync::Arc;

/// Administrative fields derived from a pin placement.
#[derive(Debug, Clone)]
pub struct ReverseOutcome {
    pub coords: Coordinates,
    pub state: Option<&'static str>,
    pub district: Option<&'static str>,
    pub area_label: Option<String>,
    pub confidence: Confidence,
}

pub struct ReverseResolver {
    geocoder: Arc<dyn Geocoder>,
    gazetteer: Gazetteer,
}

impl ReverseResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, gazetteer: Gazetteer) -> Self {
        Self { geocoder, gazetteer }
    }

    /// Resolve a manual pin. Total: a failed or empty reverse geocode still
    /// yields an outcome, just without administrative fields.
    pub async fn resolve_pin(&self, coords: Coordinates) -> ReverseOutcome {
        let mut outcome = ReverseOutcome {
            coords,
            state: None,
            district: None,
            area_label: None,
            confidence: Confidence::Low,
        };

        let Some(place) = self.geocoder.reverse(coords).await else {
            tracing::debug!("reverse geocode empty for {coords}");
            return outcome;
        };

        if let Some(state) = place
            .state
            .as_deref()
            .and_then(|s| self.gazetteer.canonical_state(s))
        {
            outcome.state = Some(state);
            outcome.district = place
                .district
                .as_deref()
                .and_then(|d| self.gazetteer.canonical_district(state, d));
        }
        outcome.area_label = place.short_label.or(place.label);
        outcome
    }
}
