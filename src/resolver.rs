//! Resolution step: turn a chosen suggestion into concrete coordinates and
//! a possibly corrected administrative hierarchy.
//!
//! Primary suggestions resolve through the details endpoint, Secondary ones
//! through id lookup, Local ones through a single-result forward search.
//! Failure never propagates — the caller gets a "drop a pin manually"
//! advisory instead.

use crate::gazetteer::Gazetteer;
use crate::providers::{AutocompleteProvider, Geocoder, ProviderPlace, COUNTRY_NAME};
use crate::types::{Advisory, Confidence, Coordinates, Suggestion, SuggestionSource};
use std::sync::Arc;

/// What a successful resolution hands back to the session.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    pub coords: Coordinates,
    pub label: String,
    pub confidence: Confidence,
    /// Canonical state adopted from the provider response, when recognized.
    pub state: Option<&'static str>,
    /// Canonical district, only when a member of the adopted state's list.
    pub district: Option<&'static str>,
}

pub struct SuggestionResolver {
    primary: Arc<dyn AutocompleteProvider>,
    secondary: Arc<dyn AutocompleteProvider>,
    geocoder: Arc<dyn Geocoder>,
    gazetteer: Gazetteer,
}

impl SuggestionResolver {
    pub fn new(
        primary: Arc<dyn AutocompleteProvider>,
        secondary: Arc<dyn AutocompleteProvider>,
        geocoder: Arc<dyn Geocoder>,
        gazetteer: Gazetteer,
    ) -> Self {
        Self {
            primary,
            secondary,
            geocoder,
            gazetteer,
        }
    }

    /// Resolve a chosen suggestion. `Err` carries the user-facing guidance,
    /// never a hard error.
    pub async fn resolve(&self, suggestion: &Suggestion) -> Result<ResolutionOutcome, Advisory> {
        let confidence = suggestion.source.confidence();

        // Suggestions that already carry coordinates (typical for Secondary)
        // skip the extra round-trip.
        if let Some(coords) = suggestion.coords {
            let (state, district) =
                self.adopt_admin(suggestion.state.as_deref(), suggestion.district.as_deref());
            return Ok(ResolutionOutcome {
                coords,
                label: suggestion.label.clone(),
                confidence,
                state,
                district,
            });
        }

        let place = match suggestion.source {
            SuggestionSource::Primary => self.primary.resolve(suggestion).await,
            SuggestionSource::Secondary => self.secondary.resolve(suggestion).await,
            SuggestionSource::Local => {
                // Local entries have no provider-native reference; fall back
                // to a scoped single-result search on the open geocoder.
                let scope = match &suggestion.state {
                    Some(state) => format!("{}, {}, {}", suggestion.label, state, COUNTRY_NAME),
                    None => format!("{}, {}", suggestion.label, COUNTRY_NAME),
                };
                self.geocoder.locate(&scope).await
            }
        };

        let Some(place) = place else {
            tracing::warn!("resolution failed for suggestion '{}'", suggestion.label);
            return Err(Advisory::ResolutionFailed);
        };

        let ProviderPlace { coords, state, district, .. } = place;
        // Structured names from the details response take precedence over
        // the scope the suggestion was issued under.
        let (state, district) = self.adopt_admin(
            state.as_deref().or(suggestion.state.as_deref()),
            district.as_deref().or(suggestion.district.as_deref()),
        );

        Ok(ResolutionOutcome {
            coords,
            label: suggestion.label.clone(),
            confidence,
            state,
            district,
        })
    }

    /// Validate provider-supplied names against the gazetteer: unknown
    /// states are discarded, districts only survive as members of the
    /// adopted state's canonical list.
    fn adopt_admin(
        &self,
        state: Option<&str>,
        district: Option<&str>,
    ) -> (Option<&'static str>, Option<&'static str>) {
        let state = state.and_then(|s| self.gazetteer.canonical_state(s));
        let district = match (state, district) {
            (Some(state), Some(district)) => self.gazetteer.canonical_district(state, district),
            _ => None,
        };
        (state, district)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::QueryToken;
    use crate::providers::ProviderFailure;
    use crate::types::PlaceQuery;
    use async_trait::async_trait;

    struct FixedResolver(Option<ProviderPlace>);

    #[async_trait]
    impl AutocompleteProvider for FixedResolver {
        async fn suggest(
            &self,
            _query: &PlaceQuery,
            _token: &QueryToken,
        ) -> Result<Vec<Suggestion>, ProviderFailure> {
            Ok(Vec::new())
        }

        async fn resolve(&self, _suggestion: &Suggestion) -> Option<ProviderPlace> {
            self.0.clone()
        }
    }

    struct FixedGeocoder(Option<ProviderPlace>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn reverse(&self, _coords: Coordinates) -> Option<ProviderPlace> {
            self.0.clone()
        }

        async fn locate(&self, _text: &str) -> Option<ProviderPlace> {
            self.0.clone()
        }
    }

    fn place(lat: f64, lng: f64, state: Option<&str>, district: Option<&str>) -> ProviderPlace {
        ProviderPlace {
            coords: Coordinates::new(lat, lng).unwrap(),
            label: None,
            short_label: None,
            state: state.map(String::from),
            district: district.map(String::from),
        }
    }

    fn resolver(
        primary: Option<ProviderPlace>,
        secondary: Option<ProviderPlace>,
        geocoder: Option<ProviderPlace>,
    ) -> SuggestionResolver {
        SuggestionResolver::new(
            Arc::new(FixedResolver(primary)),
            Arc::new(FixedResolver(secondary)),
            Arc::new(FixedGeocoder(geocoder)),
            Gazetteer::new(),
        )
    }

    fn primary_suggestion() -> Suggestion {
        Suggestion {
            id: "p1".into(),
            label: "Koramangala, Bengaluru".into(),
            coords: None,
            source: SuggestionSource::Primary,
            provider_ref: Some("p1".into()),
            state: Some("Karnataka".into()),
            district: Some("Bengaluru Urban".into()),
        }
    }

    #[tokio::test]
    async fn test_primary_details_override_admin() {
        // Details disagree with the user's scope; the structured answer wins.
        let r = resolver(
            Some(place(12.93, 77.62, Some("Maharashtra"), Some("Pune"))),
            None,
            None,
        );
        let out = r.resolve(&primary_suggestion()).await.unwrap();
        assert_eq!(out.confidence, Confidence::High);
        assert_eq!(out.state, Some("Maharashtra"));
        assert_eq!(out.district, Some("Pune"));
    }

    #[tokio::test]
    async fn test_unrecognized_district_discarded() {
        let r = resolver(
            Some(place(12.93, 77.62, Some("Karnataka"), Some("Not A District"))),
            None,
            None,
        );
        let out = r.resolve(&primary_suggestion()).await.unwrap();
        assert_eq!(out.state, Some("Karnataka"));
        assert_eq!(out.district, None);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_guidance() {
        let r = resolver(None, None, None);
        let err = r.resolve(&primary_suggestion()).await.unwrap_err();
        assert_eq!(err, Advisory::ResolutionFailed);
    }

    #[tokio::test]
    async fn test_secondary_with_coords_short_circuits() {
        let r = resolver(None, None, None);
        let s = Suggestion {
            coords: Some(Coordinates::new(12.9, 77.6).unwrap()),
            source: SuggestionSource::Secondary,
            ..primary_suggestion()
        };
        let out = r.resolve(&s).await.unwrap();
        assert_eq!(out.confidence, Confidence::Medium);
        assert_eq!(out.state, Some("Karnataka"));
        assert_eq!(out.district, Some("Bengaluru Urban"));
    }

    #[tokio::test]
    async fn test_local_resolves_through_forward_search() {
        let r = resolver(None, None, Some(place(12.93, 77.62, None, None)));
        let s = Suggestion {
            id: "Bengaluru Urban-Koramangala".into(),
            label: "Koramangala, Bengaluru Urban".into(),
            coords: None,
            source: SuggestionSource::Local,
            provider_ref: None,
            state: Some("Karnataka".into()),
            district: Some("Bengaluru Urban".into()),
        };
        let out = r.resolve(&s).await.unwrap();
        assert_eq!(out.confidence, Confidence::Low);
        // Scope names survive when the geocoder returns none of its own.
        assert_eq!(out.state, Some("Karnataka"));
        assert_eq!(out.district, Some("Bengaluru Urban"));
    }
}
