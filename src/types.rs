//! Core types for the place resolution engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A validated WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build a coordinate pair, rejecting anything outside the valid
    /// lat ∈ [-90, 90], lng ∈ [-180, 180] ranges (and non-finite values).
    pub fn new(lat: f64, lng: f64) -> Result<Self, EngineError> {
        if Self::in_range(lat, lng) {
            Ok(Self { lat, lng })
        } else {
            Err(EngineError::InvalidCoordinates { lat, lng })
        }
    }

    pub fn in_range(lat: f64, lng: f64) -> bool {
        lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// Which provider produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Primary,
    Secondary,
    Local,
}

impl SuggestionSource {
    /// Confidence is fixed by provenance and never upgraded afterwards.
    pub fn confidence(self) -> Confidence {
        match self {
            Self::Primary => Confidence::High,
            Self::Secondary => Confidence::Medium,
            Self::Local => Confidence::Low,
        }
    }
}

impl fmt::Display for SuggestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "Places"),
            Self::Secondary => write!(f, "OpenStreetMap"),
            Self::Local => write!(f, "Local"),
        }
    }
}

/// How the final coordinate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionSource {
    Auto,
    ManualPin,
    ManualSuggestion,
}

/// Coarse quality label on a resolved location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// One logical search issued against the providers.
#[derive(Debug, Clone, Default)]
pub struct PlaceQuery {
    pub text: String,
    pub state: Option<String>,
    pub district: Option<String>,
}

/// A candidate place offered to the user, in the common shape shared by
/// every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub coords: Option<Coordinates>,
    pub source: SuggestionSource,
    /// Provider-native reference (place id for Primary, OSM id for
    /// Secondary) used by the details/lookup step.
    #[serde(default)]
    pub provider_ref: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
}

/// The state/district pair currently chosen by the user. The district is
/// only ever one of the canonical districts of the chosen state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministrativeSelection {
    pub state: Option<String>,
    pub district: Option<String>,
}

/// The confirmed output of one picking session. Ownership passes to the
/// caller; the engine keeps nothing once this is emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub lat: f64,
    pub lng: f64,
    pub source: ResolutionSource,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub area_label: Option<String>,
    pub confidence: Confidence,
}

/// User-visible, non-fatal conditions. None of these interrupt the flow;
/// they are surfaced as hints next to whatever results exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// Every provider returned empty for a non-trivial query.
    NoMatches,
    /// At least one provider failed on transport while others answered.
    ProviderDegraded,
    /// A chosen suggestion could not be converted to coordinates.
    ResolutionFailed,
    /// The boundary dataset could not be fetched or parsed.
    BoundaryUnavailable,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatches => write!(f, "No matches found — try another spelling or drop a pin."),
            Self::ProviderDegraded => write!(f, "Some search providers are unreachable. Showing partial matches."),
            Self::ResolutionFailed => write!(f, "Unable to resolve the selected place, please drop a pin manually."),
            Self::BoundaryUnavailable => write!(f, "District boundary layer unavailable."),
        }
    }
}

/// Hard errors at the engine API boundary. Provider failures never show up
/// here; they are contained inside the aggregation as [`Advisory`] values.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("select a state before choosing a district")]
    NoStateSelected,

    #[error("'{district}' is not a district of {state}")]
    DistrictNotInState { state: String, district: String },

    #[error("invalid coordinates ({lat}, {lng}): lat must be within [-90, 90] and lng within [-180, 180]")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("no suggestion at index {0}")]
    NoSuchSuggestion(usize),

    #[error("no location selected yet")]
    NothingSelected,

    #[error("picking session already confirmed")]
    SessionClosed,
}
