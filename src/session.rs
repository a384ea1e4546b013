//! One location-picking session: the state machine driving a picker from
//! Idle through administrative selection, search, and confirmation.
//!
//! Idle → StateChosen → DistrictChosen → Searching → {SuggestionChosen |
//! ManualPin} → Confirmed. Changing state or district clears the query,
//! discards pending suggestions, and re-runs the DistrictChosen behavior
//! (boundary highlight + fly-to). Confirmed is terminal; reopen the picker
//! by starting a new session.
//!
//! The session does not render anything. Host-map interactions arrive as
//! handler calls; everything the hosting form needs to react to leaves as
//! [`PickerEvent`]s on the channel handed out at construction.

use crate::aggregator::Aggregate;
use crate::engine::Engine;
use crate::providers::COUNTRY_NAME;
use crate::types::{
    AdministrativeSelection, Advisory, Confidence, Coordinates, EngineError, PlaceQuery,
    ResolutionSource, ResolvedLocation, Suggestion,
};
use chrono::{DateTime, Utc};
use geojson::Feature;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Zoom level for the fly-to after a district selection.
const DISTRICT_ZOOM: u8 = 10;
/// Zoom level for the fly-to after a resolved suggestion.
const SUGGESTION_ZOOM: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerPhase {
    Idle,
    StateChosen,
    DistrictChosen,
    Searching,
    SuggestionChosen,
    ManualPin,
    Confirmed,
}

/// Incremental change notifications for the hosting form and map widget.
#[derive(Debug)]
pub enum PickerEvent {
    CoordinateChanged(Coordinates),
    AdministrativeChanged(AdministrativeSelection),
    SuggestionsChanged(Vec<Suggestion>),
    Advisory(Advisory),
    /// Ask the host map to pan/zoom.
    FlyTo { coords: Coordinates, zoom: u8 },
    /// Boundary polygon for the selected district, when one matched.
    DistrictHighlight(Option<Box<Feature>>),
    Confirmed { location: ResolvedLocation, at: DateTime<Utc> },
}

pub struct PickerSession {
    engine: Arc<Engine>,
    phase: PickerPhase,
    selection: AdministrativeSelection,
    query_text: String,
    suggestions: Vec<Suggestion>,
    cursor: Option<usize>,
    coords: Option<Coordinates>,
    area_label: Option<String>,
    confidence: Confidence,
    origin: ResolutionSource,
    events: mpsc::UnboundedSender<PickerEvent>,
}

impl PickerSession {
    pub fn new(engine: Arc<Engine>) -> (Self, mpsc::UnboundedReceiver<PickerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                engine,
                phase: PickerPhase::Idle,
                selection: AdministrativeSelection::default(),
                query_text: String::new(),
                suggestions: Vec::new(),
                cursor: None,
                coords: None,
                area_label: None,
                confidence: Confidence::Medium,
                origin: ResolutionSource::Auto,
                events: tx,
            },
            rx,
        )
    }

    /// Start a session with a coordinate already known (auto flow).
    /// Confirming without any manual interaction reports `source = auto`.
    pub fn with_initial(
        engine: Arc<Engine>,
        lat: f64,
        lng: f64,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PickerEvent>), EngineError> {
        let coords = Coordinates::new(lat, lng)?;
        let (mut session, rx) = Self::new(engine);
        session.coords = Some(coords);
        Ok((session, rx))
    }

    pub fn phase(&self) -> PickerPhase {
        self.phase
    }

    pub fn selection(&self) -> &AdministrativeSelection {
        &self.selection
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coords
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The user picked a state. Clears the district, the query, and any
    /// pending suggestions.
    pub fn on_state_changed(&mut self, state: &str) -> Result<(), EngineError> {
        self.ensure_open()?;
        let canonical = self
            .engine
            .gazetteer()
            .canonical_state(state)
            .ok_or_else(|| EngineError::UnknownState(state.to_string()))?;

        self.selection.state = Some(canonical.to_string());
        self.selection.district = None;
        self.clear_query();
        self.phase = PickerPhase::StateChosen;
        self.emit(PickerEvent::AdministrativeChanged(self.selection.clone()));
        Ok(())
    }

    /// The user picked a district. Validates membership, clears the query,
    /// then kicks off the boundary highlight and the centroid fly-to.
    pub async fn on_district_changed(&mut self, district: &str) -> Result<(), EngineError> {
        self.ensure_open()?;
        let state = self
            .selection
            .state
            .clone()
            .ok_or(EngineError::NoStateSelected)?;
        let canonical = self
            .engine
            .gazetteer()
            .canonical_district(&state, district)
            .ok_or_else(|| EngineError::DistrictNotInState {
                state: state.clone(),
                district: district.to_string(),
            })?;

        self.selection.district = Some(canonical.to_string());
        self.clear_query();
        self.phase = PickerPhase::DistrictChosen;
        self.emit(PickerEvent::AdministrativeChanged(self.selection.clone()));

        let feature = self.engine.boundary.highlight(canonical).await;
        if feature.is_none() && !self.engine.boundary.layer_available() {
            self.emit(PickerEvent::Advisory(Advisory::BoundaryUnavailable));
        }
        self.emit(PickerEvent::DistrictHighlight(feature.map(Box::new)));

        // Approximate centroid via the open geocoder; failure just means no
        // fly-to, the flow continues.
        let centroid_query = format!("{canonical}, {state}, {COUNTRY_NAME}");
        if let Some(place) = self.engine.geocoder.locate(&centroid_query).await {
            self.coords = Some(place.coords);
            self.emit(PickerEvent::CoordinateChanged(place.coords));
            self.emit(PickerEvent::FlyTo {
                coords: place.coords,
                zoom: DISTRICT_ZOOM,
            });
        }
        Ok(())
    }

    /// The query text changed. Runs one debounced, cancellable aggregation
    /// round; a superseded round leaves the visible list untouched.
    pub async fn on_query_changed(&mut self, text: &str) -> Result<Aggregate, EngineError> {
        self.ensure_open()?;
        self.query_text = text.to_string();
        if self.selection.state.is_some() && self.selection.district.is_some() {
            self.phase = PickerPhase::Searching;
        }

        let query = PlaceQuery {
            text: text.to_string(),
            state: self.selection.state.clone(),
            district: self.selection.district.clone(),
        };
        let aggregate = self.engine.aggregator.search(&query).await;
        if aggregate.cancelled {
            return Ok(aggregate);
        }

        self.suggestions = aggregate.suggestions.clone();
        self.cursor = None;
        self.emit(PickerEvent::SuggestionsChanged(self.suggestions.clone()));
        if let Some(advisory) = aggregate.advisory {
            self.emit(PickerEvent::Advisory(advisory));
        }
        Ok(aggregate)
    }

    /// Move the keyboard cursor down the suggestion list, wrapping.
    pub fn cursor_down(&mut self) -> Option<&Suggestion> {
        if self.suggestions.is_empty() {
            self.cursor = None;
            return None;
        }
        let next = match self.cursor {
            None => 0,
            Some(i) => (i + 1) % self.suggestions.len(),
        };
        self.cursor = Some(next);
        self.suggestions.get(next)
    }

    /// Move the keyboard cursor up, wrapping.
    pub fn cursor_up(&mut self) -> Option<&Suggestion> {
        if self.suggestions.is_empty() {
            self.cursor = None;
            return None;
        }
        let len = self.suggestions.len();
        let next = match self.cursor {
            None => len - 1,
            Some(i) => (i + len - 1) % len,
        };
        self.cursor = Some(next);
        self.suggestions.get(next)
    }

    /// The user picked a suggestion (by click, or Enter on the cursor).
    pub async fn on_suggestion_chosen(&mut self, index: usize) -> Result<(), EngineError> {
        self.ensure_open()?;
        let suggestion = self
            .suggestions
            .get(index)
            .cloned()
            .ok_or(EngineError::NoSuchSuggestion(index))?;

        self.query_text = suggestion.label.clone();
        self.suggestions.clear();
        self.cursor = None;
        self.emit(PickerEvent::SuggestionsChanged(Vec::new()));

        match self.engine.resolver.resolve(&suggestion).await {
            Ok(outcome) => {
                self.coords = Some(outcome.coords);
                self.confidence = outcome.confidence;
                self.origin = ResolutionSource::ManualSuggestion;
                self.area_label = Some(outcome.label);
                self.phase = PickerPhase::SuggestionChosen;
                self.apply_admin(outcome.state, outcome.district);
                self.emit(PickerEvent::CoordinateChanged(outcome.coords));
                self.emit(PickerEvent::FlyTo {
                    coords: outcome.coords,
                    zoom: SUGGESTION_ZOOM,
                });
            }
            Err(advisory) => {
                // Selection stands unresolved; the user is told to pin.
                self.emit(PickerEvent::Advisory(advisory));
            }
        }
        Ok(())
    }

    /// A pin was placed or a marker dragged on the host map. Out-of-range
    /// coordinates are rejected and the prior selection is retained.
    pub async fn on_pin_dropped(&mut self, lat: f64, lng: f64) -> Result<(), EngineError> {
        self.ensure_open()?;
        let coords = Coordinates::new(lat, lng)?;

        self.coords = Some(coords);
        self.origin = ResolutionSource::ManualPin;
        self.confidence = Confidence::Low;
        self.phase = PickerPhase::ManualPin;
        self.emit(PickerEvent::CoordinateChanged(coords));

        let outcome = self.engine.reverse.resolve_pin(coords).await;
        self.apply_admin(outcome.state, outcome.district);
        if let Some(area) = outcome.area_label {
            self.query_text = area.clone();
            self.area_label = Some(area);
        }
        // The human placement is ground truth; reverse-geocode detail never
        // raises confidence above Low.
        self.confidence = outcome.confidence;
        Ok(())
    }

    /// Finish the session and hand the resolved location to the caller.
    pub fn confirm(&mut self) -> Result<ResolvedLocation, EngineError> {
        self.ensure_open()?;
        let coords = self.coords.ok_or(EngineError::NothingSelected)?;

        let area_label = self
            .area_label
            .clone()
            .or_else(|| (!self.query_text.is_empty()).then(|| self.query_text.clone()));
        let location = ResolvedLocation {
            lat: coords.lat,
            lng: coords.lng,
            source: self.origin,
            state: self.selection.state.clone(),
            district: self.selection.district.clone(),
            area_label,
            confidence: self.confidence,
        };

        self.phase = PickerPhase::Confirmed;
        self.emit(PickerEvent::Confirmed {
            location: location.clone(),
            at: Utc::now(),
        });
        Ok(location)
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.phase == PickerPhase::Confirmed {
            return Err(EngineError::SessionClosed);
        }
        Ok(())
    }

    fn clear_query(&mut self) {
        self.query_text.clear();
        self.cursor = None;
        self.engine.aggregator.invalidate();
        if !self.suggestions.is_empty() {
            self.suggestions.clear();
            self.emit(PickerEvent::SuggestionsChanged(Vec::new()));
        }
    }

    /// Adopt gazetteer-validated administrative names, keeping the district
    /// invariant intact when the state changes out from under it.
    fn apply_admin(&mut self, state: Option<&'static str>, district: Option<&'static str>) {
        let before = self.selection.clone();
        if let Some(state) = state {
            let state_changed = self.selection.state.as_deref() != Some(state);
            self.selection.state = Some(state.to_string());
            match district {
                Some(district) => self.selection.district = Some(district.to_string()),
                None if state_changed => self.selection.district = None,
                None => {}
            }
        }
        if self.selection != before {
            self.emit(PickerEvent::AdministrativeChanged(self.selection.clone()));
        }
    }

    fn emit(&self, event: PickerEvent) {
        // A host that dropped its receiver simply stops listening.
        let _ = self.events.send(event);
    }
}
