use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::types::{Advisory, Confidence, EngineError, ResolvedLocation, Suggestion};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /api/states ─────────────────────────────────────────────

pub async fn states(State(state): State<Arc<AppState>>) -> Json<Vec<&'static str>> {
    Json(state.engine.gazetteer().states())
}

// ─── GET /api/districts ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct DistrictsQuery {
    pub state: Option<String>,
}

pub async fn districts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DistrictsQuery>,
) -> Result<Json<Vec<&'static str>>, ApiError> {
    let name = params.state.as_deref().unwrap_or("").trim();
    if name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'state' parameter"));
    }
    let gazetteer = state.engine.gazetteer();
    let canonical = gazetteer
        .canonical_state(name)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown state '{}'", name)))?;
    Ok(Json(gazetteer.districts_for(canonical).to_vec()))
}

// ─── GET /api/suggest ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SuggestQuery {
    pub q: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestQuery>,
) -> Result<Json<SuggestResponse>, ApiError> {
    let start = Instant::now();

    let text = params.q.as_deref().unwrap_or("").trim().to_string();
    let scope_state = params.state.as_deref().unwrap_or("").trim().to_string();
    let district = params.district.as_deref().unwrap_or("").trim().to_string();
    if text.is_empty() || scope_state.is_empty() || district.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Provide 'q', 'state' and 'district' parameters",
        ));
    }

    let aggregate = state.engine.suggest(&text, &scope_state, &district).await;

    tracing::info!(
        query = %text,
        results = aggregate.suggestions.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "GET /api/suggest"
    );

    Ok(Json(SuggestResponse {
        suggestions: aggregate.suggestions,
        advisory: aggregate.advisory.map(|a| a.to_string()),
    }))
}

// ─── GET /api/reverse ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ReverseQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Serialize)]
pub struct ReverseResponse {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_label: Option<String>,
    pub confidence: Confidence,
}

pub async fn reverse(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseQuery>,
) -> Result<Json<ReverseResponse>, ApiError> {
    let (Some(lat), Some(lon)) = (params.lat, params.lon) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lon' parameters"));
    };

    let outcome = state.engine.reverse_resolve(lat, lon).await.map_err(|e| match e {
        EngineError::InvalidCoordinates { .. } => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    })?;

    Ok(Json(ReverseResponse {
        lat: outcome.coords.lat,
        lng: outcome.coords.lng,
        state: outcome.state.map(String::from),
        district: outcome.district.map(String::from),
        area_label: outcome.area_label,
        confidence: outcome.confidence,
    }))
}

// ─── POST /api/resolve ───────────────────────────────────────────

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(suggestion): Json<Suggestion>,
) -> Result<Json<ResolvedLocation>, ApiError> {
    match state.engine.resolve_suggestion(&suggestion).await {
        Ok(outcome) => Ok(Json(ResolvedLocation {
            lat: outcome.coords.lat,
            lng: outcome.coords.lng,
            source: crate::types::ResolutionSource::ManualSuggestion,
            state: outcome.state.map(String::from),
            district: outcome.district.map(String::from),
            area_label: Some(outcome.label),
            confidence: outcome.confidence,
        })),
        Err(Advisory::ResolutionFailed) => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            Advisory::ResolutionFailed.to_string(),
        )),
        Err(other) => Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, other.to_string())),
    }
}
