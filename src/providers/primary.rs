//! Primary provider: commercial autocomplete endpoint (Google Places
//! compatible wire format).
//!
//! Autocomplete returns lightweight (reference key, label) pairs without
//! coordinates; the details endpoint supplies coordinates plus structured
//! administrative components on selection.

use crate::cancel::QueryToken;
use crate::providers::{AutocompleteProvider, ProviderFailure, ProviderPlace, COUNTRY_CODE};
use crate::types::{Coordinates, PlaceQuery, Suggestion, SuggestionSource};
use async_trait::async_trait;
use serde_json::Value;

pub struct PrimaryProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limit: usize,
}

impl PrimaryProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>, limit: usize) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            limit,
        }
    }

    async fn fetch(&self, url: String, params: &[(&str, &str)]) -> Result<Value, ProviderFailure> {
        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("primary autocomplete transport failure: {e}");
                ProviderFailure::Unavailable
            })?;
        if !resp.status().is_success() {
            tracing::warn!("primary autocomplete returned HTTP {}", resp.status());
            return Err(ProviderFailure::Unavailable);
        }
        resp.json::<Value>().await.map_err(|e| {
            tracing::warn!("primary autocomplete returned non-JSON body: {e}");
            ProviderFailure::Unavailable
        })
    }
}

#[async_trait]
impl AutocompleteProvider for PrimaryProvider {
    async fn suggest(
        &self,
        query: &PlaceQuery,
        token: &QueryToken,
    ) -> Result<Vec<Suggestion>, ProviderFailure> {
        // Without a key the provider is simply absent from the fan-out.
        if self.api_key.is_empty() {
            return Ok(Vec::new());
        }
        if token.is_cancelled() {
            return Err(ProviderFailure::Cancelled);
        }

        let components = format!("country:{COUNTRY_CODE}");
        let body = self
            .fetch(
                format!("{}/autocomplete/json", self.base_url),
                &[
                    ("input", query.text.trim()),
                    ("components", components.as_str()),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await?;

        if token.is_cancelled() {
            return Err(ProviderFailure::Cancelled);
        }
        parse_autocomplete(&body, query, self.limit)
    }

    async fn resolve(&self, suggestion: &Suggestion) -> Option<ProviderPlace> {
        let reference = suggestion.provider_ref.as_deref()?;
        if self.api_key.is_empty() {
            return None;
        }
        let body = self
            .fetch(
                format!("{}/details/json", self.base_url),
                &[
                    ("place_id", reference),
                    ("fields", "geometry,address_component"),
                    ("key", self.api_key.as_str()),
                ],
            )
            .await
            .ok()?;
        parse_details(&body)
    }
}

/// Map the autocomplete payload into suggestions, failing closed on any
/// unexpected shape. A provider-level deny status counts as unavailable so
/// the advisory surfaces; an explicit empty result set does not.
fn parse_autocomplete(
    body: &Value,
    query: &PlaceQuery,
    limit: usize,
) -> Result<Vec<Suggestion>, ProviderFailure> {
    match body["status"].as_str() {
        Some("OK") => {}
        Some("ZERO_RESULTS") => return Ok(Vec::new()),
        other => {
            tracing::warn!("primary autocomplete status {:?}", other);
            return Err(ProviderFailure::Unavailable);
        }
    }
    let predictions = body["predictions"].as_array().ok_or(ProviderFailure::Unavailable)?;

    let mut out = Vec::new();
    for prediction in predictions.iter().take(limit) {
        let (Some(place_id), Some(description)) = (
            prediction["place_id"].as_str(),
            prediction["description"].as_str(),
        ) else {
            continue;
        };
        out.push(Suggestion {
            id: place_id.to_string(),
            label: description.to_string(),
            coords: None,
            source: SuggestionSource::Primary,
            provider_ref: Some(place_id.to_string()),
            state: query.state.clone(),
            district: query.district.clone(),
        });
    }
    Ok(out)
}

/// Pull coordinates and administrative components out of a details payload.
fn parse_details(body: &Value) -> Option<ProviderPlace> {
    if body["status"].as_str() != Some("OK") {
        return None;
    }
    let result = &body["result"];
    let location = &result["geometry"]["location"];
    let lat = location["lat"].as_f64()?;
    let lng = location["lng"].as_f64()?;
    let coords = Coordinates::new(lat, lng).ok()?;

    let components = result["address_components"].as_array();
    let component = |wanted: &str| -> Option<String> {
        components?
            .iter()
            .find(|c| {
                c["types"]
                    .as_array()
                    .is_some_and(|t| t.iter().any(|v| v.as_str() == Some(wanted)))
            })
            .and_then(|c| c["long_name"].as_str().or_else(|| c["short_name"].as_str()))
            .map(String::from)
    };

    Some(ProviderPlace {
        coords,
        label: result["formatted_address"].as_str().map(String::from),
        short_label: component("sublocality")
            .or_else(|| component("neighborhood"))
            .or_else(|| component("locality")),
        state: component("administrative_area_level_1"),
        district: component("administrative_area_level_2"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoped_query() -> PlaceQuery {
        PlaceQuery {
            text: "Koramangala".into(),
            state: Some("Karnataka".into()),
            district: Some("Bengaluru Urban".into()),
        }
    }

    #[test]
    fn test_parse_autocomplete_ok() {
        let body = serde_json::json!({
            "status": "OK",
            "predictions": [
                {"place_id": "p1", "description": "Koramangala, Bengaluru"},
                {"place_id": "p2", "description": "Koramangala 4th Block"}
            ]
        });
        let out = parse_autocomplete(&body, &scoped_query(), 6).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].provider_ref.as_deref(), Some("p1"));
        assert_eq!(out[0].source, SuggestionSource::Primary);
        assert!(out[0].coords.is_none());
        assert_eq!(out[0].state.as_deref(), Some("Karnataka"));
    }

    #[test]
    fn test_parse_autocomplete_zero_results() {
        let body = serde_json::json!({"status": "ZERO_RESULTS", "predictions": []});
        assert!(parse_autocomplete(&body, &scoped_query(), 6).unwrap().is_empty());
    }

    #[test]
    fn test_parse_autocomplete_denied_is_unavailable() {
        let body = serde_json::json!({"status": "REQUEST_DENIED", "error_message": "bad key"});
        assert_eq!(
            parse_autocomplete(&body, &scoped_query(), 6).unwrap_err(),
            ProviderFailure::Unavailable
        );
    }

    #[test]
    fn test_parse_autocomplete_malformed_fails_closed() {
        let body = serde_json::json!({"status": "OK", "predictions": "nope"});
        assert!(parse_autocomplete(&body, &scoped_query(), 6).is_err());
    }

    #[test]
    fn test_parse_autocomplete_respects_limit() {
        let predictions: Vec<Value> = (0..10)
            .map(|i| serde_json::json!({"place_id": format!("p{i}"), "description": format!("d{i}")}))
            .collect();
        let body = serde_json::json!({"status": "OK", "predictions": predictions});
        assert_eq!(parse_autocomplete(&body, &scoped_query(), 6).unwrap().len(), 6);
    }

    #[test]
    fn test_parse_details() {
        let body = serde_json::json!({
            "status": "OK",
            "result": {
                "formatted_address": "Koramangala, Bengaluru, Karnataka, India",
                "geometry": {"location": {"lat": 12.9352, "lng": 77.6245}},
                "address_components": [
                    {"long_name": "Koramangala", "types": ["sublocality", "political"]},
                    {"long_name": "Bengaluru Urban", "types": ["administrative_area_level_2"]},
                    {"long_name": "Karnataka", "types": ["administrative_area_level_1"]}
                ]
            }
        });
        let place = parse_details(&body).unwrap();
        assert!((place.coords.lat - 12.9352).abs() < 1e-6);
        assert_eq!(place.state.as_deref(), Some("Karnataka"));
        assert_eq!(place.district.as_deref(), Some("Bengaluru Urban"));
        assert_eq!(place.short_label.as_deref(), Some("Koramangala"));
    }

    #[test]
    fn test_parse_details_invalid_coords_rejected() {
        let body = serde_json::json!({
            "status": "OK",
            "result": {"geometry": {"location": {"lat": 123.0, "lng": 77.0}}}
        });
        assert!(parse_details(&body).is_none());
    }

    #[test]
    fn test_parse_details_missing_geometry() {
        let body = serde_json::json!({"status": "OK", "result": {}});
        assert!(parse_details(&body).is_none());
    }
}
