//! Secondary provider: open geocoder (Nominatim jsonv2 wire format).
//!
//! Search is issued with the composed scope "<query>, <district>, <state>,
//! India" and returns coordinates directly. The same endpoint family serves
//! reverse geocoding, id lookup, and single-result forward search.

use crate::cancel::QueryToken;
use crate::providers::{
    AutocompleteProvider, Geocoder, ProviderFailure, ProviderPlace, COUNTRY_CODE, COUNTRY_NAME,
};
use crate::types::{Coordinates, PlaceQuery, Suggestion, SuggestionSource};
use async_trait::async_trait;
use serde_json::Value;

pub struct SecondaryProvider {
    client: reqwest::Client,
    base_url: String,
    limit: usize,
}

impl SecondaryProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, limit: usize) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            limit,
        }
    }

    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ProviderFailure> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .header("Accept-Language", "en")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("secondary geocoder transport failure: {e}");
                ProviderFailure::Unavailable
            })?;
        if !resp.status().is_success() {
            tracing::warn!("secondary geocoder returned HTTP {}", resp.status());
            return Err(ProviderFailure::Unavailable);
        }
        resp.json::<Value>().await.map_err(|e| {
            tracing::warn!("secondary geocoder returned non-JSON body: {e}");
            ProviderFailure::Unavailable
        })
    }

    /// "<query>, <district>, <state>, India" — narrows the free-text search
    /// to the user's administrative scope.
    fn composed_query(query: &PlaceQuery) -> String {
        let mut parts = vec![query.text.trim().to_string()];
        if let Some(district) = query.district.as_deref() {
            parts.push(district.to_string());
        }
        if let Some(state) = query.state.as_deref() {
            parts.push(state.to_string());
        }
        parts.push(COUNTRY_NAME.to_string());
        parts.join(", ")
    }
}

#[async_trait]
impl AutocompleteProvider for SecondaryProvider {
    async fn suggest(
        &self,
        query: &PlaceQuery,
        token: &QueryToken,
    ) -> Result<Vec<Suggestion>, ProviderFailure> {
        if token.is_cancelled() {
            return Err(ProviderFailure::Cancelled);
        }
        let composed = Self::composed_query(query);
        let limit = self.limit.to_string();
        let body = self
            .fetch(
                "/search",
                &[
                    ("format", "jsonv2"),
                    ("limit", limit.as_str()),
                    ("countrycodes", COUNTRY_CODE),
                    ("addressdetails", "1"),
                    ("q", composed.as_str()),
                ],
            )
            .await?;
        if token.is_cancelled() {
            return Err(ProviderFailure::Cancelled);
        }
        parse_search(&body, query)
    }

    async fn resolve(&self, suggestion: &Suggestion) -> Option<ProviderPlace> {
        let osm_id = suggestion.provider_ref.as_deref()?;
        let body = self
            .fetch(
                "/lookup",
                &[("format", "jsonv2"), ("addressdetails", "1"), ("osm_ids", osm_id)],
            )
            .await
            .ok()?;
        body.as_array()?.first().and_then(parse_place)
    }
}

#[async_trait]
impl Geocoder for SecondaryProvider {
    async fn reverse(&self, coords: Coordinates) -> Option<ProviderPlace> {
        let lat = coords.lat.to_string();
        let lon = coords.lng.to_string();
        let body = self
            .fetch(
                "/reverse",
                &[
                    ("format", "jsonv2"),
                    ("addressdetails", "1"),
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                ],
            )
            .await
            .ok()?;
        parse_place(&body)
    }

    async fn locate(&self, text: &str) -> Option<ProviderPlace> {
        let body = self
            .fetch(
                "/search",
                &[
                    ("format", "jsonv2"),
                    ("limit", "1"),
                    ("countrycodes", COUNTRY_CODE),
                    ("addressdetails", "1"),
                    ("q", text),
                ],
            )
            .await
            .ok()?;
        body.as_array()?.first().and_then(parse_place)
    }
}

fn coord_field(value: &Value) -> Option<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value.as_f64())
}

/// Map one search payload into suggestions; entries with missing or invalid
/// coordinates are dropped rather than failing the batch.
fn parse_search(body: &Value, query: &PlaceQuery) -> Result<Vec<Suggestion>, ProviderFailure> {
    let entries = body.as_array().ok_or(ProviderFailure::Unavailable)?;

    let mut out = Vec::new();
    for entry in entries {
        let Some(label) = entry["display_name"].as_str() else {
            continue;
        };
        let coords = match (coord_field(&entry["lat"]), coord_field(&entry["lon"])) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon).ok(),
            _ => None,
        };
        let Some(coords) = coords else {
            continue;
        };

        let osm_ref = match (entry["osm_type"].as_str(), osm_id(entry)) {
            (Some(t), Some(id)) => {
                Some(format!("{}{}", t.chars().next().unwrap_or('N').to_ascii_uppercase(), id))
            }
            _ => None,
        };
        let id = entry["place_id"]
            .as_u64()
            .map(|v| v.to_string())
            .or_else(|| osm_ref.clone())
            .unwrap_or_else(|| label.to_string());

        let address = &entry["address"];
        out.push(Suggestion {
            id,
            label: label.to_string(),
            coords: Some(coords),
            source: SuggestionSource::Secondary,
            provider_ref: osm_ref,
            state: address["state"].as_str().map(String::from).or_else(|| query.state.clone()),
            district: address["county"]
                .as_str()
                .or_else(|| address["district"].as_str())
                .or_else(|| address["state_district"].as_str())
                .map(String::from)
                .or_else(|| query.district.clone()),
        });
    }
    Ok(out)
}

/// Map a single reverse / lookup / locate entry into a concrete place.
fn parse_place(entry: &Value) -> Option<ProviderPlace> {
    let lat = coord_field(&entry["lat"])?;
    let lon = coord_field(&entry["lon"])?;
    let coords = Coordinates::new(lat, lon).ok()?;

    let address = &entry["address"];
    let field = |keys: &[&str]| -> Option<String> {
        keys.iter()
            .find_map(|k| address[*k].as_str())
            .map(String::from)
    };

    Some(ProviderPlace {
        coords,
        label: entry["display_name"].as_str().map(String::from),
        short_label: field(&["suburb", "village", "neighbourhood", "town", "city"]),
        state: field(&["state"]),
        district: field(&["county", "district", "state_district"]),
    })
}

fn osm_id(entry: &Value) -> Option<String> {
    entry["osm_id"]
        .as_u64()
        .map(|v| v.to_string())
        .or_else(|| entry["osm_id"].as_str().map(String::from))
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
    fn test_composed_query() {
        assert_eq!(
            SecondaryProvider::composed_query(&scoped_query()),
            "Koramangala, Bengaluru Urban, Karnataka, India"
        );
        let bare = PlaceQuery { text: "Koramangala".into(), state: None, district: None };
        assert_eq!(SecondaryProvider::composed_query(&bare), "Koramangala, India");
    }

    #[test]
    fn test_parse_search() {
        let body = serde_json::json!([
            {
                "place_id": 4321,
                "osm_type": "node",
                "osm_id": 98765,
                "lat": "12.9352",
                "lon": "77.6245",
                "display_name": "Koramangala, Bengaluru Urban, Karnataka, India",
                "address": {"state": "Karnataka", "county": "Bengaluru Urban"}
            }
        ]);
        let out = parse_search(&body, &scoped_query()).unwrap();
        assert_eq!(out.len(), 1);
        let s = &out[0];
        assert_eq!(s.source, SuggestionSource::Secondary);
        assert_eq!(s.provider_ref.as_deref(), Some("N98765"));
        assert_eq!(s.id, "4321");
        let coords = s.coords.unwrap();
        assert!((coords.lat - 12.9352).abs() < 1e-6);
        assert_eq!(s.district.as_deref(), Some("Bengaluru Urban"));
    }

    #[test]
    fn test_parse_search_skips_bad_entries() {
        let body = serde_json::json!([
            {"display_name": "no coordinates"},
            {"display_name": "bad lat", "lat": "91.5", "lon": "10.0"},
            {"display_name": "good", "lat": "19.0", "lon": "72.8"}
        ]);
        let out = parse_search(&body, &scoped_query()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "good");
    }

    #[test]
    fn test_parse_search_non_array_fails_closed() {
        let body = serde_json::json!({"error": "rate limited"});
        assert_eq!(
            parse_search(&body, &scoped_query()).unwrap_err(),
            ProviderFailure::Unavailable
        );
    }

    #[test]
    fn test_parse_search_falls_back_to_scope() {
        let body = serde_json::json!([
            {"display_name": "somewhere", "lat": "12.9", "lon": "77.6"}
        ]);
        let out = parse_search(&body, &scoped_query()).unwrap();
        assert_eq!(out[0].state.as_deref(), Some("Karnataka"));
        assert_eq!(out[0].district.as_deref(), Some("Bengaluru Urban"));
    }

    #[test]
    fn test_parse_place_reverse_shape() {
        let entry = serde_json::json!({
            "lat": "19.0760",
            "lon": "72.8777",
            "display_name": "Dadar, Mumbai, Maharashtra, India",
            "address": {
                "suburb": "Dadar",
                "state": "Maharashtra",
                "county": "Mumbai",
                "postcode": "400014"
            }
        });
        let place = parse_place(&entry).unwrap();
        assert_eq!(place.short_label.as_deref(), Some("Dadar"));
        assert_eq!(place.state.as_deref(), Some("Maharashtra"));
        assert_eq!(place.district.as_deref(), Some("Mumbai"));
    }

    #[test]
    fn test_parse_place_short_label_fallback_chain() {
        let entry = serde_json::json!({
            "lat": 19.0,
            "lon": 72.8,
            "address": {"city": "Mumbai", "state": "Maharashtra"}
        });
        let place = parse_place(&entry).unwrap();
        assert_eq!(place.short_label.as_deref(), Some("Mumbai"));
    }

    #[test]
    fn test_parse_place_invalid_coords() {
        let entry = serde_json::json!({"lat": "200.0", "lon": "72.8"});
        assert!(parse_place(&entry).is_none());
    }
}
