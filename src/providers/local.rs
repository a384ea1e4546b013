//! Offline suggestion search over the gazetteer's local-area glossary.
//!
//! Fully deterministic, no I/O. Ranking tiers, highest first: exact
//! case-insensitive substring > prefix > fuzzy above threshold. Ties break
//! alphabetically.

use crate::gazetteer::Gazetteer;
use crate::normalize::similarity;
use crate::types::{PlaceQuery, Suggestion, SuggestionSource};

const SUBSTRING_SCORE: f64 = 1.0;
const PREFIX_SCORE: f64 = 0.95;

/// Tunable knobs for the offline search.
#[derive(Debug, Clone)]
pub struct LocalSearchConfig {
    pub max_results: usize,
    /// Fuzzy relevance floor for queries longer than `short_query_len`.
    pub fuzzy_threshold: f64,
    /// Relaxed floor for very short queries.
    pub fuzzy_threshold_short: f64,
    pub short_query_len: usize,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            fuzzy_threshold: 0.4,
            fuzzy_threshold_short: 0.3,
            short_query_len: 3,
        }
    }
}

pub struct LocalProvider {
    gazetteer: Gazetteer,
    config: LocalSearchConfig,
}

impl LocalProvider {
    pub fn new(gazetteer: Gazetteer, config: LocalSearchConfig) -> Self {
        Self { gazetteer, config }
    }

    /// Ranked offline suggestions. Empty when no state is chosen or the
    /// (state, district) pair is absent from the gazetteer.
    pub fn search(&self, query: &PlaceQuery) -> Vec<Suggestion> {
        let Some(state) = query
            .state
            .as_deref()
            .and_then(|s| self.gazetteer.canonical_state(s))
        else {
            return Vec::new();
        };

        let district_pool: Vec<&'static str> = match query.district.as_deref() {
            Some(district) => match self.gazetteer.canonical_district(state, district) {
                Some(d) => vec![d],
                None => return Vec::new(),
            },
            None => self.gazetteer.districts_for(state).to_vec(),
        };

        let trimmed = query.text.trim();
        let query_lower = trimmed.to_lowercase();
        let threshold = if trimmed.chars().count() <= self.config.short_query_len {
            self.config.fuzzy_threshold_short
        } else {
            self.config.fuzzy_threshold
        };

        let mut candidates: Vec<(f64, Suggestion)> = Vec::new();
        for district in district_pool {
            for area in self.gazetteer.areas_for(state, district) {
                let Some(score) = score_area(area, &query_lower, trimmed, threshold) else {
                    continue;
                };
                candidates.push((
                    score,
                    Suggestion {
                        id: format!("{district}-{area}"),
                        label: format!("{area}, {district}"),
                        coords: None,
                        source: SuggestionSource::Local,
                        provider_ref: None,
                        state: Some(state.to_string()),
                        district: Some(district.to_string()),
                    },
                ));
            }
        }

        candidates.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.label.cmp(&b.1.label))
        });
        candidates.truncate(self.config.max_results);
        candidates.into_iter().map(|(_, s)| s).collect()
    }
}

fn score_area(area: &str, query_lower: &str, query_raw: &str, threshold: f64) -> Option<f64> {
    let area_lower = area.to_lowercase();
    if area_lower.contains(query_lower) {
        return Some(SUBSTRING_SCORE);
    }
    if area_lower.starts_with(query_lower) {
        return Some(PREFIX_SCORE);
    }
    let relevance = similarity(area, query_raw);
    (relevance >= threshold).then_some(relevance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> LocalProvider {
        LocalProvider::new(Gazetteer::new(), LocalSearchConfig::default())
    }

    fn query(text: &str, state: Option<&str>, district: Option<&str>) -> PlaceQuery {
        PlaceQuery {
            text: text.to_string(),
            state: state.map(String::from),
            district: district.map(String::from),
        }
    }

    #[test]
    fn test_exact_substring_ranked_first() {
        let results = provider().search(&query("Koramangala", Some("Karnataka"), Some("Bengaluru Urban")));
        assert!(!results.is_empty());
        assert_eq!(results[0].label, "Koramangala, Bengaluru Urban");
        assert_eq!(results[0].source, SuggestionSource::Local);
        assert_eq!(results[0].state.as_deref(), Some("Karnataka"));
    }

    #[test]
    fn test_no_state_is_empty() {
        assert!(provider().search(&query("Koramangala", None, None)).is_empty());
    }

    #[test]
    fn test_unknown_pair_is_empty() {
        assert!(provider()
            .search(&query("anything", Some("Karnataka"), Some("Mumbai")))
            .is_empty());
        assert!(provider()
            .search(&query("anything", Some("Atlantis"), None))
            .is_empty());
    }

    #[test]
    fn test_without_district_pools_whole_state() {
        // Kothrud lives under Pune; searching at the state level still finds it.
        let results = provider().search(&query("Kothrud", Some("Maharashtra"), None));
        assert!(results.iter().any(|s| s.label == "Kothrud, Pune"));
    }

    #[test]
    fn test_fuzzy_fallback_above_threshold() {
        // "koramangla" (1 edit away) is not a substring but close enough.
        let results = provider().search(&query("koramangla", Some("Karnataka"), Some("Bengaluru Urban")));
        assert!(results.iter().any(|s| s.label.starts_with("Koramangala")));
    }

    #[test]
    fn test_fuzzy_below_threshold_excluded() {
        let results = provider().search(&query("zzzzzzzz", Some("Karnataka"), Some("Bengaluru Urban")));
        assert!(results.is_empty());
    }

    #[test]
    fn test_short_query_uses_relaxed_threshold() {
        // Substring matches still dominate for short queries.
        let results = provider().search(&query("Heb", Some("Karnataka"), Some("Bengaluru Urban")));
        assert_eq!(results[0].label, "Hebbal, Bengaluru Urban");
    }

    #[test]
    fn test_cap_and_alphabetical_ties() {
        // "a" is a substring of many areas across Delhi's districts; all tie
        // at 1.0, so the first five in label order come back.
        let results = provider().search(&query("a", Some("Delhi"), None));
        assert!(results.len() <= 5);
        let labels: Vec<_> = results.iter().map(|s| s.label.clone()).collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
    }

    #[test]
    fn test_alias_scope_matches() {
        // Scope arrives with a historical spelling; gazetteer still resolves.
        let results = provider().search(&query("Koramangala", Some("Karnataka"), Some("Bangalore Urban")));
        assert_eq!(results[0].district.as_deref(), Some("Bengaluru Urban"));
    }
}
