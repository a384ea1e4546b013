//! Suggestion aggregation: debounce, generation-tagged cancellation,
//! concurrent provider fan-out, and the merge/dedupe/rank step.
//!
//! One call to [`SuggestionAggregator::search`] is one logical query. Rapid
//! successive calls supersede each other: only the last one in a burst
//! survives its debounce window, and a stale generation can never produce a
//! visible result even if its network calls complete late.

use crate::cancel::GenerationCounter;
use crate::providers::{AutocompleteProvider, LocalProvider, ProviderFailure};
use crate::types::{Advisory, PlaceQuery, Suggestion};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Quiet interval a keystroke burst must survive before the fan-out runs.
    pub debounce: Duration,
    /// Queries shorter than this never reach any provider.
    pub min_query_len: usize,
    /// Cap on the merged suggestion list.
    pub max_merged: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_len: 3,
            max_merged: 8,
        }
    }
}

/// Outcome of one aggregation round.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    pub suggestions: Vec<Suggestion>,
    pub advisory: Option<Advisory>,
    /// Superseded by a newer query; the caller must not touch its list.
    pub cancelled: bool,
}

impl Aggregate {
    fn empty() -> Self {
        Self::default()
    }

    fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }
}

pub struct SuggestionAggregator {
    primary: Arc<dyn AutocompleteProvider>,
    secondary: Arc<dyn AutocompleteProvider>,
    local: LocalProvider,
    generations: GenerationCounter,
    config: AggregatorConfig,
}

impl SuggestionAggregator {
    pub fn new(
        primary: Arc<dyn AutocompleteProvider>,
        secondary: Arc<dyn AutocompleteProvider>,
        local: LocalProvider,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            local,
            generations: GenerationCounter::new(),
            config,
        }
    }

    /// Supersede any in-flight query without starting a new one.
    pub fn invalidate(&self) {
        self.generations.invalidate_all();
    }

    /// Run one debounced, cancellable aggregation round.
    ///
    /// Preconditions: trimmed text of at least `min_query_len` characters
    /// and a complete (state, district) scope — otherwise the result is
    /// immediately empty and no provider is contacted.
    pub async fn search(&self, query: &PlaceQuery) -> Aggregate {
        let trimmed = query.text.trim();
        if trimmed.chars().count() < self.config.min_query_len
            || query.state.is_none()
            || query.district.is_none()
        {
            return Aggregate::empty();
        }

        let token = self.generations.issue();
        tokio::time::sleep(self.config.debounce).await;
        if token.is_cancelled() {
            tracing::debug!("query '{trimmed}' superseded during debounce");
            return Aggregate::cancelled();
        }

        let local = self.local.search(query);
        let (primary, secondary) = tokio::join!(
            self.primary.suggest(query, &token),
            self.secondary.suggest(query, &token),
        );
        if token.is_cancelled() {
            tracing::debug!("query '{trimmed}' superseded after fan-out");
            return Aggregate::cancelled();
        }

        let mut degraded = false;
        let primary = fold_failure(primary, &mut degraded);
        let secondary = fold_failure(secondary, &mut degraded);

        let suggestions = merge([primary, secondary, local], self.config.max_merged);
        let advisory = if degraded {
            Some(Advisory::ProviderDegraded)
        } else if suggestions.is_empty() {
            Some(Advisory::NoMatches)
        } else {
            None
        };

        Aggregate {
            suggestions,
            advisory,
            cancelled: false,
        }
    }
}

/// A provider failure becomes an empty contribution; only non-cancellation
/// failures mark the round as degraded.
fn fold_failure(
    result: Result<Vec<Suggestion>, ProviderFailure>,
    degraded: &mut bool,
) -> Vec<Suggestion> {
    match result {
        Ok(list) => list,
        Err(ProviderFailure::Cancelled) => Vec::new(),
        Err(ProviderFailure::Unavailable) => {
            *degraded = true;
            Vec::new()
        }
    }
}

/// Merge provider lists in fixed priority order, deduplicating by
/// case-insensitive label. On a duplicate the earlier (higher-priority)
/// entry keeps its attributes.
fn merge(lists: [Vec<Suggestion>; 3], cap: usize) -> Vec<Suggestion> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for suggestion in list {
            if seen.insert(suggestion.label.to_lowercase()) {
                out.push(suggestion);
            }
        }
    }
    out.truncate(cap);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::QueryToken;
    use crate::gazetteer::Gazetteer;
    use crate::providers::local::LocalSearchConfig;
    use crate::providers::ProviderPlace;
    use crate::types::{Coordinates, SuggestionSource};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn suggestion(label: &str, source: SuggestionSource) -> Suggestion {
        Suggestion {
            id: label.to_lowercase().replace(' ', "-"),
            label: label.to_string(),
            coords: matches!(source, SuggestionSource::Secondary)
                .then(|| Coordinates::new(12.9, 77.6).unwrap()),
            source,
            provider_ref: None,
            state: None,
            district: None,
        }
    }

    /// Test double: counts calls, optionally delays, returns a fixed answer.
    struct FakeProvider {
        source: SuggestionSource,
        labels: Vec<String>,
        delay: Duration,
        outcome: Result<(), ProviderFailure>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn returning(source: SuggestionSource, labels: &[&str]) -> Self {
            Self {
                source,
                labels: labels.iter().map(|s| s.to_string()).collect(),
                delay: Duration::ZERO,
                outcome: Ok(()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(source: SuggestionSource) -> Self {
            Self {
                outcome: Err(ProviderFailure::Unavailable),
                ..Self::returning(source, &[])
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AutocompleteProvider for FakeProvider {
        async fn suggest(
            &self,
            _query: &PlaceQuery,
            token: &QueryToken,
        ) -> Result<Vec<Suggestion>, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if token.is_cancelled() {
                return Err(ProviderFailure::Cancelled);
            }
            self.outcome?;
            Ok(self
                .labels
                .iter()
                .map(|l| suggestion(l, self.source))
                .collect())
        }

        async fn resolve(&self, _suggestion: &Suggestion) -> Option<ProviderPlace> {
            None
        }
    }

    fn local_provider() -> LocalProvider {
        LocalProvider::new(Gazetteer::new(), LocalSearchConfig::default())
    }

    fn scoped(text: &str) -> PlaceQuery {
        PlaceQuery {
            text: text.to_string(),
            state: Some("Karnataka".into()),
            district: Some("Bengaluru Urban".into()),
        }
    }

    fn aggregator(
        primary: Arc<FakeProvider>,
        secondary: Arc<FakeProvider>,
        config: AggregatorConfig,
    ) -> SuggestionAggregator {
        SuggestionAggregator::new(primary, secondary, local_provider(), config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_issues_no_calls() {
        let primary = Arc::new(FakeProvider::returning(SuggestionSource::Primary, &["A"]));
        let secondary = Arc::new(FakeProvider::returning(SuggestionSource::Secondary, &["B"]));
        let agg = aggregator(primary.clone(), secondary.clone(), AggregatorConfig::default());

        let out = agg.search(&scoped("Ko")).await;
        assert!(out.suggestions.is_empty());
        assert!(!out.cancelled);
        assert_eq!(primary.calls(), 0);
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_scope_issues_no_calls() {
        let primary = Arc::new(FakeProvider::returning(SuggestionSource::Primary, &["A"]));
        let secondary = Arc::new(FakeProvider::returning(SuggestionSource::Secondary, &["B"]));
        let agg = aggregator(primary.clone(), secondary.clone(), AggregatorConfig::default());

        let query = PlaceQuery {
            text: "Koramangala".into(),
            state: Some("Karnataka".into()),
            district: None,
        };
        assert!(agg.search(&query).await.suggestions.is_empty());
        assert_eq!(primary.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_drops_superseded_burst() {
        let primary = Arc::new(FakeProvider::returning(SuggestionSource::Primary, &["First"]));
        let secondary = Arc::new(FakeProvider::returning(SuggestionSource::Secondary, &["Second"]));
        let agg = aggregator(primary.clone(), secondary.clone(), AggregatorConfig::default());

        // Both queries begin inside one debounce window; polling order makes
        // the second the current generation before either sleep elapses.
        let q1 = scoped("Koramang");
        let q2 = scoped("Koramangala");
        let (first, second) = tokio::join!(agg.search(&q1), agg.search(&q2));

        assert!(first.cancelled);
        assert!(!second.cancelled);
        // The superseded generation never reached the providers.
        assert_eq!(primary.calls(), 1);
        assert_eq!(secondary.calls(), 1);
        assert!(second.suggestions.iter().any(|s| s.label == "First"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_completion_discarded() {
        let primary = Arc::new(
            FakeProvider::returning(SuggestionSource::Primary, &["Slow answer"])
                .with_delay(Duration::from_millis(200)),
        );
        let secondary = Arc::new(FakeProvider::returning(SuggestionSource::Secondary, &[]));
        let config = AggregatorConfig {
            debounce: Duration::ZERO,
            ..AggregatorConfig::default()
        };
        let agg = Arc::new(aggregator(primary.clone(), secondary.clone(), config));

        let racing = {
            let agg = Arc::clone(&agg);
            tokio::spawn(async move { agg.search(&scoped("Koramangala")).await })
        };
        // Let the first query enter its fan-out, then supersede it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let newer = agg.search(&scoped("Koramangala 4th Block")).await;
        let stale = racing.await.unwrap();

        assert!(stale.cancelled, "stale generation must never surface results");
        assert!(!newer.cancelled);
        // Both generations reached the provider; only the newer one counts.
        assert_eq!(primary.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_discards_in_flight(){
        let primary = Arc::new(
            FakeProvider::returning(SuggestionSource::Primary, &["X"]).with_delay(Duration::from_millis(100)),
        );
        let secondary = Arc::new(FakeProvider::returning(SuggestionSource::Secondary, &[]));
        let config = AggregatorConfig { debounce: Duration::ZERO, ..AggregatorConfig::default() };
        let agg = Arc::new(aggregator(primary, secondary, config));

        let pending = {
            let agg = Arc::clone(&agg);
            tokio::spawn(async move { agg.search(&scoped("Koramangala")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        agg.invalidate();
        assert!(pending.await.unwrap().cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_degrades_not_aborts() {
        let primary = Arc::new(FakeProvider::failing(SuggestionSource::Primary));
        let secondary = Arc::new(FakeProvider::returning(SuggestionSource::Secondary, &["Kept"]));
        let agg = aggregator(primary, secondary, AggregatorConfig::default());

        let out = agg.search(&scoped("Koramangala")).await;
        assert_eq!(out.advisory, Some(Advisory::ProviderDegraded));
        assert!(out.suggestions.iter().any(|s| s.label == "Kept"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_empty_yields_no_matches_hint() {
        let primary = Arc::new(FakeProvider::returning(SuggestionSource::Primary, &[]));
        let secondary = Arc::new(FakeProvider::returning(SuggestionSource::Secondary, &[]));
        let agg = aggregator(primary, secondary, AggregatorConfig::default());

        // No local glossary entry matches this text either.
        let out = agg.search(&scoped("Qqqqqqq")).await;
        assert!(out.suggestions.is_empty());
        assert_eq!(out.advisory, Some(Advisory::NoMatches));
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_results_present_in_merge() {
        let primary = Arc::new(FakeProvider::returning(SuggestionSource::Primary, &[]));
        let secondary = Arc::new(FakeProvider::returning(SuggestionSource::Secondary, &[]));
        let agg = aggregator(primary, secondary, AggregatorConfig::default());

        let out = agg.search(&scoped("Koramangala")).await;
        assert!(out
            .suggestions
            .iter()
            .any(|s| s.label == "Koramangala, Bengaluru Urban" && s.source == SuggestionSource::Local));
        assert!(out.advisory.is_none());
    }

    #[test]
    fn test_merge_dedupes_case_insensitive_keeping_priority() {
        let primary = vec![suggestion("Koramangala, Bengaluru", SuggestionSource::Primary)];
        let secondary = vec![suggestion("KORAMANGALA, BENGALURU", SuggestionSource::Secondary)];
        let merged = merge([primary, secondary, Vec::new()], 8);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, SuggestionSource::Primary);
        // The higher-priority entry's attributes survive.
        assert!(merged[0].coords.is_none());
    }

    #[test]
    fn test_merge_priority_order_and_cap() {
        let primary: Vec<_> = (0..4)
            .map(|i| suggestion(&format!("P{i}"), SuggestionSource::Primary))
            .collect();
        let secondary: Vec<_> = (0..4)
            .map(|i| suggestion(&format!("S{i}"), SuggestionSource::Secondary))
            .collect();
        let local: Vec<_> = (0..4)
            .map(|i| suggestion(&format!("L{i}"), SuggestionSource::Local))
            .collect();
        let merged = merge([primary, secondary, local], 8);
        assert_eq!(merged.len(), 8);
        assert_eq!(merged[0].label, "P0");
        assert_eq!(merged[4].label, "S0");
        assert!(merged.iter().all(|s| !s.label.starts_with('L')));
    }
}
