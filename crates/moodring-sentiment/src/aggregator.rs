//! Concurrent fan-out over the configured analyzers and aggregation of their
//! results into a persisted snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::analyzer::{classify_sentiment, mean, SentimentAnalyzer};
use crate::error::SentimentError;
use crate::history::HistoryStore;
use crate::types::{AggregateSnapshot, SentimentResult};

/// An analyzer with the name and weight it was configured under.
#[derive(Clone)]
pub struct NamedAnalyzer {
    pub name: String,
    pub weight: f64,
    pub analyzer: Arc<dyn SentimentAnalyzer>,
}

impl NamedAnalyzer {
    pub fn new(name: impl Into<String>, weight: f64, analyzer: Arc<dyn SentimentAnalyzer>) -> Self {
        Self {
            name: name.into(),
            weight,
            analyzer,
        }
    }
}

impl std::fmt::Debug for NamedAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedAnalyzer")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// One source's share of the weighted composite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub name: String,
    /// `None` when the source failed this run.
    pub value: Option<f64>,
    pub weight: f64,
    /// `value × weight`, or `0.0` for a failed source.
    pub weighted: f64,
}

/// Weighted view of one run.
///
/// Failed sources contribute `0.0`, so `final_score` is pulled toward
/// neutral; `weight_coverage` is the total weight that actually reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedComposite {
    pub contributions: Vec<Contribution>,
    pub final_score: f64,
    pub weight_coverage: f64,
}

/// Everything produced by one aggregation run.
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    /// The unweighted mean, labelled `Aggregate sentiment based on N analyzers`.
    pub aggregate: SentimentResult,
    /// Successful per-source results in configuration order.
    pub results: Vec<(String, SentimentResult)>,
    pub weighted: WeightedComposite,
    /// The snapshot appended to history.
    pub snapshot: AggregateSnapshot,
}

pub struct Aggregator {
    analyzers: Vec<NamedAnalyzer>,
    history: Vec<AggregateSnapshot>,
    store: Box<dyn HistoryStore>,
}

impl Aggregator {
    /// Build an aggregator, loading prior history from `store`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::History`] if the stored history is unreadable.
    pub fn new(
        analyzers: Vec<NamedAnalyzer>,
        store: Box<dyn HistoryStore>,
    ) -> Result<Self, SentimentError> {
        let history = store.load()?;
        tracing::debug!(
            analyzers = analyzers.len(),
            history_entries = history.len(),
            "aggregator initialized"
        );
        Ok(Self {
            analyzers,
            history,
            store,
        })
    }

    #[must_use]
    pub fn history(&self) -> &[AggregateSnapshot] {
        &self.history
    }

    /// Run every analyzer concurrently and collect the successful results in
    /// configuration order.
    ///
    /// Error results and panicked analyzers are logged and skipped. Results
    /// without a timestamp are stamped with the collection time.
    pub async fn get_all_sentiments(&self) -> Vec<(String, SentimentResult)> {
        let collected_at = Utc::now();
        let handles = self.analyzers.iter().map(|named| {
            let analyzer = Arc::clone(&named.analyzer);
            tokio::spawn(async move { analyzer.get_sentiment().await })
        });
        let outcomes = join_all(handles).await;

        let mut results = Vec::with_capacity(self.analyzers.len());
        for (named, outcome) in self.analyzers.iter().zip(outcomes) {
            match outcome {
                Ok(result) if result.is_error() => {
                    tracing::warn!(
                        source = %named.name,
                        error = result.error_reason().unwrap_or("unknown error"),
                        "sentiment source failed, skipping"
                    );
                }
                Ok(mut result) => {
                    if result.timestamp.is_none() {
                        result.timestamp = Some(collected_at);
                    }
                    tracing::debug!(
                        source = %named.name,
                        value = result.value,
                        classification = %result.classification,
                        "sentiment source analyzed"
                    );
                    results.push((named.name.clone(), result));
                }
                Err(e) => {
                    tracing::warn!(
                        source = %named.name,
                        error = %e,
                        "sentiment analyzer task failed, skipping"
                    );
                }
            }
        }
        results
    }

    /// Run all analyzers, aggregate, and persist the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::NoData`] when every source failed, and
    /// [`SentimentError::History`] when the snapshot cannot be saved.
    pub async fn get_aggregate_sentiment(&mut self) -> Result<AggregateOutcome, SentimentError> {
        let results = self.get_all_sentiments().await;
        self.aggregate_results(results)
    }

    /// Aggregate already-collected results and persist the new snapshot.
    ///
    /// Nothing is written when `results` is empty. If the save fails the
    /// snapshot is dropped from the in-memory history as well.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::NoData`] for an empty batch, and
    /// [`SentimentError::History`] when the snapshot cannot be saved.
    pub fn aggregate_results(
        &mut self,
        results: Vec<(String, SentimentResult)>,
    ) -> Result<AggregateOutcome, SentimentError> {
        let values: Vec<f64> = results.iter().map(|(_, r)| r.value).collect();
        let Some(aggregate_value) = mean(&values) else {
            tracing::error!(
                analyzers = self.analyzers.len(),
                "no sentiment results available"
            );
            return Err(SentimentError::NoData);
        };

        let classification = classify_sentiment(aggregate_value);
        let timestamp = Utc::now();

        let individual: Vec<Value> = results
            .iter()
            .map(|(name, r)| {
                json!({
                    "name": name,
                    "value": r.value,
                    "classification": r.classification,
                    "interpretation": r.interpretation,
                })
            })
            .collect();
        let mut raw_data = Map::new();
        raw_data.insert("individual_results".to_string(), Value::Array(individual));

        let aggregate = SentimentResult::new(
            aggregate_value,
            classification,
            format!("Aggregate sentiment based on {} analyzers", results.len()),
        )
        .with_raw_data(raw_data)
        .with_timestamp(timestamp);

        let source_values: BTreeMap<String, Option<f64>> = self
            .analyzers
            .iter()
            .map(|a| (a.name.clone(), value_for(&results, &a.name)))
            .collect();
        let snapshot = AggregateSnapshot {
            timestamp,
            source_values,
            aggregate_value,
            classification,
        };

        self.history.push(snapshot.clone());
        if let Err(e) = self.store.save(&self.history) {
            self.history.pop();
            return Err(e);
        }

        tracing::info!(
            aggregate = aggregate_value,
            classification = %classification,
            sources = results.len(),
            configured = self.analyzers.len(),
            "aggregate sentiment recorded"
        );

        let weighted = self.weighted_composite(&results);
        Ok(AggregateOutcome {
            aggregate,
            results,
            weighted,
            snapshot,
        })
    }

    /// Weighted composite over every configured analyzer.
    #[must_use]
    pub fn weighted_composite(&self, results: &[(String, SentimentResult)]) -> WeightedComposite {
        let contributions: Vec<Contribution> = self
            .analyzers
            .iter()
            .map(|a| {
                let value = value_for(results, &a.name);
                Contribution {
                    name: a.name.clone(),
                    value,
                    weight: a.weight,
                    weighted: value.map_or(0.0, |v| v * a.weight),
                }
            })
            .collect();

        let final_score = contributions.iter().map(|c| c.weighted).sum();
        let weight_coverage = contributions
            .iter()
            .filter(|c| c.value.is_some())
            .map(|c| c.weight)
            .sum();

        WeightedComposite {
            contributions,
            final_score,
            weight_coverage,
        }
    }
}

fn value_for(results: &[(String, SentimentResult)], name: &str) -> Option<f64> {
    results
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, r)| r.value)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::types::Classification;

    struct Fixed(f64);

    #[async_trait]
    impl SentimentAnalyzer for Fixed {
        async fn analyze(&self) -> Result<SentimentResult, SentimentError> {
            Ok(SentimentResult::new(self.0, classify_sentiment(self.0), "fixed"))
        }
    }

    struct Failing;

    #[async_trait]
    impl SentimentAnalyzer for Failing {
        async fn analyze(&self) -> Result<SentimentResult, SentimentError> {
            Err(SentimentError::Fetch {
                source_name: "down".to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    struct Panicking;

    #[async_trait]
    impl SentimentAnalyzer for Panicking {
        async fn analyze(&self) -> Result<SentimentResult, SentimentError> {
            panic!("scorer blew up");
        }
    }

    /// In-memory store that records every save.
    #[derive(Clone, Default)]
    struct MemoryStore {
        saved: Arc<Mutex<Vec<Vec<AggregateSnapshot>>>>,
        fail_saves: bool,
    }

    impl HistoryStore for MemoryStore {
        fn load(&self) -> Result<Vec<AggregateSnapshot>, SentimentError> {
            Ok(self.saved.lock().unwrap().last().cloned().unwrap_or_default())
        }

        fn save(&self, history: &[AggregateSnapshot]) -> Result<(), SentimentError> {
            if self.fail_saves {
                return Err(SentimentError::History {
                    path: "memory".to_string(),
                    reason: "disk full".to_string(),
                });
            }
            self.saved.lock().unwrap().push(history.to_vec());
            Ok(())
        }
    }

    fn named(name: &str, weight: f64, analyzer: impl SentimentAnalyzer + 'static) -> NamedAnalyzer {
        NamedAnalyzer::new(name, weight, Arc::new(analyzer))
    }

    #[tokio::test]
    async fn aggregate_is_the_exact_mean() {
        let store = MemoryStore::default();
        let mut agg = Aggregator::new(
            vec![
                named("a", 0.5, Fixed(0.5)),
                named("b", 0.5, Fixed(-0.1)),
            ],
            Box::new(store.clone()),
        )
        .unwrap();

        let outcome = agg.get_aggregate_sentiment().await.unwrap();
        assert!((outcome.aggregate.value - 0.2).abs() < 1e-9);
        assert_eq!(outcome.aggregate.classification, Classification::Greed);
        assert_eq!(
            outcome.aggregate.interpretation,
            "Aggregate sentiment based on 2 analyzers"
        );
        assert_eq!(
            outcome.aggregate.raw_data["individual_results"]
                .as_array()
                .unwrap()
                .len(),
            2
        );
        assert_eq!(agg.history().len(), 1);
        assert_eq!(store.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn all_sources_failing_is_no_data_and_writes_nothing() {
        let store = MemoryStore::default();
        let mut agg = Aggregator::new(
            vec![named("a", 0.5, Failing), named("b", 0.5, Failing)],
            Box::new(store.clone()),
        )
        .unwrap();

        let err = agg.get_aggregate_sentiment().await.unwrap_err();
        assert!(matches!(err, SentimentError::NoData));
        assert!(agg.history().is_empty());
        assert!(store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_failure_keeps_successful_results_in_order() {
        let mut agg = Aggregator::new(
            vec![
                named("index", 0.25, Fixed(0.5)),
                named("reddit", 0.25, Failing),
                named("feed", 0.25, Fixed(0.1)),
                named("panics", 0.25, Panicking),
            ],
            Box::new(MemoryStore::default()),
        )
        .unwrap();

        let outcome = agg.get_aggregate_sentiment().await.unwrap();
        let names: Vec<&str> = outcome.results.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["index", "feed"]);
        assert!((outcome.aggregate.value - 0.3).abs() < 1e-9);
        assert_eq!(
            outcome.aggregate.interpretation,
            "Aggregate sentiment based on 2 analyzers"
        );

        assert_eq!(outcome.snapshot.source_values.len(), 4);
        assert_eq!(outcome.snapshot.source_values["reddit"], None);
        assert_eq!(outcome.snapshot.source_values["panics"], None);
        assert_eq!(outcome.snapshot.source_values["index"], Some(0.5));
    }

    #[tokio::test]
    async fn results_are_stamped_with_collection_time() {
        let agg = Aggregator::new(
            vec![named("a", 1.0, Fixed(0.3))],
            Box::new(MemoryStore::default()),
        )
        .unwrap();
        let before = Utc::now();
        let results = agg.get_all_sentiments().await;
        assert_eq!(results.len(), 1);
        assert!(results[0].1.timestamp.unwrap() >= before);
    }

    #[tokio::test]
    async fn failed_save_rolls_back_in_memory_history() {
        let store = MemoryStore {
            fail_saves: true,
            ..MemoryStore::default()
        };
        let mut agg =
            Aggregator::new(vec![named("a", 1.0, Fixed(0.3))], Box::new(store)).unwrap();

        let err = agg.get_aggregate_sentiment().await.unwrap_err();
        assert!(matches!(err, SentimentError::History { .. }));
        assert!(agg.history().is_empty());
    }

    #[tokio::test]
    async fn history_accumulates_across_runs() {
        let store = MemoryStore::default();
        let mut agg = Aggregator::new(
            vec![named("a", 1.0, Fixed(0.3))],
            Box::new(store.clone()),
        )
        .unwrap();
        agg.get_aggregate_sentiment().await.unwrap();
        agg.get_aggregate_sentiment().await.unwrap();

        assert_eq!(agg.history().len(), 2);
        assert_eq!(store.saved.lock().unwrap().last().unwrap().len(), 2);

        let reloaded = Aggregator::new(vec![], Box::new(store)).unwrap();
        assert_eq!(reloaded.history().len(), 2);
    }

    #[test]
    fn weighted_composite_counts_failed_sources_as_zero() {
        let agg = Aggregator::new(
            vec![
                named("index", 0.5, Fixed(0.0)),
                named("reddit", 0.25, Fixed(0.0)),
                named("feed", 0.25, Fixed(0.0)),
            ],
            Box::new(MemoryStore::default()),
        )
        .unwrap();
        let results = vec![
            (
                "index".to_string(),
                SentimentResult::new(0.4, Classification::Greed, "x"),
            ),
            (
                "feed".to_string(),
                SentimentResult::new(-0.8, Classification::ExtremeFear, "x"),
            ),
        ];

        let composite = agg.weighted_composite(&results);
        assert_eq!(composite.contributions.len(), 3);
        assert_eq!(composite.contributions[1].value, None);
        assert_eq!(composite.contributions[1].weighted, 0.0);
        assert!((composite.final_score - 0.0).abs() < 1e-12);
        assert!((composite.weight_coverage - 0.75).abs() < 1e-12);
    }

    #[test]
    fn aggregate_results_rejects_empty_batch() {
        let store = MemoryStore::default();
        let mut agg =
            Aggregator::new(vec![named("a", 1.0, Fixed(0.1))], Box::new(store.clone())).unwrap();
        assert!(matches!(
            agg.aggregate_results(vec![]),
            Err(SentimentError::NoData)
        ));
        assert!(store.saved.lock().unwrap().is_empty());
    }
}
