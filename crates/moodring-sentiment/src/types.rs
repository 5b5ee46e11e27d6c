use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Five-band sentiment classification, plus a marker for failed analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "Extreme Fear")]
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    #[serde(rename = "Extreme Greed")]
    ExtremeGreed,
    Error,
}

impl Classification {
    /// The display label, e.g. `"Extreme Fear"`.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Classification::ExtremeFear => "Extreme Fear",
            Classification::Fear => "Fear",
            Classification::Neutral => "Neutral",
            Classification::Greed => "Greed",
            Classification::ExtremeGreed => "Extreme Greed",
            Classification::Error => "Error",
        }
    }

    /// Parse a label leniently: case, underscores, hyphens and repeated
    /// whitespace are ignored, so `"extreme_greed"` and `"Extreme  Greed"`
    /// both map to [`Classification::ExtremeGreed`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "extreme fear" => Some(Classification::ExtremeFear),
            "fear" => Some(Classification::Fear),
            "neutral" => Some(Classification::Neutral),
            "greed" => Some(Classification::Greed),
            "extreme greed" => Some(Classification::ExtremeGreed),
            "error" => Some(Classification::Error),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Classification::Error
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of one analyzer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// Normalized score in `[-1.0, 1.0]`.
    pub value: f64,
    pub classification: Classification,
    pub interpretation: String,
    #[serde(default)]
    pub raw_data: Map<String, Value>,
    /// Filled in by the aggregator when the analyzer leaves it empty.
    pub timestamp: Option<DateTime<Utc>>,
}

impl SentimentResult {
    /// Build a result, clamping `value` into `[-1.0, 1.0]`. A `NaN` value
    /// becomes `0.0`.
    #[must_use]
    pub fn new(value: f64, classification: Classification, interpretation: impl Into<String>) -> Self {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(-1.0, 1.0)
        };
        Self {
            value,
            classification,
            interpretation: interpretation.into(),
            raw_data: Map::new(),
            timestamp: None,
        }
    }

    /// A failed analysis: value `0.0`, classification `Error`, and the
    /// reason recorded under `raw_data["error"]`.
    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut raw_data = Map::new();
        raw_data.insert("error".to_string(), Value::String(reason.clone()));
        Self {
            value: 0.0,
            classification: Classification::Error,
            interpretation: format!("Analysis failed: {reason}"),
            raw_data,
            timestamp: Some(Utc::now()),
        }
    }

    /// An empty batch: value `0.0`, classification `Neutral`.
    #[must_use]
    pub fn no_data(interpretation: impl Into<String>) -> Self {
        Self::new(0.0, Classification::Neutral, interpretation)
    }

    #[must_use]
    pub fn with_raw_data(mut self, raw_data: Map<String, Value>) -> Self {
        self.raw_data = raw_data;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.classification.is_error()
    }

    /// The recorded failure reason, if this is an error result.
    #[must_use]
    pub fn error_reason(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        self.raw_data.get("error").and_then(Value::as_str)
    }
}

/// One persisted aggregation run.
///
/// `source_values` has an entry for every configured source; sources that
/// failed or were skipped are stored as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub timestamp: DateTime<Utc>,
    pub source_values: BTreeMap<String, Option<f64>>,
    pub aggregate_value: f64,
    pub classification: Classification,
}

/// A reading from a 0–100 fear/greed index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexReading {
    pub value: f64,
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

/// A discussion-forum post.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscussionPost {
    pub title: String,
    /// `None` when the post has no self text or it was deleted/removed.
    pub body: Option<String>,
    pub score: i64,
    pub num_comments: i64,
}

/// A news-feed item.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedArticle {
    pub title: String,
    pub content_text: String,
    pub published: Option<DateTime<Utc>>,
}
