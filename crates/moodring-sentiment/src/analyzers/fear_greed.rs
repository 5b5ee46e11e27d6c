use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::analyzer::{classify_sentiment, SentimentAnalyzer};
use crate::error::SentimentError;
use crate::sources::IndexSource;
use crate::types::{Classification, IndexReading, SentimentResult};

/// Maps a 0–100 fear/greed index reading onto `[-1, 1]`.
///
/// Fetch failures are returned from [`SentimentAnalyzer::analyze`] as-is.
pub struct FearGreedAnalyzer<S> {
    source: S,
}

impl<S: IndexSource> FearGreedAnalyzer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: IndexSource> SentimentAnalyzer for FearGreedAnalyzer<S> {
    async fn analyze(&self) -> Result<SentimentResult, SentimentError> {
        let reading = self.source.fetch_index().await?;
        Ok(score_reading(&reading))
    }
}

fn score_reading(reading: &IndexReading) -> SentimentResult {
    let value = reading.value / 50.0 - 1.0;
    // The published label wins; an unknown label falls back to our own band.
    let classification = Classification::from_label(&reading.label)
        .filter(|c| !c.is_error())
        .unwrap_or_else(|| classify_sentiment(value));

    let mut raw_data = Map::new();
    raw_data.insert("original_value".to_string(), Value::from(reading.value));
    raw_data.insert(
        "original_classification".to_string(),
        Value::String(reading.label.clone()),
    );

    SentimentResult::new(value, classification, interpret_index(classification))
        .with_raw_data(raw_data)
        .with_timestamp(reading.timestamp)
}

/// Human-readable reading of an index classification.
#[must_use]
pub fn interpret_index(classification: Classification) -> String {
    match classification {
        Classification::ExtremeGreed => {
            "Extreme Greed - Market might be due for a correction".to_string()
        }
        Classification::Greed => "Greed - Market is optimistic".to_string(),
        Classification::Fear => "Fear - Market is pessimistic".to_string(),
        other => format!("{other} - Might be a buying opportunity"),
    }
}
