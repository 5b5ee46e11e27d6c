//! Fear/greed index client (alternative.me `fng` response shape).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{HttpSettings, IndexSource};
use crate::error::SentimentError;
use crate::types::IndexReading;

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(default)]
    data: Vec<IndexEntry>,
}

/// Value and timestamp arrive as numeric strings, but plain numbers are
/// accepted too.
#[derive(Debug, Deserialize)]
struct IndexEntry {
    value: Value,
    value_classification: String,
    timestamp: Value,
}

pub struct FearGreedClient {
    client: reqwest::Client,
    name: String,
    url: String,
    settings: HttpSettings,
}

impl FearGreedClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(name: &str, url: &str, settings: &HttpSettings) -> Result<Self, SentimentError> {
        Ok(Self {
            client: settings.build_client(name)?,
            name: name.to_string(),
            url: url.to_string(),
            settings: settings.clone(),
        })
    }
}

#[async_trait]
impl IndexSource for FearGreedClient {
    async fn fetch_index(&self) -> Result<IndexReading, SentimentError> {
        let body = self
            .settings
            .fetch_text(|| self.client.get(&self.url))
            .await
            .map_err(|e| SentimentError::fetch(&self.name, e))?;

        parse_index_body(&body).map_err(|reason| SentimentError::fetch(&self.name, reason))
    }
}

pub(crate) fn parse_index_body(body: &str) -> Result<IndexReading, String> {
    let response: IndexResponse =
        serde_json::from_str(body).map_err(|e| format!("malformed index response: {e}"))?;
    let entry = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| "index response contained no data".to_string())?;

    let value = numeric(&entry.value)
        .ok_or_else(|| format!("index value is not numeric: {}", entry.value))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("index value {value} is outside 0-100"));
    }

    let seconds = numeric(&entry.timestamp)
        .ok_or_else(|| format!("index timestamp is not numeric: {}", entry.timestamp))?;
    #[allow(clippy::cast_possible_truncation)]
    let timestamp = DateTime::<Utc>::from_timestamp(seconds as i64, 0)
        .ok_or_else(|| format!("index timestamp {seconds} is out of range"))?;

    Ok(IndexReading {
        value,
        label: entry.value_classification,
        timestamp,
    })
}

fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
