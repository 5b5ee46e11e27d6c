//! Aggregate history persistence and series analysis.

use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::SentimentError;
use crate::types::AggregateSnapshot;

/// Durable storage for the ordered aggregate history.
pub trait HistoryStore: Send + Sync {
    /// Load the full history. A missing store is an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::History`] if the store exists but cannot be
    /// read or decoded.
    fn load(&self) -> Result<Vec<AggregateSnapshot>, SentimentError>;

    /// Replace the stored history with `history`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::History`] if the write fails.
    fn save(&self, history: &[AggregateSnapshot]) -> Result<(), SentimentError>;
}

/// History stored as a pretty-printed JSON array.
///
/// Saves write a sibling `.tmp` file and rename it over the target, so a
/// crash mid-write leaves the previous history intact.
#[derive(Debug, Clone)]
pub struct JsonFileHistory {
    path: PathBuf,
}

impl JsonFileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn error(&self, reason: impl std::fmt::Display) -> SentimentError {
        SentimentError::History {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl HistoryStore for JsonFileHistory {
    fn load(&self) -> Result<Vec<AggregateSnapshot>, SentimentError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| self.error(format!("malformed history: {e}")))
    }

    fn save(&self, history: &[AggregateSnapshot]) -> Result<(), SentimentError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }

        let json = serde_json::to_string_pretty(history).map_err(|e| self.error(e))?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(|e| self.error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.error(e))?;

        tracing::debug!(path = %self.path.display(), entries = history.len(), "saved history");
        Ok(())
    }
}

/// The non-null values recorded for `source`, in history order.
#[must_use]
pub fn source_series(history: &[AggregateSnapshot], source: &str) -> Vec<(DateTime<Utc>, f64)> {
    history
        .iter()
        .filter_map(|snap| {
            snap.source_values
                .get(source)
                .copied()
                .flatten()
                .map(|v| (snap.timestamp, v))
        })
        .collect()
}

/// The aggregate value of every snapshot, in history order.
#[must_use]
pub fn aggregate_series(history: &[AggregateSnapshot]) -> Vec<(DateTime<Utc>, f64)> {
    history
        .iter()
        .map(|snap| (snap.timestamp, snap.aggregate_value))
        .collect()
}

/// Pearson correlation between two sources over the snapshots where both
/// have a value.
///
/// `None` when fewer than two paired points exist or either series is
/// constant.
#[must_use]
pub fn correlation(history: &[AggregateSnapshot], a: &str, b: &str) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = history
        .iter()
        .filter_map(|snap| {
            let x = snap.source_values.get(a).copied().flatten()?;
            let y = snap.source_values.get(b).copied().flatten()?;
            Some((x, y))
        })
        .collect();
    pearson(&pairs)
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}
