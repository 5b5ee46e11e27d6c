//! Flat per-run export row for spreadsheet-style sinks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::aggregator::AggregateOutcome;
use crate::sources::PriceContext;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub timestamp: DateTime<Utc>,
    /// Per-source value in configuration order; `None` for failed sources.
    pub source_values: Vec<(String, Option<f64>)>,
    /// Per-source `value × weight` in configuration order.
    pub contributions: Vec<(String, f64)>,
    pub final_score: f64,
    pub price: Option<PriceContext>,
}

impl ExportRow {
    #[must_use]
    pub fn from_outcome(outcome: &AggregateOutcome, price: Option<PriceContext>) -> Self {
        let contributions = &outcome.weighted.contributions;
        Self {
            timestamp: outcome.snapshot.timestamp,
            source_values: contributions
                .iter()
                .map(|c| (c.name.clone(), c.value))
                .collect(),
            contributions: contributions
                .iter()
                .map(|c| (c.name.clone(), c.weighted))
                .collect(),
            final_score: outcome.weighted.final_score,
            price,
        }
    }

    /// Column names matching [`ExportRow::to_cells`].
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["Timestamp".to_string()];
        header.extend(self.source_values.iter().map(|(name, _)| name.clone()));
        header.extend(
            self.contributions
                .iter()
                .map(|(name, _)| format!("{name} (weighted)")),
        );
        header.push("Final Score".to_string());
        header.extend(
            [
                "BTC Price",
                "BTC Price 1h Ago",
                "BTC Change 1h",
                "BTC Price 24h Ago",
                "BTC Change 24h",
            ]
            .map(String::from),
        );
        header
    }

    /// The row as cells: timestamp, raw source values (`null` when
    /// missing), weighted contributions, final score, then price fields
    /// (empty strings when no price was fetched).
    #[must_use]
    pub fn to_cells(&self) -> Vec<Value> {
        let mut cells = vec![Value::String(
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        )];
        cells.extend(
            self.source_values
                .iter()
                .map(|(_, v)| v.map_or(Value::Null, Value::from)),
        );
        cells.extend(self.contributions.iter().map(|(_, w)| Value::from(*w)));
        cells.push(Value::from(self.final_score));

        match &self.price {
            Some(p) => cells.extend([
                Value::from(p.current_price),
                Value::from(p.price_1h_ago),
                Value::String(percent(p.change_1h)),
                Value::from(p.price_24h_ago),
                Value::String(percent(p.change_24h)),
            ]),
            None => cells.extend(std::iter::repeat_n(Value::String(String::new()), 5)),
        }
        cells
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
