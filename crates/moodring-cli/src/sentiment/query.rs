//! Read-only history query handlers.

use std::collections::BTreeSet;
use std::fmt::{self, Write};

use chrono::{DateTime, Utc};
use moodring_core::AppConfig;
use moodring_sentiment::{
    aggregate_series, correlation, source_series, AggregateSnapshot, HistoryStore,
    JsonFileHistory,
};

/// Number of snapshots listed at the end of the report.
const REPORT_RECENT_SNAPSHOTS: usize = 10;

fn load_history(config: &AppConfig) -> anyhow::Result<Vec<AggregateSnapshot>> {
    Ok(JsonFileHistory::new(&config.history_path).load()?)
}

/// Show the most recent aggregate snapshots.
///
/// # Errors
///
/// Returns an error if the history file exists but cannot be read.
pub(crate) fn run_status(config: &AppConfig, limit: usize) -> anyhow::Result<()> {
    let history = load_history(config)?;
    let mut out = String::new();
    render_status(&mut out, &history, limit)?;
    print!("{out}");
    Ok(())
}

/// Generate a markdown sentiment report.
///
/// # Errors
///
/// Returns an error if the history file exists but cannot be read.
pub(crate) fn run_report(config: &AppConfig) -> anyhow::Result<()> {
    let history = load_history(config)?;
    let mut out = String::new();
    render_report(&mut out, &history, Utc::now())?;
    print!("{out}");
    Ok(())
}

fn render_status(
    out: &mut impl Write,
    history: &[AggregateSnapshot],
    limit: usize,
) -> fmt::Result {
    if history.is_empty() {
        return writeln!(out, "no sentiment history found; run `moodring collect` first");
    }

    writeln!(
        out,
        "{:<22}{:<11}{:<16}SOURCES",
        "CAPTURED", "AGGREGATE", "CLASSIFICATION"
    )?;
    let start = history.len().saturating_sub(limit);
    for snap in history[start..].iter().rev() {
        let reported = snap.source_values.values().filter(|v| v.is_some()).count();
        writeln!(
            out,
            "{:<22}{:<11.3}{:<16}{}/{}",
            snap.timestamp.format("%Y-%m-%d %H:%M UTC").to_string(),
            snap.aggregate_value,
            snap.classification.label(),
            reported,
            snap.source_values.len()
        )?;
    }
    Ok(())
}

fn render_report(
    out: &mut impl Write,
    history: &[AggregateSnapshot],
    now: DateTime<Utc>,
) -> fmt::Result {
    let Some(latest) = history.last() else {
        return writeln!(out, "no sentiment data to report; run `moodring collect` first");
    };

    let sources: Vec<&str> = history
        .iter()
        .flat_map(|snap| snap.source_values.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    writeln!(out, "# Sentiment Report")?;
    writeln!(out)?;
    writeln!(out, "**Generated**: {}", now.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out, "**Snapshots**: {}", history.len())?;
    writeln!(
        out,
        "**Latest aggregate**: {:.3} ({}) at {}",
        latest.aggregate_value,
        latest.classification,
        latest.timestamp.format("%Y-%m-%d %H:%M UTC")
    )?;
    writeln!(out)?;
    writeln!(out, "---")?;
    writeln!(out)?;

    writeln!(out, "## Sources")?;
    writeln!(out)?;
    writeln!(out, "| Source | Latest | Mean | Min | Max | Samples |")?;
    writeln!(out, "|--------|--------|------|-----|-----|---------|")?;
    write_stats_row(out, "Aggregate", &aggregate_series(history))?;
    for source in &sources {
        write_stats_row(out, source, &source_series(history, source))?;
    }
    writeln!(out)?;

    writeln!(out, "## Correlation")?;
    writeln!(out)?;
    if sources.len() < 2 {
        writeln!(out, "Not enough sources to correlate.")?;
    } else {
        writeln!(out, "| | {} |", sources.join(" | "))?;
        writeln!(out, "|---|{}", "---|".repeat(sources.len()))?;
        for a in &sources {
            let cells: Vec<String> = sources
                .iter()
                .map(|b| {
                    if a == b {
                        "1.00".to_string()
                    } else {
                        correlation(history, a, b)
                            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.2}"))
                    }
                })
                .collect();
            writeln!(out, "| {a} | {} |", cells.join(" | "))?;
        }
    }
    writeln!(out)?;

    writeln!(out, "## Recent Snapshots")?;
    writeln!(out)?;
    writeln!(out, "| Captured At | Aggregate | Classification |")?;
    writeln!(out, "|-------------|-----------|----------------|")?;
    let start = history.len().saturating_sub(REPORT_RECENT_SNAPSHOTS);
    for snap in history[start..].iter().rev() {
        writeln!(
            out,
            "| {} | {:.3} | {} |",
            snap.timestamp.format("%Y-%m-%d %H:%M UTC"),
            snap.aggregate_value,
            snap.classification
        )?;
    }

    Ok(())
}

fn write_stats_row(
    out: &mut impl Write,
    label: &str,
    series: &[(DateTime<Utc>, f64)],
) -> fmt::Result {
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    let Some(latest) = values.last() else {
        return writeln!(out, "| {label} | - | - | - | - | 0 |");
    };
    #[allow(clippy::cast_precision_loss)]
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    writeln!(
        out,
        "| {label} | {latest:.3} | {mean:.3} | {min:.3} | {max:.3} | {} |",
        values.len()
    )
}
