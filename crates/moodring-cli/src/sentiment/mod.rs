//! Sentiment command handlers for the CLI.

mod query;

use std::fmt::{self, Write};

use moodring_core::AppConfig;
use moodring_sentiment::CollectionReport;

pub(crate) use query::{run_report, run_status};

/// Run one collection pass over every configured source.
///
/// When `dry_run` is `true`, prints the configured sources and returns
/// without any network access or history writes.
///
/// # Errors
///
/// Returns an error if the sources file is invalid, a source cannot be
/// configured, every source fails, or the history cannot be saved.
pub(crate) async fn run_collect(
    config: &AppConfig,
    dry_run: bool,
    emit_row: bool,
) -> anyhow::Result<()> {
    let sources = moodring_core::load_sources(&config.sources_path)?;

    if dry_run {
        println!(
            "dry-run: would collect sentiment from {} sources:",
            sources.sources.len()
        );
        for source in &sources.sources {
            println!(
                "  {:<28}{:<12}weight {:.3}",
                source.name,
                source.kind.to_string(),
                source.weight
            );
        }
        return Ok(());
    }

    tracing::info!(
        sources = sources.sources.len(),
        history = %config.history_path.display(),
        "starting sentiment collection"
    );
    let report = moodring_sentiment::run_collection(config, &sources).await?;
    let mut out = String::new();
    render_collection(&mut out, &report)?;
    print!("{out}");

    if emit_row {
        println!("{}", serde_json::to_string(&report.row.to_cells())?);
    }

    Ok(())
}

fn render_collection(out: &mut impl Write, report: &CollectionReport) -> fmt::Result {
    writeln!(out, "{:<28}{:<10}{:<16}WEIGHTED", "SOURCE", "VALUE", "CLASSIFICATION")?;
    for contribution in &report.outcome.weighted.contributions {
        let result = report
            .outcome
            .results
            .iter()
            .find(|(name, _)| name == &contribution.name)
            .map(|(_, r)| r);
        match result {
            Some(r) => {
                writeln!(
                    out,
                    "{:<28}{:<10.3}{:<16}{:.3}",
                    contribution.name,
                    r.value,
                    r.classification.label(),
                    contribution.weighted
                )?;
            }
            None => {
                writeln!(
                    out,
                    "{:<28}{:<10}{:<16}{:.3}",
                    contribution.name, "-", "failed", contribution.weighted
                )?;
            }
        }
    }

    let aggregate = &report.outcome.aggregate;
    writeln!(out)?;
    writeln!(
        out,
        "aggregate: {:.3} ({}) - {}",
        aggregate.value, aggregate.classification, aggregate.interpretation
    )?;
    writeln!(
        out,
        "weighted:  {:.3} (weight coverage {:.0}%)",
        report.outcome.weighted.final_score,
        report.outcome.weighted.weight_coverage * 100.0
    )?;
    if let Some(price) = &report.row.price {
        writeln!(
            out,
            "btc:       ${:.2} (1h {:+.2}%, 24h {:+.2}%)",
            price.current_price,
            price.change_1h * 100.0,
            price.change_24h * 100.0
        )?;
    }
    writeln!(out, "history:   {} snapshots", report.history.len())
}
