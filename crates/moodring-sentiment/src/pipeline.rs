//! Sentiment pipeline orchestration.

use std::sync::Arc;

use moodring_core::{AppConfig, SourceConfig, SourceKind, SourcesFile};

use crate::aggregator::{AggregateOutcome, Aggregator, NamedAnalyzer};
use crate::analyzer::SentimentAnalyzer;
use crate::analyzers::{DiscussionAnalyzer, FearGreedAnalyzer, NewsFeedAnalyzer};
use crate::error::SentimentError;
use crate::export::ExportRow;
use crate::history::JsonFileHistory;
use crate::scorer::{TextScorer, VaderScorer};
use crate::sources::{
    FearGreedClient, HttpSettings, ListingQuery, NewsFeedClient, PriceClient, RedditClient,
    SortMode,
};
use crate::types::AggregateSnapshot;

const DEFAULT_SUBREDDIT: &str = "CryptoCurrency";
const DEFAULT_LISTING_LIMIT: u32 = 100;

/// Result of one collection run.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub outcome: AggregateOutcome,
    pub row: ExportRow,
    /// Full history including the snapshot recorded by this run.
    pub history: Vec<AggregateSnapshot>,
}

/// Construct one analyzer per configured source, in configuration order.
///
/// # Errors
///
/// Returns [`SentimentError::Configuration`] when a source is missing a
/// required setting (a URL, or Reddit credentials) or its HTTP client cannot
/// be built.
pub fn build_analyzers(
    app: &AppConfig,
    sources: &[SourceConfig],
    scorer: &Arc<dyn TextScorer>,
) -> Result<Vec<NamedAnalyzer>, SentimentError> {
    sources
        .iter()
        .map(|source| {
            let analyzer = build_analyzer(app, source, scorer)?;
            Ok(NamedAnalyzer::new(&source.name, source.weight, analyzer))
        })
        .collect()
}

fn build_analyzer(
    app: &AppConfig,
    source: &SourceConfig,
    scorer: &Arc<dyn TextScorer>,
) -> Result<Arc<dyn SentimentAnalyzer>, SentimentError> {
    let settings = HttpSettings::from_app_config(app).with_timeout_override(source.timeout_secs);
    let require_url = || {
        source.url.as_deref().ok_or_else(|| {
            SentimentError::Configuration(format!(
                "source '{}' ({}) requires a url",
                source.name, source.kind
            ))
        })
    };

    let analyzer: Arc<dyn SentimentAnalyzer> = match source.kind {
        SourceKind::FearGreed => {
            let client = FearGreedClient::new(&source.name, require_url()?, &settings)?;
            Arc::new(FearGreedAnalyzer::new(client))
        }
        SourceKind::Reddit => {
            let credentials = app.reddit_credentials()?;
            let query = ListingQuery {
                subreddit: source
                    .subreddit
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SUBREDDIT.to_string()),
                sort: source
                    .sort
                    .as_deref()
                    .map_or(SortMode::New, SortMode::parse_lenient),
                limit: source.limit.unwrap_or(DEFAULT_LISTING_LIMIT) as usize,
            };
            let client = RedditClient::new(&source.name, credentials, query, &settings)?;
            Arc::new(DiscussionAnalyzer::new(client, Arc::clone(scorer)))
        }
        SourceKind::NewsFeed => {
            let client = NewsFeedClient::new(&source.name, require_url()?, &settings)?;
            Arc::new(NewsFeedAnalyzer::new(
                &source.name,
                client,
                Arc::clone(scorer),
            ))
        }
    };

    tracing::debug!(source = %source.name, kind = %source.kind, weight = source.weight, "analyzer configured");
    Ok(analyzer)
}

/// Run every configured analyzer once, record the aggregate in the history
/// file, and attach the current Bitcoin price when it can be fetched.
///
/// A failed price fetch is logged and leaves the price columns blank.
///
/// # Errors
///
/// Returns [`SentimentError::NoData`] when every source failed, or a
/// configuration or history error.
pub async fn run_collection(
    app: &AppConfig,
    sources: &SourcesFile,
) -> Result<CollectionReport, SentimentError> {
    let scorer: Arc<dyn TextScorer> = Arc::new(VaderScorer::new());
    let analyzers = build_analyzers(app, &sources.sources, &scorer)?;
    let store = JsonFileHistory::new(&app.history_path);
    let mut aggregator = Aggregator::new(analyzers, Box::new(store))?;

    let outcome = aggregator.get_aggregate_sentiment().await?;

    let price_client = PriceClient::new(&app.price_api_url, &HttpSettings::from_app_config(app))?;
    let price = match price_client.fetch_bitcoin_price().await {
        Ok(price) => Some(price),
        Err(e) => {
            tracing::warn!(error = %e, "price fetch failed, exporting without price context");
            None
        }
    };

    let row = ExportRow::from_outcome(&outcome, price);
    Ok(CollectionReport {
        outcome,
        row,
        history: aggregator.history().to_vec(),
    })
}
