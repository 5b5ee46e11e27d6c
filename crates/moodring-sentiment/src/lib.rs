//! Sentiment normalization and aggregation pipeline.
//!
//! Polls a fear/greed index, a Reddit discussion listing, and news feeds;
//! maps each onto a common `[-1, 1]` scale with a five-band classification;
//! and combines them into an aggregate that is appended to a JSON history
//! for trend and correlation reporting.

pub mod aggregator;
pub mod analyzer;
pub mod analyzers;
pub mod error;
pub mod export;
pub mod history;
pub mod pipeline;
pub mod scorer;
pub mod sources;
pub mod types;

mod retry;

pub use aggregator::{AggregateOutcome, Aggregator, Contribution, NamedAnalyzer, WeightedComposite};
pub use analyzer::{blend_compound, classify_sentiment, normalize_score, SentimentAnalyzer};
pub use analyzers::{
    bucket_post_score, interpret_index, DiscussionAnalyzer, FearGreedAnalyzer, NewsFeedAnalyzer,
    PostBucket,
};
pub use error::SentimentError;
pub use export::ExportRow;
pub use history::{aggregate_series, correlation, source_series, HistoryStore, JsonFileHistory};
pub use pipeline::{build_analyzers, run_collection, CollectionReport};
pub use scorer::{PolarityScores, TextScorer, VaderScorer};
pub use sources::{
    parse_published_date, ArticleSource, FearGreedClient, HttpSettings, IndexSource, ListingQuery,
    NewsFeedClient, PostSource, PriceClient, PriceContext, RedditClient, SortMode,
};
pub use types::{
    AggregateSnapshot, Classification, DiscussionPost, FeedArticle, IndexReading, SentimentResult,
};
