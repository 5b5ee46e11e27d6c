//! Concrete analyzers, one per source kind.

mod discussion;
mod fear_greed;
mod news_feed;

pub use discussion::{bucket_post_score, DiscussionAnalyzer, PostBucket};
pub use fear_greed::{interpret_index, FearGreedAnalyzer};
pub use news_feed::NewsFeedAnalyzer;
