use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::analyzer::{blend_compound, classify_sentiment, mean, tone, SentimentAnalyzer};
use crate::error::SentimentError;
use crate::scorer::TextScorer;
use crate::sources::PostSource;
use crate::types::{DiscussionPost, SentimentResult};

/// Posts scoring above this are counted as positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;
/// Posts scoring below this are counted as negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostBucket {
    Positive,
    Negative,
    Neutral,
}

/// Bucket a blended post score. Exactly `±0.05` is neutral.
#[must_use]
pub fn bucket_post_score(score: f64) -> PostBucket {
    if score > POSITIVE_THRESHOLD {
        PostBucket::Positive
    } else if score < NEGATIVE_THRESHOLD {
        PostBucket::Negative
    } else {
        PostBucket::Neutral
    }
}

/// Scores a batch of forum posts by blending title and body polarity.
pub struct DiscussionAnalyzer<S> {
    source: S,
    scorer: Arc<dyn TextScorer>,
}

impl<S: PostSource> DiscussionAnalyzer<S> {
    pub fn new(source: S, scorer: Arc<dyn TextScorer>) -> Self {
        Self { source, scorer }
    }

    /// Blended compound score of one post; a missing body scores `0.0`.
    #[must_use]
    pub fn score_post(&self, post: &DiscussionPost) -> f64 {
        let title = self.scorer.compound(&post.title);
        let body = post
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .map_or(0.0, |b| self.scorer.compound(b));
        blend_compound(title, body)
    }

    fn score_posts(&self, posts: &[DiscussionPost]) -> SentimentResult {
        let scores: Vec<f64> = posts.iter().map(|p| self.score_post(p)).collect();

        let (mut positive, mut negative, mut neutral) = (0usize, 0usize, 0usize);
        for score in &scores {
            match bucket_post_score(*score) {
                PostBucket::Positive => positive += 1,
                PostBucket::Negative => negative += 1,
                PostBucket::Neutral => neutral += 1,
            }
        }

        let mut raw_data = Map::new();
        raw_data.insert("total_posts".to_string(), Value::from(posts.len()));
        raw_data.insert(
            "sentiment_distribution".to_string(),
            json!({ "Positive": positive, "Negative": negative, "Neutral": neutral }),
        );

        let Some(average) = mean(&scores) else {
            return SentimentResult::no_data("no data available").with_raw_data(raw_data);
        };

        #[allow(clippy::cast_precision_loss)]
        let upvotes: Vec<f64> = posts.iter().map(|p| p.score as f64).collect();
        #[allow(clippy::cast_precision_loss)]
        let comments: Vec<f64> = posts.iter().map(|p| p.num_comments as f64).collect();
        raw_data.insert("average_post_score".to_string(), Value::from(average));
        raw_data.insert(
            "average_upvotes".to_string(),
            Value::from(mean(&upvotes).unwrap_or(0.0)),
        );
        raw_data.insert(
            "average_comments".to_string(),
            Value::from(mean(&comments).unwrap_or(0.0)),
        );

        let classification = classify_sentiment(average);
        let interpretation = format!(
            "{classification} - Discussion is {} across {} posts ({positive} positive, {negative} negative, {neutral} neutral)",
            tone(average),
            posts.len(),
        );

        SentimentResult::new(average, classification, interpretation).with_raw_data(raw_data)
    }
}

#[async_trait]
impl<S: PostSource> SentimentAnalyzer for DiscussionAnalyzer<S> {
    async fn analyze(&self) -> Result<SentimentResult, SentimentError> {
        let posts = self.source.fetch_posts().await?;
        Ok(self.score_posts(&posts))
    }
}
