use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};

use crate::analyzer::{blend_compound, classify_sentiment, mean, tone, SentimentAnalyzer};
use crate::error::SentimentError;
use crate::scorer::TextScorer;
use crate::sources::ArticleSource;
use crate::types::{FeedArticle, SentimentResult};

/// Scores a news feed by blending each item's title and content polarity.
pub struct NewsFeedAnalyzer<S> {
    name: String,
    source: S,
    scorer: Arc<dyn TextScorer>,
}

impl<S: ArticleSource> NewsFeedAnalyzer<S> {
    pub fn new(name: &str, source: S, scorer: Arc<dyn TextScorer>) -> Self {
        Self {
            name: name.to_string(),
            source,
            scorer,
        }
    }

    fn score_article(&self, article: &FeedArticle) -> f64 {
        blend_compound(
            self.scorer.compound(&article.title),
            self.scorer.compound(&article.content_text),
        )
    }

    fn score_articles(&self, articles: &[FeedArticle]) -> SentimentResult {
        let collected_at = Utc::now();
        let scores: Vec<f64> = articles.iter().map(|a| self.score_article(a)).collect();

        let mut raw_data = Map::new();
        raw_data.insert("items_analyzed".to_string(), Value::from(articles.len()));

        let Some(average) = mean(&scores) else {
            return SentimentResult::no_data("no feed items found")
                .with_raw_data(raw_data)
                .with_timestamp(collected_at);
        };

        let latest = articles
            .first()
            .and_then(|a| a.published)
            .map_or(Value::Null, |d| Value::String(d.to_rfc3339()));
        raw_data.insert("latest_item_date".to_string(), latest);

        let classification = classify_sentiment(average);
        let interpretation = format!(
            "{classification} - {} coverage is {} across {} items",
            self.name,
            tone(average),
            articles.len()
        );

        SentimentResult::new(average, classification, interpretation)
            .with_raw_data(raw_data)
            .with_timestamp(collected_at)
    }
}

#[async_trait]
impl<S: ArticleSource> SentimentAnalyzer for NewsFeedAnalyzer<S> {
    async fn analyze(&self) -> Result<SentimentResult, SentimentError> {
        let articles = self.source.fetch_articles().await?;
        Ok(self.score_articles(&articles))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::analyzers::test_support::NumericScorer;
    use crate::types::Classification;

    struct FixedArticles(Vec<FeedArticle>);

    #[async_trait]
    impl ArticleSource for FixedArticles {
        async fn fetch_articles(&self) -> Result<Vec<FeedArticle>, SentimentError> {
            Ok(self.0.clone())
        }
    }

    struct FailingArticles;

    #[async_trait]
    impl ArticleSource for FailingArticles {
        async fn fetch_articles(&self) -> Result<Vec<FeedArticle>, SentimentError> {
            Err(SentimentError::Fetch {
                source_name: "feed".to_string(),
                reason: "malformed JSON feed".to_string(),
            })
        }
    }

    fn article(title: f64, content: f64, published: Option<i64>) -> FeedArticle {
        FeedArticle {
            title: title.to_string(),
            content_text: content.to_string(),
            published: published.and_then(|s| DateTime::<Utc>::from_timestamp(s, 0)),
        }
    }

    fn analyzer(articles: Vec<FeedArticle>) -> NewsFeedAnalyzer<FixedArticles> {
        NewsFeedAnalyzer::new("CoinTelegraph", FixedArticles(articles), Arc::new(NumericScorer))
    }

    #[tokio::test]
    async fn blends_title_and_content() {
        let result = analyzer(vec![article(1.0, 0.0, None), article(0.0, 1.0, None)])
            .analyze()
            .await
            .unwrap();
        // (0.6 + 0.4) / 2
        assert!((result.value - 0.5).abs() < 1e-12);
        assert_eq!(result.classification, Classification::Greed);
        assert_eq!(result.raw_data["items_analyzed"], 2);
        assert!(result.interpretation.contains("CoinTelegraph"));
        assert!(result.timestamp.is_some());
    }

    #[tokio::test]
    async fn latest_item_date_comes_from_first_item() {
        let result = analyzer(vec![
            article(0.2, 0.2, Some(1_700_000_000)),
            article(0.2, 0.2, Some(1_800_000_000)),
        ])
        .analyze()
        .await
        .unwrap();
        assert_eq!(
            result.raw_data["latest_item_date"],
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[tokio::test]
    async fn unparsed_first_date_is_null() {
        let result = analyzer(vec![article(0.2, 0.2, None)]).analyze().await.unwrap();
        assert_eq!(result.raw_data["latest_item_date"], Value::Null);
    }

    #[tokio::test]
    async fn empty_feed_is_neutral_no_data() {
        let result = analyzer(vec![]).analyze().await.unwrap();
        assert_eq!(result.value, 0.0);
        assert_eq!(result.classification, Classification::Neutral);
        assert_eq!(result.interpretation, "no feed items found");
        assert_eq!(result.raw_data["items_analyzed"], 0);
    }

    #[tokio::test]
    async fn fetch_failure_becomes_error_result() {
        let a = NewsFeedAnalyzer::new("feed", FailingArticles, Arc::new(NumericScorer));
        let result = a.get_sentiment().await;
        assert!(result.is_error());
        assert!(result.error_reason().unwrap().contains("malformed JSON feed"));
    }
}
