//! Outbound data sources: the fear/greed index, Reddit, news feeds and the
//! price ticker.
//!
//! Analyzers depend on the narrow fetch traits below rather than on the HTTP
//! clients, so they can be exercised with in-memory fakes.

mod fear_greed;
mod news_feed;
mod price;
mod reddit;
mod reddit_helpers;
mod rss_helpers;

use std::time::Duration;

use async_trait::async_trait;
use moodring_core::AppConfig;

use crate::error::SentimentError;
use crate::retry::{retry_with_backoff, RequestError};
use crate::types::{DiscussionPost, FeedArticle, IndexReading};

pub use fear_greed::FearGreedClient;
pub use news_feed::{parse_published_date, NewsFeedClient};
pub use price::{PriceClient, PriceContext};
pub use reddit::{ListingQuery, RedditClient, SortMode};

/// Connect timeout ceiling applied to every client.
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[async_trait]
pub trait IndexSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SentimentError::Fetch`] on transport, status or parse failure.
    async fn fetch_index(&self) -> Result<IndexReading, SentimentError>;
}

#[async_trait]
pub trait PostSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SentimentError::Fetch`] on transport, status or parse failure.
    async fn fetch_posts(&self) -> Result<Vec<DiscussionPost>, SentimentError>;
}

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SentimentError::Fetch`] on transport, status or parse failure.
    async fn fetch_articles(&self) -> Result<Vec<FeedArticle>, SentimentError>;
}

/// Timeout, user agent and retry policy shared by the HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl HttpSettings {
    /// Settings with no retries.
    #[must_use]
    pub fn new(timeout_secs: u64, user_agent: &str) -> Self {
        Self {
            timeout_secs,
            user_agent: user_agent.to_string(),
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    #[must_use]
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            timeout_secs: app.request_timeout_secs,
            user_agent: app.user_agent.clone(),
            max_retries: app.max_retries,
            backoff_base_ms: app.retry_backoff_base_ms,
        }
    }

    /// Replace the timeout when a per-source override is set.
    #[must_use]
    pub fn with_timeout_override(mut self, timeout_secs: Option<u64>) -> Self {
        if let Some(secs) = timeout_secs {
            self.timeout_secs = secs;
        }
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    pub(crate) fn build_client(&self, source_name: &str) -> Result<reqwest::Client, SentimentError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(
                self.timeout_secs.min(CONNECT_TIMEOUT_SECS),
            ))
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| {
                SentimentError::Configuration(format!(
                    "failed to build HTTP client for {source_name}: {e}"
                ))
            })
    }

    /// Send the request produced by `build`, retrying per this policy, and
    /// return the body of the first 2xx response.
    pub(crate) async fn fetch_text<F>(&self, build: F) -> Result<String, RequestError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = build();
            async move {
                let response = request.send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(RequestError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: response.url().to_string(),
                    });
                }
                Ok(response.text().await?)
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_override_replaces_global_timeout() {
        let settings = HttpSettings::new(30, "ua").with_timeout_override(Some(5));
        assert_eq!(settings.timeout_secs, 5);
        let settings = HttpSettings::new(30, "ua").with_timeout_override(None);
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn new_settings_do_not_retry() {
        let settings = HttpSettings::new(30, "ua");
        assert_eq!(settings.max_retries, 0);
        let settings = settings.with_retries(3, 250);
        assert_eq!((settings.max_retries, settings.backoff_base_ms), (3, 250));
    }
}
