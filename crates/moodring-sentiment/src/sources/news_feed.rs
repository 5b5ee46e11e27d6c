//! News feed client. Reads JSON Feed documents, and RSS 2.0 when the body
//! is XML.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use super::rss_helpers::parse_rss_items;
use super::{ArticleSource, HttpSettings};
use crate::error::SentimentError;
use crate::types::FeedArticle;

/// Naive timestamp formats tried in order; all are read as UTC.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Deserialize)]
struct JsonFeed {
    #[serde(default)]
    items: Vec<JsonFeedItem>,
}

#[derive(Debug, Deserialize)]
struct JsonFeedItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content_text: Option<String>,
    #[serde(default)]
    date_published: Option<String>,
}

pub struct NewsFeedClient {
    client: reqwest::Client,
    name: String,
    url: String,
    settings: HttpSettings,
}

impl NewsFeedClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(name: &str, url: &str, settings: &HttpSettings) -> Result<Self, SentimentError> {
        Ok(Self {
            client: settings.build_client(name)?,
            name: name.to_string(),
            url: url.to_string(),
            settings: settings.clone(),
        })
    }
}

#[async_trait]
impl ArticleSource for NewsFeedClient {
    async fn fetch_articles(&self) -> Result<Vec<FeedArticle>, SentimentError> {
        let body = self
            .settings
            .fetch_text(|| self.client.get(&self.url))
            .await
            .map_err(|e| SentimentError::fetch(&self.name, e))?;

        let articles =
            parse_feed_body(&body).map_err(|reason| SentimentError::fetch(&self.name, reason))?;
        tracing::debug!(source = %self.name, items = articles.len(), "fetched feed items");
        Ok(articles)
    }
}

pub(crate) fn parse_feed_body(body: &str) -> Result<Vec<FeedArticle>, String> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        return parse_rss_items(trimmed).map_err(|e| format!("malformed RSS feed: {e}"));
    }

    let feed: JsonFeed =
        serde_json::from_str(trimmed).map_err(|e| format!("malformed JSON feed: {e}"))?;
    Ok(feed
        .items
        .into_iter()
        .map(|item| FeedArticle {
            title: item.title.unwrap_or_default(),
            content_text: item.content_text.unwrap_or_default(),
            published: item.date_published.as_deref().and_then(parse_published_date),
        })
        .collect())
}

/// Parse a feed item's publication date.
///
/// Tries, in order: ISO-8601 with fractional seconds and `Z`, ISO-8601 with
/// `Z`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`, then RFC 3339 and RFC 2822 with
/// offsets. Returns `None` when nothing matches.
#[must_use]
pub fn parse_published_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
