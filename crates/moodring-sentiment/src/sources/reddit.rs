//! Reddit listing client (client-credentials OAuth).

use async_trait::async_trait;
use moodring_core::RedditCredentials;
use serde::Deserialize;

use super::reddit_helpers::to_post;
use super::{HttpSettings, PostSource};
use crate::error::SentimentError;
use crate::types::DiscussionPost;

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
/// Reddit caps listing pages at 100 children.
const PAGE_LIMIT: usize = 100;

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reddit listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Post>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Post {
    pub(super) data: PostData,
}

#[derive(Debug, Deserialize)]
pub(super) struct PostData {
    pub(super) title: Option<String>,
    pub(super) selftext: Option<String>,
    pub(super) score: Option<i64>,
    pub(super) num_comments: Option<i64>,
}

/// Listing ordering. Unrecognized names fall back to [`SortMode::New`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    New,
    Hot,
    Top,
    Rising,
}

impl SortMode {
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => SortMode::New,
            "hot" => SortMode::Hot,
            "top" => SortMode::Top,
            "rising" => SortMode::Rising,
            other => {
                tracing::warn!(sort = other, "unrecognized sort mode, falling back to new");
                SortMode::New
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::New => "new",
            SortMode::Hot => "hot",
            SortMode::Top => "top",
            SortMode::Rising => "rising",
        }
    }
}

/// Which subreddit listing to read and how many posts to collect.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    pub subreddit: String,
    pub sort: SortMode,
    pub limit: usize,
}

/// Reddit API client. A fresh token is exchanged on every fetch.
pub struct RedditClient {
    client: reqwest::Client,
    name: String,
    credentials: RedditCredentials,
    query: ListingQuery,
    settings: HttpSettings,
    token_url: String,
    api_base: String,
}

impl RedditClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(
        name: &str,
        credentials: RedditCredentials,
        query: ListingQuery,
        settings: &HttpSettings,
    ) -> Result<Self, SentimentError> {
        // oauth.reddit.com sometimes blocks rustls via TLS fingerprinting.
        // If rejected, enable `native-tls` on reqwest and call `.use_native_tls()`.
        Ok(Self {
            client: settings.build_client(name)?,
            name: name.to_string(),
            credentials,
            query,
            settings: settings.clone(),
            token_url: TOKEN_URL.to_string(),
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the token exchange and listing requests at other hosts.
    #[must_use]
    pub fn with_endpoints(mut self, token_url: &str, api_base: &str) -> Self {
        self.token_url = token_url.to_string();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_token(&self) -> Result<String, SentimentError> {
        let body = self
            .settings
            .fetch_text(|| {
                self.client
                    .post(&self.token_url)
                    .header("User-Agent", &self.credentials.user_agent)
                    .basic_auth(
                        &self.credentials.client_id,
                        Some(&self.credentials.client_secret),
                    )
                    .form(&[("grant_type", "client_credentials")])
            })
            .await
            .map_err(|e| SentimentError::fetch(&self.name, format!("token exchange failed: {e}")))?;

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| SentimentError::fetch(&self.name, format!("token parse error: {e}")))?;
        Ok(token.access_token)
    }

    async fn fetch_page(
        &self,
        token: &str,
        page_size: usize,
        after: Option<&str>,
    ) -> Result<ListingData, SentimentError> {
        let endpoint = format!(
            "{}/r/{}/{}",
            self.api_base,
            self.query.subreddit,
            self.query.sort.as_str()
        );
        let mut params: Vec<(&str, String)> = vec![
            ("limit", page_size.to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor.to_string()));
        }

        let body = self
            .settings
            .fetch_text(|| {
                self.client
                    .get(&endpoint)
                    .header("Authorization", format!("Bearer {token}"))
                    .header("User-Agent", &self.credentials.user_agent)
                    .query(&params)
            })
            .await
            .map_err(|e| SentimentError::fetch(&self.name, e))?;

        let listing: Listing = serde_json::from_str(&body).map_err(|e| {
            SentimentError::fetch(&self.name, format!("Reddit response parse error: {e}"))
        })?;
        Ok(listing.data)
    }
}

#[async_trait]
impl PostSource for RedditClient {
    async fn fetch_posts(&self) -> Result<Vec<DiscussionPost>, SentimentError> {
        let token = self.fetch_token().await?;
        let mut posts = Vec::new();
        let mut after: Option<String> = None;

        while posts.len() < self.query.limit {
            let page_size = (self.query.limit - posts.len()).min(PAGE_LIMIT);
            let page = self.fetch_page(&token, page_size, after.as_deref()).await?;
            let fetched = page.children.len();

            posts.extend(page.children.iter().filter_map(to_post));

            after = page.after;
            if after.is_none() || fetched == 0 {
                break;
            }
        }
        posts.truncate(self.query.limit);

        tracing::debug!(
            source = %self.name,
            subreddit = %self.query.subreddit,
            sort = self.query.sort.as_str(),
            posts = posts.len(),
            "collected Reddit posts"
        );

        Ok(posts)
    }
}
