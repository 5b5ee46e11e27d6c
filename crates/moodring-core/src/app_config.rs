use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Reddit script-app credentials for the client-credentials token exchange.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &"[redacted]")
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub sources_path: PathBuf,
    pub history_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub price_api_url: String,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: Option<String>,
}

impl AppConfig {
    /// Reddit credentials, required only when a `reddit` source is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the first missing variable.
    pub fn reddit_credentials(&self) -> Result<RedditCredentials, ConfigError> {
        let require = |value: &Option<String>, var: &str| -> Result<String, ConfigError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToString::to_string)
                .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
        };

        Ok(RedditCredentials {
            client_id: require(&self.reddit_client_id, "REDDIT_CLIENT_ID")?,
            client_secret: require(&self.reddit_client_secret, "REDDIT_CLIENT_SECRET")?,
            user_agent: require(&self.reddit_user_agent, "REDDIT_USER_AGENT")?,
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("history_path", &self.history_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("price_api_url", &self.price_api_url)
            .field(
                "reddit_client_id",
                &self.reddit_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "reddit_client_secret",
                &self.reddit_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("reddit_user_agent", &self.reddit_user_agent)
            .finish()
    }
}
