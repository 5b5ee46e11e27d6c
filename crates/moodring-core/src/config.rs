use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files. Use it in tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests can
/// use a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let env = parse_environment(&or_default("MOODRING_ENV", "development"))?;
    let log_level = or_default("MOODRING_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default(
        "MOODRING_SOURCES_PATH",
        "./config/sources.yaml",
    ));
    let history_path = PathBuf::from(or_default(
        "MOODRING_HISTORY_PATH",
        "./sentiment_history.json",
    ));

    let request_timeout_secs = parse_u64("MOODRING_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "MOODRING_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default("MOODRING_USER_AGENT", "moodring/0.1 (sentiment-tracker)");
    let max_retries = parse_u32("MOODRING_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("MOODRING_RETRY_BACKOFF_BASE_MS", "500")?;
    let price_api_url = or_default(
        "MOODRING_PRICE_API_URL",
        "https://api.alternative.me/v2/ticker/?limit=1",
    );

    let reddit_client_id = lookup("REDDIT_CLIENT_ID").ok();
    let reddit_client_secret = lookup("REDDIT_CLIENT_SECRET").ok();
    let reddit_user_agent = lookup("REDDIT_USER_AGENT").ok();

    Ok(AppConfig {
        env,
        log_level,
        sources_path,
        history_path,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        price_api_url,
        reddit_client_id,
        reddit_client_secret,
        reddit_user_agent,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MOODRING_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}
