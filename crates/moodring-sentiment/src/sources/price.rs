//! Bitcoin spot price context from the alternative.me v2 ticker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::HttpSettings;
use crate::error::SentimentError;

const SOURCE_NAME: &str = "price ticker";
/// Ticker id of Bitcoin on alternative.me.
const BITCOIN_TICKER_ID: &str = "1";

/// Current price and trailing changes. Changes are fractions, so `0.012`
/// means +1.2 %.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceContext {
    pub current_price: f64,
    pub price_1h_ago: f64,
    pub price_24h_ago: f64,
    pub change_1h: f64,
    pub change_24h: f64,
    pub fetched_at: DateTime<Utc>,
}

pub struct PriceClient {
    client: reqwest::Client,
    url: String,
    settings: HttpSettings,
}

impl PriceClient {
    /// # Errors
    ///
    /// Returns [`SentimentError::Configuration`] if the HTTP client cannot be built.
    pub fn new(url: &str, settings: &HttpSettings) -> Result<Self, SentimentError> {
        Ok(Self {
            client: settings.build_client(SOURCE_NAME)?,
            url: url.to_string(),
            settings: settings.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns [`SentimentError::Fetch`] if the ticker cannot be fetched or
    /// lacks the expected fields.
    pub async fn fetch_bitcoin_price(&self) -> Result<PriceContext, SentimentError> {
        let body = self
            .settings
            .fetch_text(|| self.client.get(&self.url))
            .await
            .map_err(|e| SentimentError::fetch(SOURCE_NAME, e))?;

        parse_ticker_body(&body, Utc::now()).map_err(|reason| SentimentError::fetch(SOURCE_NAME, reason))
    }
}

pub(crate) fn parse_ticker_body(body: &str, fetched_at: DateTime<Utc>) -> Result<PriceContext, String> {
    let json: Value = serde_json::from_str(body).map_err(|e| format!("malformed ticker response: {e}"))?;
    let usd = json
        .get("data")
        .and_then(|data| data.get(BITCOIN_TICKER_ID))
        .and_then(|ticker| ticker.get("quotes"))
        .and_then(|quotes| quotes.get("USD"))
        .ok_or_else(|| "ticker response has no data.1.quotes.USD".to_string())?;

    let field = |key: &str| -> Result<f64, String> {
        usd.get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("ticker quote is missing numeric '{key}'"))
    };

    let current_price = field("price")?;
    let change_1h = field("percentage_change_1h")? / 100.0;
    let change_24h = field("percentage_change_24h")? / 100.0;

    Ok(PriceContext {
        current_price,
        price_1h_ago: price_before(current_price, change_1h)?,
        price_24h_ago: price_before(current_price, change_24h)?,
        change_1h,
        change_24h,
        fetched_at,
    })
}

fn price_before(current: f64, change: f64) -> Result<f64, String> {
    let factor = 1.0 + change;
    if factor <= 0.0 {
        return Err(format!("price change {change} implies a non-positive prior price"));
    }
    Ok(current / factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKER: &str = r#"{
        "data": {"1": {"id": 1, "name": "Bitcoin", "symbol": "BTC",
            "quotes": {"USD": {"price": 50500.0, "percentage_change_1h": 1.0, "percentage_change_24h": -5.0}}}},
        "metadata": {"timestamp": 1700000000}
    }"#;

    #[test]
    fn derives_prior_prices_from_percentage_changes() {
        let ctx = parse_ticker_body(TICKER, Utc::now()).unwrap();
        assert_eq!(ctx.current_price, 50500.0);
        assert!((ctx.change_1h - 0.01).abs() < 1e-12);
        assert!((ctx.change_24h + 0.05).abs() < 1e-12);
        assert!((ctx.price_1h_ago - 50000.0).abs() < 1e-6);
        assert!((ctx.price_24h_ago - 53157.894_736_842).abs() < 1e-3);
    }

    #[test]
    fn missing_quote_is_an_error() {
        let err = parse_ticker_body(r#"{"data":{}}"#, Utc::now()).unwrap_err();
        assert!(err.contains("quotes.USD"));
    }

    #[test]
    fn total_loss_change_is_rejected() {
        let body = r#"{"data":{"1":{"quotes":{"USD":{"price":1.0,"percentage_change_1h":-100.0,"percentage_change_24h":0.0}}}}}"#;
        assert!(parse_ticker_body(body, Utc::now()).unwrap_err().contains("non-positive"));
    }
}
