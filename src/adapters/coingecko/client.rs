//! CoinGecko Simple Price Client
//!
//! Fetches the spot price of one asset in one fiat currency from the
//! `/simple/price` endpoint, e.g. `{"ethereum":{"usd":3250.5}}`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::ports::price::{PriceError, PriceOracle};

/// CoinGecko client configuration
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// Full URL of the simple price endpoint
    pub api_url: String,
    /// CoinGecko asset id
    pub asset_id: String,
    /// Fiat currency code
    pub vs_currency: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            asset_id: "ethereum".to_string(),
            vs_currency: "usd".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    http: Client,
}

impl CoinGeckoClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, PriceError> {
        Self::with_config(CoinGeckoConfig::default())
    }

    pub fn with_config(config: CoinGeckoConfig) -> Result<Self, PriceError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PriceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &CoinGeckoConfig {
        &self.config
    }

    async fn fetch(&self) -> Result<Decimal, PriceError> {
        let response = self
            .http
            .get(&self.config.api_url)
            .query(&[
                ("ids", self.config.asset_id.as_str()),
                ("vs_currencies", self.config.vs_currency.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_simple_price(&body, &self.config.asset_id, &self.config.vs_currency)
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoClient {
    async fn spot_price(&self) -> Result<Decimal, PriceError> {
        let price = self.fetch().await?;
        tracing::debug!(
            "{}/{} spot price: {}",
            self.config.asset_id,
            self.config.vs_currency,
            price
        );
        Ok(price)
    }
}

/// Extract `body[asset][currency]` as a non-negative decimal.
///
/// The number is read through its shortest JSON text so `3250.5` stays
/// exactly `3250.5` instead of picking up binary float noise.
pub fn parse_simple_price(body: &str, asset: &str, currency: &str) -> Result<Decimal, PriceError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| PriceError::Malformed(format!("Invalid JSON: {}", e)))?;

    let number = payload
        .get(asset)
        .and_then(|quotes| quotes.get(currency))
        .and_then(Value::as_number)
        .ok_or_else(|| PriceError::Malformed(format!("Missing numeric {}.{}", asset, currency)))?;

    let text = number.to_string();
    let price = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| PriceError::Malformed(format!("Unrepresentable price {}: {}", text, e)))?;

    if price.is_sign_negative() && !price.is_zero() {
        return Err(PriceError::Malformed(format!("Negative price {}", price)));
    }

    Ok(price)
}
