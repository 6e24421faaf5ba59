use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Quote service returned HTTP {0}")]
    Status(u16),

    #[error("Malformed quote payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for PriceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PriceError::Timeout
        } else if err.is_decode() {
            PriceError::Malformed(err.to_string())
        } else {
            PriceError::Network(err.to_string())
        }
    }
}

/// Spot price source for the fixed asset/fiat pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current price of one unit of the asset in fiat
    async fn spot_price(&self) -> Result<Decimal, PriceError>;
}
