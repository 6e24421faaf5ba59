use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Backend returned HTTP {0}")]
    Status(u16),

    #[error("Malformed address payload: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for AddressError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AddressError::Timeout
        } else if err.is_decode() {
            AddressError::Malformed(err.to_string())
        } else {
            AddressError::Network(err.to_string())
        }
    }
}

/// Body of `GET /api/crypto/address`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddressPayload {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub address: Option<String>,
}

impl AddressPayload {
    pub fn success(address: impl Into<String>) -> Self {
        Self { success: true, address: Some(address.into()) }
    }
}

/// Backend that knows the payment destination
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressSource: Send + Sync {
    async fn fetch_address(&self) -> Result<AddressPayload, AddressError>;
}
