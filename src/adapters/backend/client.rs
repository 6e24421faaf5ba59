//! Backend Address Client
//!
//! Calls `GET /api/crypto/address` on the shop backend. Any non-2xx answer,
//! including the `500 {"error": ...}` the backend sends when no address is
//! configured, is reported as a plain status failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::ports::address::{AddressError, AddressPayload, AddressSource};

pub const ADDRESS_PATH: &str = "/api/crypto/address";

/// Backend client configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend base URL, without the route
    pub api_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_millis(5000),
        }
    }
}

impl BackendConfig {
    /// Create config with a custom base URL
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn address_url(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), ADDRESS_PATH)
    }
}

#[derive(Debug, Clone)]
pub struct BackendAddressClient {
    config: BackendConfig,
    http: Client,
}

impl BackendAddressClient {
    pub fn new() -> Result<Self, AddressError> {
        Self::with_config(BackendConfig::default())
    }

    pub fn with_config(config: BackendConfig) -> Result<Self, AddressError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AddressError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

#[async_trait]
impl AddressSource for BackendAddressClient {
    async fn fetch_address(&self) -> Result<AddressPayload, AddressError> {
        let url = self.config.address_url();
        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AddressError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_address_payload(&body)
    }
}

pub fn parse_address_payload(body: &str) -> Result<AddressPayload, AddressError> {
    serde_json::from_str(body).map_err(|e| AddressError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = BackendAddressClient::new().unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_address_url() {
        assert_eq!(
            BackendConfig::default().address_url(),
            "http://localhost:8000/api/crypto/address"
        );
        assert_eq!(
            BackendConfig::with_api_url("https://shop.example.com/").address_url(),
            "https://shop.example.com/api/crypto/address"
        );
    }

    #[test]
    fn test_parse_payload() {
        let payload = parse_address_payload(r#"{"success":true,"address":"0xabc"}"#).unwrap();
        assert_eq!(payload, AddressPayload::success("0xabc"));

        // Missing fields default rather than fail
        let payload = parse_address_payload(r#"{"error":"nope"}"#).unwrap();
        assert!(!payload.success);
        assert!(payload.address.is_none());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_address_payload("not json"),
            Err(AddressError::Malformed(_))
        ));
        assert!(matches!(
            parse_address_payload(r#"{"success":"yes"}"#),
            Err(AddressError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let client = BackendAddressClient::with_config(BackendConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();

        assert!(client.fetch_address().await.is_err());
    }
}
