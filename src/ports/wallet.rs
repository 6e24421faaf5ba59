//! Wallet Provider Port
//!
//! The EIP-1193 capability surface of an injected browser wallet, reduced to
//! what the session consumes: account requests plus the `accountsChanged` and
//! `chainChanged` events.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Prompts the user to authorize accounts
pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
/// Lists already-authorized accounts without prompting
pub const ETH_ACCOUNTS: &str = "eth_accounts";

/// User rejected the request
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// A request of the same kind is already pending in the wallet
pub const REQUEST_ALREADY_PENDING: i64 = -32002;
/// Generic internal error
pub const INTERNAL_ERROR: i64 = -32603;

/// Error object returned by a provider request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED_REQUEST, "User rejected the request.")
    }

    pub fn already_pending() -> Self {
        Self::new(
            REQUEST_ALREADY_PENDING,
            "Request of type 'wallet_requestPermissions' already pending",
        )
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }

    pub fn is_already_pending(&self) -> bool {
        self.code == REQUEST_ALREADY_PENDING
    }
}

/// Event names the session listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
}

impl ProviderEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderEventKind::AccountsChanged => "accountsChanged",
            ProviderEventKind::ChainChanged => "chainChanged",
        }
    }
}

/// Event raised by the provider outside of any user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// New list of authorized accounts, possibly empty
    AccountsChanged(Vec<String>),
    /// New chain id as a hex string
    ChainChanged(String),
}

impl ProviderEvent {
    pub fn kind(&self) -> ProviderEventKind {
        match self {
            ProviderEvent::AccountsChanged(_) => ProviderEventKind::AccountsChanged,
            ProviderEvent::ChainChanged(_) => ProviderEventKind::ChainChanged,
        }
    }
}

/// Listener registered with `on` and removed again by identity (`Arc::ptr_eq`)
pub type EventHandler = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Injected wallet provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// True when this object identifies as MetaMask (`isMetaMask`)
    fn is_metamask(&self) -> bool;

    /// Individual providers when several extensions share one injected
    /// object; empty for a plain provider
    fn providers(&self) -> Vec<Arc<dyn WalletProvider>> {
        Vec::new()
    }

    /// Raw JSON-RPC request
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, ProviderRpcError>;

    fn on(&self, kind: ProviderEventKind, handler: EventHandler);

    fn remove_listener(&self, kind: ProviderEventKind, handler: &EventHandler);

    /// `eth_requestAccounts`: may prompt the user
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderRpcError> {
        parse_accounts(self.request(ETH_REQUEST_ACCOUNTS, None).await?)
    }

    /// `eth_accounts`: never prompts
    async fn accounts(&self) -> Result<Vec<String>, ProviderRpcError> {
        parse_accounts(self.request(ETH_ACCOUNTS, None).await?)
    }
}

/// Decode an account list result. `null` is treated as no accounts.
pub fn parse_accounts(value: Value) -> Result<Vec<String>, ProviderRpcError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(account) => Ok(account),
                other => Err(ProviderRpcError::new(
                    INTERNAL_ERROR,
                    format!("Account entry is not a string: {}", other),
                )),
            })
            .collect(),
        other => Err(ProviderRpcError::new(
            INTERNAL_ERROR,
            format!("Unexpected accounts result: {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_accounts() {
        let accounts = parse_accounts(json!(["0xabc", "0xdef"])).unwrap();
        assert_eq!(accounts, vec!["0xabc".to_string(), "0xdef".to_string()]);

        assert!(parse_accounts(json!([])).unwrap().is_empty());
        assert!(parse_accounts(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_parse_accounts_malformed() {
        let err = parse_accounts(json!([1, 2])).unwrap_err();
        assert_eq!(err.code, INTERNAL_ERROR);

        let err = parse_accounts(json!({"accounts": []})).unwrap_err();
        assert_eq!(err.code, INTERNAL_ERROR);
    }

    #[test]
    fn test_error_codes() {
        assert!(ProviderRpcError::user_rejected().is_user_rejected());
        assert!(ProviderRpcError::already_pending().is_already_pending());

        let other = ProviderRpcError::new(-32000, "header not found");
        assert!(!other.is_user_rejected());
        assert!(!other.is_already_pending());
        assert_eq!(other.to_string(), "Provider error -32000: header not found");
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(
            ProviderEvent::AccountsChanged(vec![]).kind().as_str(),
            "accountsChanged"
        );
        assert_eq!(
            ProviderEvent::ChainChanged("0x1".into()).kind(),
            ProviderEventKind::ChainChanged
        );
    }
}
