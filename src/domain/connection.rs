//! Wallet Connection State
//!
//! The connection lifecycle of the page's wallet session. An account only
//! exists inside `ConnectionState::Connected`, so the "account present iff
//! connected" rule is carried by the type rather than checked at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("Account string is empty")]
    Empty,
    #[error("Account is not a 0x-prefixed hex string: {0}")]
    InvalidFormat(String),
}

/// An authorized wallet account, normalized to lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    /// Parse an account string as returned by the wallet provider.
    ///
    /// Providers may hand back checksummed (mixed case) addresses; the
    /// session always stores the lowercase form.
    pub fn parse(raw: &str) -> Result<Self, AccountError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AccountError::Empty);
        }

        let lowered = trimmed.to_ascii_lowercase();
        let digits = lowered
            .strip_prefix("0x")
            .ok_or_else(|| AccountError::InvalidFormat(trimmed.to_string()))?;

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AccountError::InvalidFormat(trimmed.to_string()));
        }

        Ok(Self(lowered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines, e.g. `0xabcd…1234`
    pub fn short(&self) -> String {
        if self.0.len() <= 12 {
            return self.0.clone();
        }
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet connection lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "status", content = "account", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No account is authorized for this session
    #[default]
    Disconnected,
    /// An authorization request is outstanding
    Connecting,
    /// The first authorized account is active
    Connected(Account),
}

impl ConnectionState {
    pub fn account(&self) -> Option<&Account> {
        match self {
            ConnectionState::Connected(account) => Some(account),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, ConnectionState::Connecting)
    }

    /// Returns a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Wallet not connected",
            ConnectionState::Connecting => "Waiting for wallet approval",
            ConnectionState::Connected(_) => "Connected successfully",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0xAbC0000000000000000000000000000000000DeF";

    #[test]
    fn test_parse_lowercases() {
        let account = Account::parse(CHECKSUMMED).unwrap();
        assert_eq!(account.as_str(), "0xabc0000000000000000000000000000000000def");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let account = Account::parse("  0xABC  ").unwrap();
        assert_eq!(account.as_str(), "0xabc");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Account::parse(""), Err(AccountError::Empty));
        assert!(matches!(Account::parse("abc"), Err(AccountError::InvalidFormat(_))));
        assert!(matches!(Account::parse("0x"), Err(AccountError::InvalidFormat(_))));
        assert!(matches!(Account::parse("0xzz12"), Err(AccountError::InvalidFormat(_))));
    }

    #[test]
    fn test_short_form() {
        let account = Account::parse(CHECKSUMMED).unwrap();
        assert_eq!(account.short(), "0xabc0…0def");

        let tiny = Account::parse("0xabc").unwrap();
        assert_eq!(tiny.short(), "0xabc");
    }

    #[test]
    fn test_account_only_when_connected() {
        let account = Account::parse(CHECKSUMMED).unwrap();

        assert!(ConnectionState::Disconnected.account().is_none());
        assert!(ConnectionState::Connecting.account().is_none());
        assert_eq!(
            ConnectionState::Connected(account.clone()).account(),
            Some(&account)
        );
    }

    #[test]
    fn test_state_serialization() {
        let account = Account::parse("0xabc").unwrap();
        let json = serde_json::to_value(ConnectionState::Connected(account)).unwrap();
        assert_eq!(json["status"], "connected");
        assert_eq!(json["account"], "0xabc");

        let json = serde_json::to_value(ConnectionState::Disconnected).unwrap();
        assert_eq!(json["status"], "disconnected");
        assert!(json.get("account").is_none());
    }
}
