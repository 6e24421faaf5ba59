//! Recipient Address
//!
//! The destination the user pays to. It is either resolved from the backend
//! or a hardcoded placeholder used when resolution fails, and the two are
//! always kept apart in the type so logs and monitoring can tell them apart.

use serde::Serialize;

/// Placeholder shown when the backend cannot provide an address
pub const FALLBACK_RECIPIENT_ADDRESS: &str = "0x1234567890123456789012345678901234567890";

/// Hex digits after the `0x` prefix
pub const ADDRESS_HEX_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "address", rename_all = "snake_case")]
pub enum RecipientAddress {
    /// Address returned by the backend
    Resolved(String),
    /// Hardcoded placeholder, never a real payment destination
    Fallback(String),
}

impl RecipientAddress {
    pub fn fallback() -> Self {
        RecipientAddress::Fallback(FALLBACK_RECIPIENT_ADDRESS.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecipientAddress::Resolved(address) | RecipientAddress::Fallback(address) => address,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RecipientAddress::Fallback(_))
    }

    /// Provenance label used in logs and CLI output
    pub fn provenance(&self) -> &'static str {
        match self {
            RecipientAddress::Resolved(_) => "resolved",
            RecipientAddress::Fallback(_) => "fallback",
        }
    }
}

/// `0x` followed by exactly 40 hex digits (either case)
pub fn is_canonical_address(candidate: &str) -> bool {
    match candidate.strip_prefix("0x") {
        Some(digits) => {
            digits.len() == ADDRESS_HEX_LEN && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
