//! Session Errors
//!
//! The user-facing failure taxonomy and the single error slot the page
//! renders. Address resolution has no entry here: it degrades to the
//! fallback address instead of surfacing an error.

use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Which component raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorChannel {
    Wallet,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionError {
    #[error("MetaMask is not installed. Please install MetaMask and refresh this page.")]
    ProviderUnavailable,

    #[error("Connection cancelled. Please approve the connection in MetaMask.")]
    UserRejected,

    #[error("MetaMask is already processing a request. Please try again.")]
    RequestInFlight,

    #[error("Connection failed. Please try again.")]
    ConnectionFailed,

    #[error("Failed to fetch ETH price. Please try again.")]
    PriceFetchFailed,
}

impl SessionError {
    pub fn channel(&self) -> ErrorChannel {
        match self {
            SessionError::ProviderUnavailable
            | SessionError::UserRejected
            | SessionError::RequestInFlight
            | SessionError::ConnectionFailed => ErrorChannel::Wallet,
            SessionError::PriceFetchFailed => ErrorChannel::Price,
        }
    }
}

/// The one user-visible error shared by every component of a session.
///
/// Any failure overwrites whatever is there. Clearing happens on user
/// dismissal, or when the channel that raised the current error later
/// succeeds.
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot {
    current: Arc<RwLock<Option<SessionError>>>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, error: SessionError) {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(error) {
            if previous != error {
                tracing::debug!("Error slot: {:?} replaced by {:?}", previous, error);
            }
        }
    }

    pub fn current(&self) -> Option<SessionError> {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn message(&self) -> Option<String> {
        self.current().map(|e| e.to_string())
    }

    /// Explicit user dismissal
    pub fn dismiss(&self) {
        self.current.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    /// Clear the slot only if it currently holds an error from `channel`
    pub fn clear_channel(&self, channel: ErrorChannel) {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().map(SessionError::channel) == Some(channel) {
            *slot = None;
        }
    }
}
