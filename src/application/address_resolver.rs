//! Recipient Address Resolver
//!
//! Asks the backend for the payment address under a hard timeout. Every
//! failure degrades to the fallback address instead of raising a
//! user-visible error: the page must always have an address to show.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;

use crate::domain::{is_canonical_address, RecipientAddress, FALLBACK_RECIPIENT_ADDRESS};
use crate::ports::{AddressPayload, AddressSource};

use super::context::{read_lock, write_lock, RequestSequence, SessionContext};

/// Hard bound on one resolution attempt
pub const ADDRESS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, Serialize)]
pub struct AddressState {
    /// Absent only until the first attempt finishes
    pub current: Option<RecipientAddress>,
    /// An attempt is outstanding
    pub loading: bool,
}

#[derive(Clone)]
pub struct RecipientAddressResolver {
    source: Arc<dyn AddressSource>,
    fallback: String,
    timeout: Duration,
    state: Arc<RwLock<AddressState>>,
    sequence: RequestSequence,
    ctx: SessionContext,
}

impl RecipientAddressResolver {
    pub fn new(source: Arc<dyn AddressSource>, ctx: SessionContext) -> Self {
        Self {
            source,
            fallback: FALLBACK_RECIPIENT_ADDRESS.to_string(),
            timeout: ADDRESS_TIMEOUT,
            state: Arc::new(RwLock::new(AddressState::default())),
            sequence: RequestSequence::new(),
            ctx,
        }
    }

    /// Set a shorter timeout. Never exceeds [`ADDRESS_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if timeout > ADDRESS_TIMEOUT {
            tracing::warn!(
                "Address timeout {:?} exceeds the {:?} bound, using the bound",
                timeout,
                ADDRESS_TIMEOUT
            );
        }
        self.timeout = timeout.min(ADDRESS_TIMEOUT);
        self
    }

    /// Set custom placeholder address (must already be validated)
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn state(&self) -> AddressState {
        read_lock(&self.state).clone()
    }

    /// Resolve the recipient address. Always yields `Resolved` or `Fallback`.
    ///
    /// Retrying is just calling this again: no backoff, no attempt counter.
    pub async fn resolve_address(&self) -> RecipientAddress {
        let ticket = self.sequence.issue();
        write_lock(&self.state).loading = true;

        let address = match tokio::time::timeout(self.timeout, self.source.fetch_address()).await {
            Ok(Ok(payload)) => self.from_payload(payload),
            Ok(Err(e)) => self.fallback(&format!("backend request failed: {}", e)),
            Err(_) => self.fallback(&format!("backend did not answer within {:?}", self.timeout)),
        };

        if !self.ctx.is_active() {
            tracing::debug!("Session ended before address #{} completed, dropping result", ticket);
            return address;
        }
        if !self.sequence.is_latest(ticket) {
            tracing::debug!("Address #{} superseded by a newer request, dropping result", ticket);
            return address;
        }

        let mut state = write_lock(&self.state);
        state.current = Some(address.clone());
        state.loading = false;
        address
    }

    fn from_payload(&self, payload: AddressPayload) -> RecipientAddress {
        if !payload.success {
            return self.fallback("backend reported failure");
        }
        match payload.address {
            Some(address) if is_canonical_address(&address) => {
                tracing::info!(source = "resolved", "Recipient address resolved: {}", address);
                RecipientAddress::Resolved(address)
            }
            Some(address) => self.fallback(&format!("malformed address {:?}", address)),
            None => self.fallback("success payload without address"),
        }
    }

    fn fallback(&self, reason: &str) -> RecipientAddress {
        tracing::warn!(
            source = "fallback",
            "Using FALLBACK recipient address {} ({})",
            self.fallback,
            reason
        );
        RecipientAddress::Fallback(self.fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::address::{AddressError, MockAddressSource};
    use crate::ports::mocks::MockAddressBackend;

    const RESOLVED: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    fn resolver_with(source: impl AddressSource + 'static) -> RecipientAddressResolver {
        RecipientAddressResolver::new(Arc::new(source), SessionContext::new())
    }

    fn fallback() -> RecipientAddress {
        RecipientAddress::Fallback("0x1234567890123456789012345678901234567890".to_string())
    }

    #[tokio::test]
    async fn test_success_resolves() {
        let mut source = MockAddressSource::new();
        source
            .expect_fetch_address()
            .times(1)
            .returning(|| Ok(AddressPayload::success(RESOLVED)));
        let resolver = resolver_with(source);

        let address = resolver.resolve_address().await;
        assert_eq!(address, RecipientAddress::Resolved(RESOLVED.to_string()));

        let state = resolver.state();
        assert_eq!(state.current, Some(address));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_not_success_falls_back() {
        let mut source = MockAddressSource::new();
        source.expect_fetch_address().returning(|| {
            Ok(AddressPayload {
                success: false,
                address: Some(RESOLVED.to_string()),
            })
        });

        assert_eq!(resolver_with(source).resolve_address().await, fallback());
    }

    #[tokio::test]
    async fn test_transport_errors_fall_back() {
        let errors = [
            AddressError::Network("connection refused".into()),
            AddressError::Status(500),
            AddressError::Malformed("expected value".into()),
            AddressError::Timeout,
        ];

        for error in errors {
            let mut source = MockAddressSource::new();
            source.expect_fetch_address().returning(move || Err(error.clone()));
            let resolver = resolver_with(source);

            assert_eq!(resolver.resolve_address().await, fallback());
            assert!(resolver.state().current.unwrap().is_fallback());
        }
    }

    #[tokio::test]
    async fn test_malformed_or_missing_address_falls_back() {
        for address in [Some("0x1234".to_string()), Some(String::new()), None] {
            let mut source = MockAddressSource::new();
            source.expect_fetch_address().returning(move || {
                Ok(AddressPayload {
                    success: true,
                    address: address.clone(),
                })
            });

            assert_eq!(resolver_with(source).resolve_address().await, fallback());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_five_seconds() {
        let backend = MockAddressBackend::new()
            .with_payload(AddressPayload::success(RESOLVED))
            .with_delay(Duration::from_secs(30));
        let resolver = resolver_with(backend);

        let started = tokio::time::Instant::now();
        let address = resolver.resolve_address().await;
        let elapsed = started.elapsed();

        assert_eq!(address, fallback());
        assert!(elapsed >= Duration::from_millis(5000));
        assert!(elapsed < Duration::from_millis(5100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_longer_timeout_is_capped() {
        let backend = MockAddressBackend::new()
            .with_payload(AddressPayload::success(RESOLVED))
            .with_delay(Duration::from_secs(10));
        let resolver = resolver_with(backend).with_timeout(Duration::from_secs(30));

        let started = tokio::time::Instant::now();
        assert_eq!(resolver.resolve_address().await, fallback());
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_but_in_time_resolves() {
        let backend = MockAddressBackend::new()
            .with_payload(AddressPayload::success(RESOLVED))
            .with_delay(Duration::from_millis(4900));

        let address = resolver_with(backend).resolve_address().await;
        assert!(!address.is_fallback());
    }

    #[tokio::test]
    async fn test_retry_repeats_request() {
        let backend = Arc::new(
            MockAddressBackend::new()
                .with_error(AddressError::Status(500))
                .with_payload(AddressPayload::success(RESOLVED)),
        );
        let resolver = RecipientAddressResolver::new(backend.clone(), SessionContext::new());

        assert!(resolver.resolve_address().await.is_fallback());
        assert!(!resolver.resolve_address().await.is_fallback());
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_custom_fallback() {
        let custom = "0xffffffffffffffffffffffffffffffffffffffff";
        let resolver = resolver_with(MockAddressBackend::new().with_error(AddressError::Timeout))
            .with_fallback(custom);

        assert_eq!(
            resolver.resolve_address().await,
            RecipientAddress::Fallback(custom.to_string())
        );
    }

    #[tokio::test]
    async fn test_late_completion_after_end_not_stored() {
        let ctx = SessionContext::new();
        let resolver = RecipientAddressResolver::new(
            Arc::new(MockAddressBackend::new().with_payload(AddressPayload::success(RESOLVED))),
            ctx.clone(),
        );

        ctx.end();
        resolver.resolve_address().await;
        assert!(resolver.state().current.is_none());
    }
}
