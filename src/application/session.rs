//! Payment Session
//!
//! Composes the wallet manager, price client and address resolver into one
//! session and exposes a single read-only view for presentation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::adapters::provider::detect_provider;
use crate::domain::{ConnectionState, PriceQuote, RecipientAddress, SessionError};
use crate::ports::{AddressSource, HostEnvironment, PriceOracle};

use super::address_resolver::RecipientAddressResolver;
use super::context::SessionContext;
use super::price_client::PriceOracleClient;
use super::wallet_manager::WalletConnectionManager;

/// Snapshot of everything the checkout page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub provider_available: bool,
    pub connection: ConnectionState,
    pub connecting: bool,
    pub connect_enabled: bool,
    pub price: Option<PriceQuote>,
    pub price_loading: bool,
    pub recipient: Option<RecipientAddress>,
    pub address_loading: bool,
    pub error_kind: Option<SessionError>,
    pub error_message: Option<String>,
}

impl SessionView {
    /// Price formatted for display, e.g. `$3,250.50`
    pub fn price_display(&self) -> Option<String> {
        self.price.as_ref().map(PriceQuote::display_usd)
    }
}

#[derive(Clone)]
pub struct PaymentSession {
    wallet: WalletConnectionManager,
    price: PriceOracleClient,
    address: RecipientAddressResolver,
    ctx: SessionContext,
}

impl PaymentSession {
    /// Build a session for `host`. The provider is detected once, here.
    pub fn new(
        host: Arc<dyn HostEnvironment>,
        oracle: Arc<dyn PriceOracle>,
        address_source: Arc<dyn AddressSource>,
    ) -> Self {
        let ctx = SessionContext::new();
        let provider = detect_provider(host.as_ref());
        if provider.is_none() {
            tracing::info!("No wallet provider detected");
        }

        Self {
            wallet: WalletConnectionManager::new(provider, host, ctx.clone()),
            price: PriceOracleClient::new(oracle, ctx.clone()),
            address: RecipientAddressResolver::new(address_source, ctx.clone()),
            ctx,
        }
    }

    pub fn with_address_timeout(mut self, timeout: Duration) -> Self {
        self.address = self.address.with_timeout(timeout);
        self
    }

    pub fn with_fallback_address(mut self, fallback: impl Into<String>) -> Self {
        self.address = self.address.with_fallback(fallback);
        self
    }

    /// Subscribe to provider events, then restore a prior authorization and
    /// resolve the recipient address concurrently. The price is only
    /// fetched on demand.
    pub async fn start(&self) -> SessionView {
        tracing::info!("Starting payment session");
        self.wallet.subscribe();

        let (connection, recipient) =
            tokio::join!(self.wallet.restore(), self.address.resolve_address());
        tracing::info!(
            "Session ready: wallet {}, recipient {} ({})",
            connection.description(),
            recipient.as_str(),
            recipient.provenance()
        );

        self.view()
    }

    pub async fn connect(&self) -> Result<ConnectionState, SessionError> {
        self.wallet.connect().await
    }

    pub fn disconnect(&self) {
        self.wallet.disconnect();
    }

    pub async fn fetch_price(&self) -> Result<PriceQuote, SessionError> {
        self.price.fetch_price().await
    }

    pub async fn resolve_address(&self) -> RecipientAddress {
        self.address.resolve_address().await
    }

    /// Clear the shown error. Nothing else changes.
    pub fn dismiss_error(&self) {
        self.ctx.errors().dismiss();
    }

    pub fn is_active(&self) -> bool {
        self.ctx.is_active()
    }

    pub fn view(&self) -> SessionView {
        let price = self.price.state();
        let address = self.address.state();
        let error_kind = self.ctx.errors().current();
        let connection = self.wallet.state();

        SessionView {
            provider_available: self.wallet.has_provider(),
            connecting: connection.is_connecting() || self.wallet.request_pending(),
            connection,
            connect_enabled: self.wallet.connect_enabled(),
            price: price.quote,
            price_loading: price.loading,
            recipient: address.current,
            address_loading: address.loading,
            error_kind,
            error_message: error_kind.map(|e| e.to_string()),
        }
    }

    /// Tear the session down: provider listeners are released and any
    /// completion still in flight is dropped. Safe to call more than once.
    pub fn shutdown(&self) {
        if self.ctx.end() {
            tracing::info!("Payment session shut down");
        }
        self.wallet.unsubscribe();
    }
}
