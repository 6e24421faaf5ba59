//! Payment Session Integration Tests
//!
//! Drive a complete session through the public API:
//! 1. Provider detection -> restore -> connect -> provider events
//! 2. Price fetch and display formatting
//! 3. Address resolution with fallback on timeout
//! 4. Error surfacing, dismissal and teardown
//!
//! All tests are deterministic (no real network calls) and use the
//! recording doubles from `ports::mocks`.

use std::sync::Arc;
use std::time::Duration;

use eth_gateway::application::PaymentSession;
use eth_gateway::domain::{ConnectionState, RecipientAddress, SessionError};
use eth_gateway::ports::mocks::{MockAddressBackend, MockHost, MockPriceFeed, MockWallet};
use eth_gateway::ports::{
    AddressError, AddressPayload, PriceError, ProviderEvent, ProviderEventKind, ProviderRpcError,
    WalletProvider, ETH_REQUEST_ACCOUNTS,
};
use regex::Regex;
use tokio::sync::Notify;
use rust_decimal_macros::dec;

// ============================================================================
// Test Fixtures
// ============================================================================

const ALICE: &str = "0xAbC0000000000000000000000000000000000001";
const BOB: &str = "0xb0b0000000000000000000000000000000000002";
const SHOP: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

struct Page {
    host: Arc<MockHost>,
    wallet: Option<Arc<MockWallet>>,
    session: PaymentSession,
}

/// Page with the given injected wallet, a working price feed and backend
fn open_page(wallet: Option<MockWallet>) -> Page {
    open_page_with(
        wallet,
        MockPriceFeed::new().with_price(dec!(3250.5)),
        MockAddressBackend::new().with_payload(AddressPayload::success(SHOP)),
    )
}

fn open_page_with(
    wallet: Option<MockWallet>,
    feed: MockPriceFeed,
    backend: MockAddressBackend,
) -> Page {
    let wallet = wallet.map(Arc::new);
    let host = Arc::new(match &wallet {
        Some(w) => MockHost::with_wallet(w.clone()),
        None => MockHost::empty(),
    });
    let session = PaymentSession::new(host.clone(), Arc::new(feed), Arc::new(backend));
    Page { host, wallet, session }
}

fn address_format() -> Regex {
    Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap()
}

// ============================================================================
// Connection lifecycle
// ============================================================================

#[tokio::test]
async fn test_full_checkout_flow() {
    let page = open_page(Some(MockWallet::metamask().with_accounts(&[ALICE])));
    let wallet = page.wallet.clone().unwrap();

    let view = page.session.start().await;
    assert!(view.provider_available);
    assert!(view.connect_enabled);
    assert_eq!(view.connection, ConnectionState::Disconnected);
    assert_eq!(view.recipient, Some(RecipientAddress::Resolved(SHOP.to_string())));

    let state = page.session.connect().await.unwrap();
    assert_eq!(
        state.account().map(|a| a.as_str().to_string()),
        Some(ALICE.to_lowercase())
    );
    assert_eq!(wallet.request_count(ETH_REQUEST_ACCOUNTS), 1);

    page.session.fetch_price().await.unwrap();
    let view = page.session.view();
    assert_eq!(view.price_display().as_deref(), Some("$3,250.50"));
    assert!(view.connection.is_connected());
    assert!(!view.connecting);
    assert_eq!(view.error_kind, None);

    let recipient = view.recipient.unwrap();
    assert!(address_format().is_match(recipient.as_str()));
}

#[tokio::test]
async fn test_restore_previous_authorization_without_prompt() {
    let page = open_page(Some(MockWallet::metamask().with_authorized(&[BOB])));
    let wallet = page.wallet.clone().unwrap();

    let view = page.session.start().await;

    assert_eq!(view.connection.account().unwrap().as_str(), BOB);
    assert_eq!(wallet.request_count(ETH_REQUEST_ACCOUNTS), 0);
}

#[tokio::test]
async fn test_metamask_selected_among_aggregated_providers() {
    let coinbase = Arc::new(MockWallet::new().with_label("coinbase").with_accounts(&[BOB]));
    let metamask = Arc::new(MockWallet::metamask().with_accounts(&[ALICE]));
    let aggregate = MockWallet::new()
        .with_label("aggregate")
        .with_providers(vec![
            coinbase.clone() as Arc<dyn WalletProvider>,
            metamask.clone() as Arc<dyn WalletProvider>,
        ]);
    let page = open_page(Some(aggregate));

    page.session.start().await;
    page.session.connect().await.unwrap();

    assert_eq!(metamask.request_count(ETH_REQUEST_ACCOUNTS), 1);
    assert_eq!(coinbase.request_count(ETH_REQUEST_ACCOUNTS), 0);
    assert_eq!(metamask.listener_count(ProviderEventKind::AccountsChanged), 1);
}

#[tokio::test]
async fn test_account_switch_and_revoke() {
    let page = open_page(Some(MockWallet::metamask().with_accounts(&[ALICE])));
    let wallet = page.wallet.clone().unwrap();
    page.session.start().await;
    page.session.connect().await.unwrap();

    wallet.emit(ProviderEvent::AccountsChanged(vec![BOB.to_string()]));
    assert_eq!(
        page.session.view().connection.account().unwrap().as_str(),
        BOB
    );

    wallet.emit(ProviderEvent::AccountsChanged(vec![]));
    let view = page.session.view();
    assert_eq!(view.connection, ConnectionState::Disconnected);
    assert!(view.connect_enabled);
}

#[tokio::test]
async fn test_network_switch_reloads_page_once() {
    let page = open_page(Some(MockWallet::metamask().with_accounts(&[ALICE])));
    let wallet = page.wallet.clone().unwrap();
    page.session.start().await;
    page.session.connect().await.unwrap();
    assert!(page.session.view().connection.is_connected());

    wallet.emit(ProviderEvent::ChainChanged("0x1".to_string()));
    wallet.emit(ProviderEvent::ChainChanged("0x89".to_string()));

    assert_eq!(page.host.reload_count(), 1);
}

#[tokio::test]
async fn test_account_event_while_approval_pending_sends_no_second_request() {
    let gate = Arc::new(Notify::new());
    let page = open_page(Some(
        MockWallet::metamask()
            .with_accounts(&[ALICE])
            .with_gate(gate.clone()),
    ));
    let wallet = page.wallet.clone().unwrap();
    page.session.start().await;

    let session = page.session.clone();
    let pending = tokio::spawn(async move { session.connect().await });
    while wallet.request_count(ETH_REQUEST_ACCOUNTS) == 0 {
        tokio::task::yield_now().await;
    }

    wallet.emit(ProviderEvent::AccountsChanged(vec![]));
    let view = page.session.view();
    assert!(view.connecting);
    assert!(!view.connect_enabled);

    page.session.connect().await.unwrap();
    assert_eq!(wallet.request_count(ETH_REQUEST_ACCOUNTS), 1);

    gate.notify_one();
    pending.await.unwrap().unwrap();
    assert!(page.session.view().connect_enabled);
}

#[tokio::test]
async fn test_disconnect_is_local_only() {
    let page = open_page(Some(MockWallet::metamask().with_accounts(&[ALICE])));
    let wallet = page.wallet.clone().unwrap();
    page.session.start().await;
    page.session.connect().await.unwrap();
    let requests_before = wallet.get_calls().len();

    page.session.disconnect();

    assert_eq!(page.session.view().connection, ConnectionState::Disconnected);
    assert_eq!(wallet.get_calls().len(), requests_before);
}

// ============================================================================
// Error surfacing
// ============================================================================

#[tokio::test]
async fn test_no_wallet_installed() {
    let page = open_page(None);

    let view = page.session.start().await;
    assert!(!view.provider_available);
    assert!(!view.connect_enabled);

    assert_eq!(
        page.session.connect().await,
        Err(SessionError::ProviderUnavailable)
    );
    assert_eq!(page.host.reload_count(), 0);
}

#[tokio::test]
async fn test_rejection_messages() {
    let cases = [
        (
            ProviderRpcError::user_rejected(),
            "Connection cancelled. Please approve the connection in MetaMask.",
        ),
        (
            ProviderRpcError::already_pending(),
            "MetaMask is already processing a request. Please try again.",
        ),
        (
            ProviderRpcError::new(-32603, "Internal JSON-RPC error"),
            "Connection failed. Please try again.",
        ),
    ];

    for (error, message) in cases {
        let page = open_page(Some(MockWallet::metamask().with_request_error(error)));
        page.session.start().await;

        assert!(page.session.connect().await.is_err());
        let view = page.session.view();
        assert_eq!(view.error_message.as_deref(), Some(message));
        assert_eq!(view.connection, ConnectionState::Disconnected);
        assert!(view.connect_enabled);
    }
}

#[tokio::test]
async fn test_price_failure_then_dismiss() {
    let page = open_page_with(
        Some(MockWallet::metamask()),
        MockPriceFeed::new().with_error(PriceError::Status(429)),
        MockAddressBackend::new().with_payload(AddressPayload::success(SHOP)),
    );
    page.session.start().await;

    assert_eq!(
        page.session.fetch_price().await,
        Err(SessionError::PriceFetchFailed)
    );
    let view = page.session.view();
    assert!(view.price.is_none());
    assert_eq!(
        view.error_message.as_deref(),
        Some("Failed to fetch ETH price. Please try again.")
    );

    page.session.dismiss_error();
    let after = page.session.view();
    assert_eq!(after.error_kind, None);
    assert_eq!(after.recipient, view.recipient);
}

#[tokio::test]
async fn test_later_error_overwrites_earlier() {
    let page = open_page_with(
        Some(MockWallet::metamask().with_request_error(ProviderRpcError::user_rejected())),
        MockPriceFeed::new().with_error(PriceError::Timeout),
        MockAddressBackend::new().with_payload(AddressPayload::success(SHOP)),
    );
    page.session.start().await;

    let _ = page.session.connect().await;
    let _ = page.session.fetch_price().await;

    assert_eq!(
        page.session.view().error_kind,
        Some(SessionError::PriceFetchFailed)
    );
}

// ============================================================================
// Recipient address
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_slow_backend_falls_back_after_five_seconds() {
    let page = open_page_with(
        None,
        MockPriceFeed::new(),
        MockAddressBackend::new()
            .with_payload(AddressPayload::success(SHOP))
            .with_delay(Duration::from_secs(60)),
    );

    let started = tokio::time::Instant::now();
    let view = page.session.start().await;

    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(6));
    let recipient = view.recipient.unwrap();
    assert!(recipient.is_fallback());
    assert_eq!(recipient.as_str(), "0x1234567890123456789012345678901234567890");
    assert!(address_format().is_match(recipient.as_str()));
    assert_eq!(view.error_kind, None);
}

#[tokio::test]
async fn test_unconfigured_backend_falls_back_then_retry_resolves() {
    let page = open_page_with(
        None,
        MockPriceFeed::new(),
        MockAddressBackend::new()
            .with_error(AddressError::Status(500))
            .with_payload(AddressPayload::success(SHOP)),
    );

    let view = page.session.start().await;
    assert!(view.recipient.unwrap().is_fallback());

    let retried = page.session.resolve_address().await;
    assert_eq!(retried, RecipientAddress::Resolved(SHOP.to_string()));
    assert_eq!(page.session.view().recipient, Some(retried));
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test]
async fn test_shutdown_stops_event_handling() {
    let page = open_page(Some(MockWallet::metamask().with_accounts(&[ALICE])));
    let wallet = page.wallet.clone().unwrap();
    page.session.start().await;
    page.session.connect().await.unwrap();

    page.session.shutdown();

    assert_eq!(wallet.listener_count(ProviderEventKind::AccountsChanged), 0);
    assert_eq!(wallet.listener_count(ProviderEventKind::ChainChanged), 0);
    wallet.emit(ProviderEvent::ChainChanged("0x5".to_string()));
    assert_eq!(page.host.reload_count(), 0);
    assert!(page.session.view().connection.is_connected());
}

#[tokio::test]
async fn test_view_serializes_for_presentation() {
    let page = open_page(Some(MockWallet::metamask().with_accounts(&[ALICE])));
    page.session.start().await;
    page.session.connect().await.unwrap();

    let json = serde_json::to_value(page.session.view()).unwrap();

    assert_eq!(json["connection"]["status"], "connected");
    assert_eq!(json["connection"]["account"], ALICE.to_lowercase());
    assert_eq!(json["recipient"]["source"], "resolved");
    assert_eq!(json["recipient"]["address"], SHOP);
    assert_eq!(json["provider_available"], true);
    assert!(json["error_kind"].is_null());
}
