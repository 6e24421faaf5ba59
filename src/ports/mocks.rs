//! Recording test doubles for the ports.
//!
//! Used by unit tests inside the crate and by the integration tests in
//! `tests/`, so they are compiled into the library.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Notify;

use super::address::{AddressError, AddressPayload, AddressSource};
use super::host::HostEnvironment;
use super::price::{PriceError, PriceOracle};
use super::wallet::{
    EventHandler, ProviderEvent, ProviderEventKind, ProviderRpcError, WalletProvider,
    ETH_ACCOUNTS, ETH_REQUEST_ACCOUNTS,
};

/// Unsupported method
const METHOD_NOT_SUPPORTED: i64 = 4200;

/// Mock wallet provider that records requests and keeps real listener lists
pub struct MockWallet {
    metamask: bool,
    label: String,
    providers: Vec<Arc<dyn WalletProvider>>,
    requested: Mutex<Result<Vec<String>, ProviderRpcError>>,
    authorized: Mutex<Result<Vec<String>, ProviderRpcError>>,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<String>>,
    listeners: Mutex<Vec<(ProviderEventKind, EventHandler)>>,
}

impl Default for MockWallet {
    fn default() -> Self {
        Self {
            metamask: false,
            label: "injected".to_string(),
            providers: Vec::new(),
            requested: Mutex::new(Ok(Vec::new())),
            authorized: Mutex::new(Ok(Vec::new())),
            gate: None,
            calls: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl MockWallet {
    /// Provider that does not identify as MetaMask
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that identifies as MetaMask
    pub fn metamask() -> Self {
        Self {
            metamask: true,
            label: "metamask".to_string(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Make this object an aggregate of several injected providers
    pub fn with_providers(mut self, providers: Vec<Arc<dyn WalletProvider>>) -> Self {
        self.providers = providers;
        self
    }

    /// Accounts granted by `eth_requestAccounts`
    pub fn with_accounts(self, accounts: &[&str]) -> Self {
        *self.requested.lock().unwrap() = Ok(to_strings(accounts));
        self
    }

    /// Accounts already authorized, reported by `eth_accounts`
    pub fn with_authorized(self, accounts: &[&str]) -> Self {
        *self.authorized.lock().unwrap() = Ok(to_strings(accounts));
        self
    }

    /// Make `eth_requestAccounts` fail
    pub fn with_request_error(self, error: ProviderRpcError) -> Self {
        *self.requested.lock().unwrap() = Err(error);
        self
    }

    /// Make `eth_accounts` fail
    pub fn with_authorized_error(self, error: ProviderRpcError) -> Self {
        *self.authorized.lock().unwrap() = Err(error);
        self
    }

    /// Make `eth_requestAccounts` fail from now on
    pub fn fail_requests_with(&self, error: ProviderRpcError) {
        *self.requested.lock().unwrap() = Err(error);
    }

    /// Hold every `eth_requestAccounts` until the gate is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get all recorded request methods
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| *m == method).count()
    }

    pub fn listener_count(&self, kind: ProviderEventKind) -> usize {
        self.listeners.lock().unwrap().iter().filter(|(k, _)| *k == kind).count()
    }

    /// Fire an event at every matching listener. Returns how many ran.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _)| *kind == event.kind())
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn is_metamask(&self) -> bool {
        self.metamask
    }

    fn providers(&self) -> Vec<Arc<dyn WalletProvider>> {
        self.providers.clone()
    }

    async fn request(&self, method: &str, _params: Option<Value>) -> Result<Value, ProviderRpcError> {
        self.calls.lock().unwrap().push(method.to_string());

        if method == ETH_REQUEST_ACCOUNTS {
            if let Some(gate) = self.gate.as_ref() {
                gate.notified().await;
            }
        }

        let response = match method {
            ETH_REQUEST_ACCOUNTS => self.requested.lock().unwrap().clone(),
            ETH_ACCOUNTS => self.authorized.lock().unwrap().clone(),
            other => Err(ProviderRpcError::new(
                METHOD_NOT_SUPPORTED,
                format!("Unsupported method: {}", other),
            )),
        };
        response.map(|accounts| json!(accounts))
    }

    fn on(&self, kind: ProviderEventKind, handler: EventHandler) {
        self.listeners.lock().unwrap().push((kind, handler));
    }

    fn remove_listener(&self, kind: ProviderEventKind, handler: &EventHandler) {
        let mut listeners = self.listeners.lock().unwrap();
        if let Some(pos) = listeners
            .iter()
            .position(|(k, h)| *k == kind && Arc::ptr_eq(h, handler))
        {
            listeners.remove(pos);
        }
    }
}

fn to_strings(accounts: &[&str]) -> Vec<String> {
    accounts.iter().map(|a| a.to_string()).collect()
}

/// Mock page host that counts reloads
#[derive(Default)]
pub struct MockHost {
    wallet: Option<Arc<dyn WalletProvider>>,
    reloads: AtomicUsize,
}

impl MockHost {
    /// Page without any injected wallet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_wallet(wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            wallet: Some(wallet),
            reloads: AtomicUsize::new(0),
        }
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl HostEnvironment for MockHost {
    fn wallet_object(&self) -> Option<Arc<dyn WalletProvider>> {
        self.wallet.clone()
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Replays queued responses in order; the last one repeats
fn next_response<T: Clone, E>(queue: &Mutex<VecDeque<Result<T, E>>>, empty: E) -> Result<T, E>
where
    E: Clone,
{
    let mut queue = queue.lock().unwrap();
    if queue.len() > 1 {
        queue.pop_front().unwrap_or(Err(empty))
    } else {
        queue.front().cloned().unwrap_or(Err(empty))
    }
}

/// Mock price oracle with queued responses and optional latency
#[derive(Debug, Default)]
pub struct MockPriceFeed {
    responses: Mutex<VecDeque<Result<Decimal, PriceError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, price: Decimal) -> Self {
        self.responses.lock().unwrap().push_back(Ok(price));
        self
    }

    pub fn with_error(self, error: PriceError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for MockPriceFeed {
    async fn spot_price(&self) -> Result<Decimal, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next_response(
            &self.responses,
            PriceError::Network("No response configured".to_string()),
        )
    }
}

/// Mock address backend with queued responses and optional latency
#[derive(Debug, Default)]
pub struct MockAddressBackend {
    responses: Mutex<VecDeque<Result<AddressPayload, AddressError>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockAddressBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(self, payload: AddressPayload) -> Self {
        self.responses.lock().unwrap().push_back(Ok(payload));
        self
    }

    pub fn with_error(self, error: AddressError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressSource for MockAddressBackend {
    async fn fetch_address(&self) -> Result<AddressPayload, AddressError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next_response(
            &self.responses,
            AddressError::Network("No response configured".to_string()),
        )
    }
}
