//! Wallet Connection Manager
//!
//! Owns the connect/disconnect lifecycle and the subscription to provider
//! events. State machine:
//!
//! ```text
//! Disconnected --connect--> Connecting --accounts--> Connected
//!                                      --failure---> Disconnected (error set)
//! Connected --disconnect | accountsChanged([])--> Disconnected
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::adapters::provider::ProviderHandle;
use crate::domain::{Account, ConnectionState, ErrorChannel, SessionError};
use crate::ports::{EventHandler, HostEnvironment, ProviderEvent, ProviderEventKind, ProviderRpcError};

use super::context::{read_lock, write_lock, SessionContext};

/// Map a rejected `eth_requestAccounts` onto the user-facing taxonomy
pub fn classify_rejection(error: &ProviderRpcError) -> SessionError {
    if error.is_user_rejected() {
        SessionError::UserRejected
    } else if error.is_already_pending() {
        SessionError::RequestInFlight
    } else {
        SessionError::ConnectionFailed
    }
}

/// Marks an `eth_requestAccounts` as outstanding until dropped, so the flag
/// is cleared on every exit path of `connect`, cancellation included.
struct PendingRequest(Arc<AtomicBool>);

impl PendingRequest {
    /// `None` if a request is already outstanding
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(Self(Arc::clone(flag)))
        }
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Listeners registered with the provider. Dropping the guard removes
/// exactly the handlers that were added.
struct EventSubscription {
    provider: ProviderHandle,
    handlers: Vec<(ProviderEventKind, EventHandler)>,
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        for (kind, handler) in self.handlers.drain(..) {
            self.provider.remove_listener(kind, &handler);
        }
        tracing::debug!("Provider event listeners removed");
    }
}

#[derive(Clone)]
pub struct WalletConnectionManager {
    provider: Option<ProviderHandle>,
    host: Arc<dyn HostEnvironment>,
    state: Arc<RwLock<ConnectionState>>,
    subscription: Arc<Mutex<Option<EventSubscription>>>,
    reload_requested: Arc<AtomicBool>,
    request_pending: Arc<AtomicBool>,
    ctx: SessionContext,
}

impl WalletConnectionManager {
    /// `provider` is the result of provider detection on `host`
    pub fn new(
        provider: Option<ProviderHandle>,
        host: Arc<dyn HostEnvironment>,
        ctx: SessionContext,
    ) -> Self {
        Self {
            provider,
            host,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            subscription: Arc::new(Mutex::new(None)),
            reload_requested: Arc::new(AtomicBool::new(false)),
            request_pending: Arc::new(AtomicBool::new(false)),
            ctx,
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        read_lock(&self.state).clone()
    }

    /// The connect control is usable: a provider exists and no
    /// authorization request is outstanding
    pub fn connect_enabled(&self) -> bool {
        self.has_provider() && !self.request_pending() && !self.state().is_connecting()
    }

    /// An `eth_requestAccounts` is outstanding. Stays true even if an
    /// account event or `disconnect` moved the state off `Connecting`.
    pub fn request_pending(&self) -> bool {
        self.request_pending.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Register `accountsChanged` and `chainChanged` listeners.
    ///
    /// No-op without a provider, after teardown, or when already subscribed.
    pub fn subscribe(&self) {
        let Some(provider) = self.provider.clone() else {
            return;
        };
        if !self.ctx.is_active() {
            return;
        }

        let mut slot = self.subscription.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let accounts_handler: EventHandler = {
            let state = Arc::clone(&self.state);
            let ctx = self.ctx.clone();
            Arc::new(move |event: &ProviderEvent| {
                if !ctx.is_active() {
                    return;
                }
                if let ProviderEvent::AccountsChanged(accounts) = event {
                    apply_accounts_changed(&state, accounts);
                }
            })
        };

        let chain_handler: EventHandler = {
            let host = Arc::clone(&self.host);
            let reload_requested = Arc::clone(&self.reload_requested);
            let ctx = self.ctx.clone();
            Arc::new(move |event: &ProviderEvent| {
                if !ctx.is_active() {
                    return;
                }
                if let ProviderEvent::ChainChanged(chain_id) = event {
                    if reload_requested.swap(true, Ordering::SeqCst) {
                        tracing::debug!("Chain changed to {} again, reload already pending", chain_id);
                        return;
                    }
                    tracing::info!("Chain changed to {}, reloading page", chain_id);
                    host.reload();
                }
            })
        };

        let handlers = vec![
            (ProviderEventKind::AccountsChanged, accounts_handler),
            (ProviderEventKind::ChainChanged, chain_handler),
        ];
        for (kind, handler) in &handlers {
            provider.on(*kind, Arc::clone(handler));
        }

        *slot = Some(EventSubscription { provider, handlers });
        tracing::debug!("Subscribed to provider events");
    }

    /// Silently adopt an already-authorized account, without prompting.
    ///
    /// Restores the connection after a page reload. Failures are logged and
    /// never reach the error slot.
    pub async fn restore(&self) -> ConnectionState {
        let Some(provider) = self.provider.clone() else {
            return self.state();
        };

        match provider.accounts().await {
            Ok(accounts) => {
                if !self.ctx.is_active() {
                    return self.state();
                }
                let Some(first) = accounts.first() else {
                    tracing::debug!("No previously authorized accounts");
                    return self.state();
                };
                match Account::parse(first) {
                    Ok(account) => {
                        let mut state = write_lock(&self.state);
                        if *state == ConnectionState::Disconnected {
                            tracing::info!("Restored wallet connection: {}", account.short());
                            *state = ConnectionState::Connected(account);
                        }
                        state.clone()
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring authorized account: {}", e);
                        self.state()
                    }
                }
            }
            Err(e) => {
                tracing::debug!("eth_accounts failed during restore: {}", e);
                self.state()
            }
        }
    }

    /// Ask the provider to authorize accounts.
    ///
    /// While a request is outstanding calling again sends no second request
    /// and returns the current state.
    ///
    /// The completion only settles the state if it is still `Connecting`.
    /// An `accountsChanged` event or `disconnect` that arrived meanwhile is
    /// newer information and wins; a failure is then still reported but the
    /// state is left alone.
    pub async fn connect(&self) -> Result<ConnectionState, SessionError> {
        let Some(provider) = self.provider.clone() else {
            tracing::warn!("Connect requested but no wallet provider is installed");
            return Err(self.fail(SessionError::ProviderUnavailable));
        };

        let Some(_pending) = PendingRequest::acquire(&self.request_pending) else {
            tracing::debug!("Connect ignored: authorization request already outstanding");
            return Ok(self.state());
        };
        *write_lock(&self.state) = ConnectionState::Connecting;
        tracing::info!("Requesting wallet authorization");

        let outcome = provider.request_accounts().await;

        if !self.ctx.is_active() {
            tracing::debug!("Session ended before authorization completed, dropping result");
            return Ok(self.state());
        }

        let (next, result) = match outcome {
            Ok(accounts) => match accounts.first().map(|a| Account::parse(a)) {
                Some(Ok(account)) => {
                    let next = ConnectionState::Connected(account);
                    (next.clone(), Ok(next))
                }
                Some(Err(e)) => {
                    tracing::warn!("Wallet returned an unusable account: {}", e);
                    (ConnectionState::Disconnected, Err(SessionError::ConnectionFailed))
                }
                None => {
                    tracing::info!("Wallet authorized no accounts");
                    (ConnectionState::Disconnected, Ok(ConnectionState::Disconnected))
                }
            },
            Err(e) => {
                let error = classify_rejection(&e);
                tracing::warn!("Wallet authorization failed ({:?}): {}", error, e);
                (ConnectionState::Disconnected, Err(error))
            }
        };

        let settled = {
            let mut state = write_lock(&self.state);
            if state.is_connecting() {
                *state = next;
                true
            } else {
                tracing::debug!(
                    "State changed to {:?} while authorization was outstanding, keeping it",
                    *state
                );
                false
            }
        };

        match result {
            Ok(connected) if settled => {
                if let Some(account) = connected.account() {
                    tracing::info!("Wallet connected: {}", account.short());
                    self.ctx.errors().clear_channel(ErrorChannel::Wallet);
                }
                Ok(connected)
            }
            Ok(_) => Ok(self.state()),
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Forget the connection locally. Provider-side authorization stays.
    pub fn disconnect(&self) {
        *write_lock(&self.state) = ConnectionState::Disconnected;
        self.ctx.errors().clear_channel(ErrorChannel::Wallet);
        tracing::info!("Wallet disconnected");
    }

    /// Release the provider subscription. Safe to call more than once.
    pub fn unsubscribe(&self) {
        let released = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(released);
    }

    fn fail(&self, error: SessionError) -> SessionError {
        self.ctx.errors().set(error);
        error
    }
}

fn apply_accounts_changed(state: &RwLock<ConnectionState>, accounts: &[String]) {
    let next = match accounts.first().map(|a| Account::parse(a)) {
        None => {
            tracing::info!("Wallet revoked all accounts");
            ConnectionState::Disconnected
        }
        Some(Ok(account)) => {
            tracing::info!("Active account changed: {}", account.short());
            ConnectionState::Connected(account)
        }
        Some(Err(e)) => {
            tracing::warn!("Unusable account in accountsChanged: {}", e);
            ConnectionState::Disconnected
        }
    };
    *write_lock(state) = next;
}
