//! Provider Adapter
//!
//! Locates the wallet provider injected into the host page. Some browsers
//! inject several competing extensions under one object, so MetaMask is
//! picked out deterministically when it is present.

use std::sync::Arc;

use crate::ports::{HostEnvironment, WalletProvider};

/// Borrowed capability to the active wallet provider
pub type ProviderHandle = Arc<dyn WalletProvider>;

/// Resolve the provider to use for this session.
///
/// 1. No injected object: `None`
/// 2. The object is MetaMask itself: that object
/// 3. The object aggregates providers: the first MetaMask among them
/// 4. Otherwise the raw object, best effort
///
/// Pure lookup: no requests are sent and no listeners are registered.
pub fn detect_provider(host: &dyn HostEnvironment) -> Option<ProviderHandle> {
    let injected = host.wallet_object()?;

    if injected.is_metamask() {
        return Some(injected);
    }

    if let Some(metamask) = injected.providers().into_iter().find(|p| p.is_metamask()) {
        tracing::debug!("Selected MetaMask from aggregated injected providers");
        return Some(metamask);
    }

    tracing::debug!("Injected provider does not identify as MetaMask, using it as-is");
    Some(injected)
}

/// Host without any browser: no injected wallet and nothing to reload.
///
/// Backs the headless `session` command of the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessHost;

impl HostEnvironment for HeadlessHost {
    fn wallet_object(&self) -> Option<Arc<dyn WalletProvider>> {
        None
    }

    fn reload(&self) {
        tracing::warn!("Page reload requested but no page is attached");
    }
}
