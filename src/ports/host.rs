use std::sync::Arc;

use super::wallet::WalletProvider;

/// The page hosting the session.
///
/// Passed into the session at construction instead of being read as ambient
/// global state, so tests can substitute a double.
pub trait HostEnvironment: Send + Sync {
    /// The injected wallet object (`window.ethereum`), if any
    fn wallet_object(&self) -> Option<Arc<dyn WalletProvider>>;

    /// Full reload of the hosting page
    fn reload(&self);
}
