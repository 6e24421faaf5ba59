//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Provider: wallet provider detection on the host page
//! - CoinGecko: spot price API client
//! - Backend: recipient address API client
//! - CLI: Command-line interface definitions

pub mod backend;
pub mod cli;
pub mod coingecko;
pub mod provider;

pub use backend::BackendAddressClient;
pub use cli::CliApp;
pub use coingecko::CoinGeckoClient;
pub use provider::{detect_provider, HeadlessHost, ProviderHandle};
