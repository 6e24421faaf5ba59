//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The injected wallet provider and the page hosting it
//! - The spot price quote service
//! - The backend that hands out the recipient address

pub mod address;
pub mod host;
pub mod mocks;
pub mod price;
pub mod wallet;

pub use address::{AddressError, AddressPayload, AddressSource};
pub use host::HostEnvironment;
pub use price::{PriceError, PriceOracle};
pub use wallet::{
    EventHandler, ProviderEvent, ProviderEventKind, ProviderRpcError, WalletProvider,
    ETH_ACCOUNTS, ETH_REQUEST_ACCOUNTS,
};
