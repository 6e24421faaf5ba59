//! eth-gateway - ETH payment session core
//!
//! Client-side session logic of a checkout page that accepts Ether through
//! an injected browser wallet.
//!
//! # Modules
//!
//! - `domain`: Value types (ConnectionState, PriceQuote, RecipientAddress, SessionError)
//! - `ports`: Trait abstractions (WalletProvider, HostEnvironment, PriceOracle, AddressSource)
//! - `adapters`: External implementations (provider detection, CoinGecko, backend, CLI)
//! - `application`: Wallet manager, price client, address resolver and the session aggregate
//! - `config`: Configuration loading and validation

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
