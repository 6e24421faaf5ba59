//! CoinGecko Adapter
//!
//! Implementation of the PriceOracle port for the CoinGecko public API.

mod client;

pub use client::{parse_simple_price, CoinGeckoClient, CoinGeckoConfig};
