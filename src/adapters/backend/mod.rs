//! Backend Adapter
//!
//! Implementation of the AddressSource port for the shop backend.

mod client;

pub use client::{parse_address_payload, BackendAddressClient, BackendConfig, ADDRESS_PATH};
