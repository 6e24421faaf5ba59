//! CLI Adapter
//!
//! Command-line interface for the payment gateway diagnostics.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{AddressCmd, CliApp, Command, PriceCmd, SessionCmd, DEFAULT_CONFIG_PATH};
