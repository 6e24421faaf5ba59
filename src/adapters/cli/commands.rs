//! CLI Commands
//!
//! Argument definitions for the diagnostic binary. Handlers live in
//! `main.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/gateway.toml";

/// eth-gateway - ETH payment session diagnostics
#[derive(Parser, Debug)]
#[command(
    name = "eth-gateway",
    version = env!("CARGO_PKG_VERSION"),
    about = "ETH payment session diagnostics",
    long_about = "Exercises the price service and the recipient address backend the \
                  checkout page depends on, or runs a full headless payment session."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch and print the spot price
    Price(PriceCmd),

    /// Resolve the recipient address and print where it came from
    Address(AddressCmd),

    /// Start a headless session and print its view as JSON
    Session(SessionCmd),
}

impl Command {
    pub fn config_path(&self) -> &PathBuf {
        match self {
            Command::Price(cmd) => &cmd.config,
            Command::Address(cmd) => &cmd.config,
            Command::Session(cmd) => &cmd.config,
        }
    }
}

/// Fetch spot price
#[derive(Parser, Debug)]
pub struct PriceCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Resolve recipient address
#[derive(Parser, Debug)]
pub struct AddressCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override the backend base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Run a headless session
#[derive(Parser, Debug)]
pub struct SessionCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Also fetch the spot price before printing the view
    #[arg(long)]
    pub fetch_price: bool,
}
