//! eth-gateway - ETH payment session diagnostics
//!
//! Talks to the same price service and backend the checkout page uses.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use eth_gateway::adapters::backend::{BackendAddressClient, BackendConfig};
use eth_gateway::adapters::cli::{AddressCmd, CliApp, Command, PriceCmd, SessionCmd};
use eth_gateway::adapters::coingecko::{CoinGeckoClient, CoinGeckoConfig};
use eth_gateway::adapters::provider::HeadlessHost;
use eth_gateway::application::{PaymentSession, PriceOracleClient, RecipientAddressResolver, SessionContext};
use eth_gateway::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (GATEWAY_API_URL may be set there)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config = load(app.command.config_path())?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Price(cmd) => price_command(cmd, &config).await,
        Command::Address(cmd) => address_command(cmd, &config).await,
        Command::Session(cmd) => session_command(cmd, &config).await,
    }
}

fn load(path: &Path) -> Result<Config> {
    // Expand ~ in the config path
    let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
    Config::load_or_default(&expanded)
        .with_context(|| format!("Failed to load configuration from {}", expanded))
}

fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
    };

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

async fn price_command(_cmd: PriceCmd, config: &Config) -> Result<()> {
    let oracle = CoinGeckoClient::with_config(CoinGeckoConfig::from(config))
        .context("Failed to create price client")?;
    let client = PriceOracleClient::new(Arc::new(oracle), SessionContext::new());

    let quote = client
        .fetch_price()
        .await
        .context("Failed to fetch spot price")?;

    println!(
        "{} price: {} {}",
        config.price.asset_id,
        quote.display_value(),
        config.price.vs_currency.to_uppercase()
    );
    println!("Fetched at: {}", quote.fetched_at().to_rfc3339());
    Ok(())
}

async fn address_command(cmd: AddressCmd, config: &Config) -> Result<()> {
    let mut backend_config = BackendConfig::from(config);
    if let Some(url) = cmd.api_url {
        backend_config.api_url = url;
    }
    let url = backend_config.address_url();

    let source = BackendAddressClient::with_config(backend_config)
        .context("Failed to create backend client")?;
    let resolver = RecipientAddressResolver::new(Arc::new(source), SessionContext::new())
        .with_timeout(config.backend.timeout())
        .with_fallback(config.backend.fallback_address.clone());

    let address = resolver.resolve_address().await;

    println!("Endpoint: {}", url);
    println!("Address:  {}", address.as_str());
    println!("Source:   {}", address.provenance());
    if address.is_fallback() {
        println!("WARNING: placeholder address, do not send funds to it");
    }
    Ok(())
}

async fn session_command(cmd: SessionCmd, config: &Config) -> Result<()> {
    let oracle = CoinGeckoClient::with_config(CoinGeckoConfig::from(config))
        .context("Failed to create price client")?;
    let source = BackendAddressClient::with_config(BackendConfig::from(config))
        .context("Failed to create backend client")?;

    let session = PaymentSession::new(Arc::new(HeadlessHost), Arc::new(oracle), Arc::new(source))
        .with_address_timeout(config.backend.timeout())
        .with_fallback_address(config.backend.fallback_address.clone());

    session.start().await;
    if cmd.fetch_price {
        if let Err(e) = session.fetch_price().await {
            tracing::warn!("Price unavailable: {}", e);
        }
    }

    let view = session.view();
    session.shutdown();

    let json = serde_json::to_string_pretty(&view).context("Failed to serialize session view")?;
    println!("{}", json);
    Ok(())
}
