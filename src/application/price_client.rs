//! Price Oracle Client
//!
//! Fetches the spot price on demand and keeps the latest quote for display.
//! A failed fetch leaves the previously shown quote in place.

use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::domain::{ErrorChannel, PriceQuote, SessionError};
use crate::ports::PriceOracle;

use super::context::{read_lock, write_lock, RequestSequence, SessionContext};

#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceState {
    /// Latest quote, absent until the first successful fetch
    pub quote: Option<PriceQuote>,
    /// A fetch is outstanding
    pub loading: bool,
}

#[derive(Clone)]
pub struct PriceOracleClient {
    oracle: Arc<dyn PriceOracle>,
    state: Arc<RwLock<PriceState>>,
    sequence: RequestSequence,
    ctx: SessionContext,
}

impl PriceOracleClient {
    pub fn new(oracle: Arc<dyn PriceOracle>, ctx: SessionContext) -> Self {
        Self {
            oracle,
            state: Arc::new(RwLock::new(PriceState::default())),
            sequence: RequestSequence::new(),
            ctx,
        }
    }

    pub fn state(&self) -> PriceState {
        read_lock(&self.state).clone()
    }

    /// Fetch the spot price once. No automatic retry.
    ///
    /// Completions of a request that has since been superseded by a newer
    /// one, or that arrive after the session ended, are returned to the
    /// caller but not stored.
    pub async fn fetch_price(&self) -> Result<PriceQuote, SessionError> {
        let ticket = self.sequence.issue();
        write_lock(&self.state).loading = true;

        let outcome = self
            .oracle
            .spot_price()
            .await
            .map_err(|e| e.to_string())
            .and_then(|value| PriceQuote::now(value).map_err(|e| e.to_string()));

        if !self.ctx.is_active() {
            tracing::debug!("Session ended before price #{} completed, dropping result", ticket);
            return outcome.map_err(|_| SessionError::PriceFetchFailed);
        }

        if !self.sequence.is_latest(ticket) {
            tracing::debug!("Price #{} superseded by a newer request, dropping result", ticket);
            return outcome.map_err(|_| SessionError::PriceFetchFailed);
        }

        let mut state = write_lock(&self.state);
        state.loading = false;

        match outcome {
            Ok(quote) => {
                tracing::info!("Spot price: {}", quote.display_usd());
                state.quote = Some(quote.clone());
                drop(state);
                self.ctx.errors().clear_channel(ErrorChannel::Price);
                Ok(quote)
            }
            Err(reason) => {
                drop(state);
                tracing::warn!("Price fetch failed: {}", reason);
                self.ctx.errors().set(SessionError::PriceFetchFailed);
                Err(SessionError::PriceFetchFailed)
            }
        }
    }
}
