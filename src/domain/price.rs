//! Spot Price Quote
//!
//! The latest market price of the payment asset in fiat. Only one quote is
//! kept at a time; a newer quote simply replaces the older one.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

/// Decimal places shown to the user
pub const DISPLAY_DECIMALS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Quote value must be >= 0, got {0}")]
    Negative(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQuote {
    value: Decimal,
    fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(value: Decimal, fetched_at: DateTime<Utc>) -> Result<Self, QuoteError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(QuoteError::Negative(value));
        }
        Ok(Self { value, fetched_at })
    }

    /// Quote stamped with the current time
    pub fn now(value: Decimal) -> Result<Self, QuoteError> {
        Self::new(value, Utc::now())
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Value rounded half away from zero to two decimals, e.g. `3250.50`
    pub fn display_value(&self) -> String {
        let rounded = self
            .value
            .round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.2}", rounded)
    }

    /// en-US currency rendering with thousands separators, e.g. `$3,250.50`
    pub fn display_usd(&self) -> String {
        let plain = self.display_value();
        let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
        format!("${}.{}", group_thousands(whole), fraction)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
