//! Domain Layer - Value types of the payment session
//!
//! Pure types with no I/O. All external interactions happen through the
//! ports layer.

pub mod address;
pub mod connection;
pub mod error;
pub mod price;

pub use address::{is_canonical_address, RecipientAddress, FALLBACK_RECIPIENT_ADDRESS};
pub use connection::{Account, AccountError, ConnectionState};
pub use error::{ErrorChannel, ErrorSlot, SessionError};
pub use price::{PriceQuote, QuoteError};
