//! Application Layer - Payment session use cases
//!
//! Each component owns one slice of session state and shares the error
//! slot and liveness flag through [`SessionContext`].

pub mod address_resolver;
pub mod context;
pub mod price_client;
pub mod session;
pub mod wallet_manager;

pub use address_resolver::{AddressState, RecipientAddressResolver, ADDRESS_TIMEOUT};
pub use context::{RequestSequence, SessionContext};
pub use price_client::{PriceOracleClient, PriceState};
pub use session::{PaymentSession, SessionView};
pub use wallet_manager::{classify_rejection, WalletConnectionManager};
