//! # Boletera Storefront
//!
//! Client-side state machines for a raffle ticketing storefront. Visitors
//! browse a raffle, select ticket numbers, reserve them, upload payment
//! receipts and cancel reservations; organizers review submitted receipts.
//! All business logic (ticket locking, payment verification, raffle
//! lifecycle) lives in the backend; this crate owns the client's view of it
//! and the synchronization contract:
//!
//! - [`pool::NumberPool`] - availability as of the last fetch, replaced
//!   wholesale on every refresh
//! - [`selection::Selection`] - the in-progress selection, gated by a single
//!   selectability predicate
//! - [`session`] - the raffle-detail session reducer: load, select,
//!   reserve, upload receipt, cancel, with availability refreshed after
//!   every successful mutation
//! - [`organizer`] - the receipt-verification queue, driven by an explicit
//!   [`types::ViewMode`]
//! - [`config`] - environment-variable configuration
//!
//! ## Example
//!
//! ```ignore
//! use boletera_storefront::config::StorefrontConfig;
//! use boletera_storefront::environment::ProductionStorefrontEnvironment;
//! use boletera_storefront::session::{SessionAction, session_store};
//! use boletera_storefront::types::RaffleId;
//! use boletera_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! let config = StorefrontConfig::from_env();
//! let client = Arc::new(config.build_client()?);
//! let env = ProductionStorefrontEnvironment::new(client, Arc::new(SystemClock))
//!     .with_read_retry(config.read_retry());
//!
//! let store = session_store(RaffleId::new(1), env);
//! store.send(SessionAction::LoadRaffle).await;
//! ```

pub mod config;
pub mod environment;
pub mod organizer;
pub mod pool;
pub mod selection;
pub mod session;
pub mod types;

pub use config::StorefrontConfig;
pub use environment::{ProductionStorefrontEnvironment, StorefrontEnvironment};
pub use organizer::{ReviewAction, ReviewReducer, ReviewState};
pub use pool::{CentenaSummary, NumberPool};
pub use selection::Selection;
pub use session::{
    FlowError, SessionAction, SessionReducer, SessionState, SessionStore, session_store,
};
pub use types::{GuestIdentity, Money, PaymentId, PurchaseId, RaffleId, ReceiptImage, ViewMode};
