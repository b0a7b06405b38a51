//! The raffle-detail session state machine.
//!
//! One session covers a visitor looking at one raffle: loading the raffle
//! and its availability, selecting numbers, reserving them, paying for an
//! existing reservation by uploading a receipt, and cancelling.
//!
//! The three cooperating facets share a single reducer:
//!
//! ```text
//! LoadRaffle ──► RaffleLoaded ──► LoadAvailability ──► AvailabilityLoaded
//!                                        ▲                    │
//!                                        │             pool replaced,
//!                             refresh after every      selection pruned
//!                             successful mutation
//!
//! ToggleNumber ──► single selectability gate ──► Selection
//!
//! SubmitReservation / SubmitReceipt / ConfirmCancel
//!     ──► guards (local validation, busy exclusion)
//!     ──► one backend call, never retried
//!     ──► Accepted: clear selection, refresh availability
//!         Failed:   state untouched, busy cleared, error surfaced
//! ```
//!
//! All backend outcomes re-enter through actions, so the whole lifecycle is
//! testable by feeding actions to [`SessionReducer`] with a scripted
//! gateway.

pub mod actions;
pub mod reducer;
pub mod store;
#[cfg(test)]
mod tests;
pub mod types;

pub use actions::SessionAction;
pub use reducer::SessionReducer;
pub use store::{SessionStore, session_store};
pub use types::{
    AvailabilityState, Busy, FlowError, Participation, Phase, RaffleSnapshot, SessionState,
    ValidationIssue,
};
