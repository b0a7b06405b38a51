//! # Boletera API
//!
//! HTTP client for the raffle backend REST API.
//!
//! The backend owns all business logic (ticket locking, payment
//! verification, raffle lifecycle); this crate is the wire boundary the
//! client-side state machines talk through. It provides:
//!
//! - [`client::StorefrontClient`] - reqwest-based client for every endpoint
//!   the storefront and organizer flows need
//! - [`gateway::StorefrontGateway`] - trait abstraction over the client so
//!   reducers can be tested against scripted backends
//! - [`error::ApiError`] - the client-observable error taxonomy (conflicts,
//!   auth, malformed responses, network failures)
//! - [`types`] - wire DTOs matching the backend's JSON shapes
//!
//! All GET endpoints are unauthenticated except the organizer verification
//! endpoints, which take a bearer [`types::Session`].

pub mod client;
pub mod error;
pub mod gateway;
pub mod types;

pub use client::StorefrontClient;
pub use error::ApiError;
pub use gateway::StorefrontGateway;
pub use types::{
    Ack, Availability, PurchaseLine, PurchaseRecord, RaffleDetail, ReceiptUpload, ReservationAck,
    ReservationRequest, Session, TicketStatus, VerificationDecision, VerificationItem,
    VerificationOutcome,
};
