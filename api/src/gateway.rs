//! Gateway trait abstracting the backend for the state machines.
//!
//! Reducers build effects against this trait instead of the concrete
//! [`StorefrontClient`], so tests can swap in a scripted backend and assert
//! on exactly which calls were made.

use crate::client::StorefrontClient;
use crate::error::ApiError;
use crate::types::{
    Ack, Availability, PurchaseRecord, RaffleDetail, ReceiptUpload, ReservationAck,
    ReservationRequest, Session, VerificationDecision, VerificationItem, VerificationOutcome,
};
use async_trait::async_trait;

/// Backend operations the storefront and organizer flows depend on.
///
/// Arguments are owned so implementations (and their futures) never borrow
/// from the caller.
#[async_trait]
pub trait StorefrontGateway: Send + Sync {
    /// Fetch raffle metadata.
    async fn raffle_detail(&self, raffle_id: i64) -> Result<RaffleDetail, ApiError>;

    /// Fetch the taken/processing number sets for a raffle.
    async fn availability(&self, raffle_id: i64) -> Result<Availability, ApiError>;

    /// Create a reservation holding the requested numbers.
    async fn create_reservation(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationAck, ApiError>;

    /// Look up a guest's purchases by phone (404 yields an empty list).
    async fn purchases_by_phone(&self, phone: String) -> Result<Vec<PurchaseRecord>, ApiError>;

    /// Attach a payment receipt to an existing purchase.
    async fn upload_receipt(
        &self,
        purchase_id: i64,
        upload: ReceiptUpload,
    ) -> Result<Ack, ApiError>;

    /// Cancel a reservation, releasing all its numbers.
    async fn cancel_purchase(&self, purchase_id: i64, phone: String) -> Result<Ack, ApiError>;

    /// List receipts awaiting verification (organizer only).
    async fn pending_verifications(
        &self,
        session: Session,
    ) -> Result<Vec<VerificationItem>, ApiError>;

    /// Approve or reject a submitted receipt (organizer only).
    async fn verify_payment(
        &self,
        session: Session,
        payment_id: i64,
        decision: VerificationDecision,
    ) -> Result<VerificationOutcome, ApiError>;
}

#[async_trait]
impl StorefrontGateway for StorefrontClient {
    async fn raffle_detail(&self, raffle_id: i64) -> Result<RaffleDetail, ApiError> {
        Self::raffle_detail(self, raffle_id).await
    }

    async fn availability(&self, raffle_id: i64) -> Result<Availability, ApiError> {
        Self::availability(self, raffle_id).await
    }

    async fn create_reservation(
        &self,
        request: ReservationRequest,
    ) -> Result<ReservationAck, ApiError> {
        Self::create_reservation(self, &request).await
    }

    async fn purchases_by_phone(&self, phone: String) -> Result<Vec<PurchaseRecord>, ApiError> {
        Self::purchases_by_phone(self, &phone).await
    }

    async fn upload_receipt(
        &self,
        purchase_id: i64,
        upload: ReceiptUpload,
    ) -> Result<Ack, ApiError> {
        Self::upload_receipt(self, purchase_id, upload).await
    }

    async fn cancel_purchase(&self, purchase_id: i64, phone: String) -> Result<Ack, ApiError> {
        Self::cancel_purchase(self, purchase_id, &phone).await
    }

    async fn pending_verifications(
        &self,
        session: Session,
    ) -> Result<Vec<VerificationItem>, ApiError> {
        Self::pending_verifications(self, &session).await
    }

    async fn verify_payment(
        &self,
        session: Session,
        payment_id: i64,
        decision: VerificationDecision,
    ) -> Result<VerificationOutcome, ApiError> {
        Self::verify_payment(self, &session, payment_id, decision).await
    }
}
