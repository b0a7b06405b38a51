//! Wire DTOs for the raffle backend API.
//!
//! Shapes mirror what the backend actually serializes: DRF decimal fields
//! arrive as JSON strings, status choices are lowercase (with capitalized
//! aliases accepted, as older backend revisions emitted them), and most
//! fields outside the identifiers are optional.

use serde::{Deserialize, Serialize};

/// Raffle metadata returned by `GET /raffles/{id}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RaffleDetail {
    /// Raffle identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Price per number (newer field name, decimal string)
    #[serde(default)]
    pub ticket_price: Option<String>,
    /// Price per number (older field name, decimal string)
    #[serde(default)]
    pub price_per_number: Option<String>,
    /// First sellable number (inclusive)
    #[serde(default)]
    pub number_start: u32,
    /// Last sellable number (inclusive)
    pub number_end: u32,
    /// When ticket sales close
    #[serde(default)]
    pub sale_end_at: Option<chrono::DateTime<chrono::Utc>>,
    /// When the draw takes place
    #[serde(default)]
    pub draw_scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Raffle image path or URL
    #[serde(default)]
    pub image: Option<String>,
}

impl RaffleDetail {
    /// Price per number as a decimal string, preferring the newer field.
    #[must_use]
    pub fn price(&self) -> Option<&str> {
        self.ticket_price
            .as_deref()
            .or(self.price_per_number.as_deref())
    }
}

/// Availability snapshot returned by `GET /raffles/{id}/availability/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Availability {
    /// Numbers already reserved or sold
    #[serde(default, alias = "occupied_numbers")]
    pub taken_numbers: Vec<u32>,
    /// Numbers whose receipt awaits verification
    #[serde(default)]
    pub processing_numbers: Vec<u32>,
}

/// Outbound payload for `POST /purchases/`.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationRequest {
    /// Raffle to reserve in
    pub raffle_id: i64,
    /// Numbers to reserve, ascending
    pub numbers: Vec<u32>,
    /// Guest name
    pub guest_name: String,
    /// Guest email
    pub guest_email: String,
    /// Guest phone, also the lightweight guest-auth token
    pub guest_phone: String,
}

/// Acknowledgement for a created reservation.
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationAck {
    /// Purchase identifier
    pub id: i64,
    /// Purchase status (`pending` immediately after creation)
    #[serde(default)]
    pub status: Option<String>,
    /// Total amount as a decimal string
    #[serde(default)]
    pub total_amount: Option<String>,
}

/// Status of a single purchased number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Reserved, awaiting payment
    #[default]
    #[serde(alias = "Pending")]
    Pending,
    /// Payment approved
    #[serde(alias = "Paid")]
    Paid,
    /// Reservation expired unpaid
    #[serde(alias = "Expired")]
    Expired,
    /// Reservation cancelled, number released
    #[serde(alias = "Canceled", alias = "Cancelled")]
    Canceled,
}

/// One number line inside a purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseLine {
    /// The ticket number
    pub number: u32,
    /// Current status of this number
    #[serde(default)]
    pub status: TicketStatus,
    /// Unit price as a decimal string
    #[serde(default)]
    pub unit_price: Option<String>,
}

/// A purchase as returned by `GET /purchases/?phone={phone}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRecord {
    /// Purchase identifier
    pub id: i64,
    /// Raffle the purchase belongs to
    pub raffle_id: i64,
    /// Raffle display name
    #[serde(default)]
    pub raffle_name: Option<String>,
    /// Raffle image path or URL
    #[serde(default)]
    pub raffle_image: Option<String>,
    /// Per-number lines
    #[serde(default)]
    pub details: Vec<PurchaseLine>,
}

/// Receipt image plus the numbers it is meant to cover.
///
/// Sent as a multipart form to `POST /purchases/{id}/upload_receipt/`:
/// `receipt_image` (file), `phone` (text), and one repeated `numbers` field
/// per covered number.
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    /// Raw image bytes
    pub image: Vec<u8>,
    /// Original filename of the image
    pub filename: String,
    /// MIME type of the image
    pub content_type: String,
    /// Submitter's phone (guest-auth token)
    pub phone: String,
    /// Subset of the purchase's pending numbers this receipt pays for
    pub numbers: Vec<u32>,
}

/// Generic acknowledgement body for mutating calls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    /// Optional human-readable message
    #[serde(default)]
    pub detail: Option<String>,
    /// Optional resulting status
    #[serde(default)]
    pub status: Option<String>,
}

/// A receipt awaiting organizer verification.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationItem {
    /// Payment identifier (the verification key)
    pub payment_id: i64,
    /// Purchase the payment belongs to
    pub purchase_id: i64,
    /// Buyer's name
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Amount as a decimal string
    #[serde(default)]
    pub amount: Option<String>,
    /// Numbers the receipt claims to pay for
    #[serde(default)]
    pub selected_numbers: Vec<u32>,
    /// URL or path of the uploaded receipt image
    #[serde(default)]
    pub receipt_image: Option<String>,
}

/// Organizer decision on a submitted receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationDecision {
    /// Finalize the sale of the involved numbers
    Approve,
    /// Release the involved numbers back to the pool
    Reject,
}

/// Result of a verification call.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationOutcome {
    /// Resulting verification status (`approved` or `rejected`)
    pub status: String,
}

/// Bearer token for organizer-only endpoints.
///
/// Obtained from a separate login exchange that is out of scope here; this
/// type only models that an operation *requires* a valid session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    /// Wrap a bearer token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self { token }
    }

    /// The raw bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

// Manual Debug so tokens never end up in logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("token", &"***").finish()
    }
}
