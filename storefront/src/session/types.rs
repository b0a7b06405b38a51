//! State types for the raffle-detail session.

use crate::pool::NumberPool;
use crate::selection::Selection;
use crate::types::{Money, OwnedTicket, PurchaseId, RaffleId, ReceiptImage};
use boletera_api::{ApiError, RaffleDetail, TicketStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Raffle metadata the session keeps after the detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleSnapshot {
    /// Raffle identifier
    pub id: RaffleId,
    /// Display name
    pub name: String,
    /// Price per number
    pub price: Money,
    /// First sellable number (inclusive)
    pub range_start: u32,
    /// Last sellable number (inclusive)
    pub range_end: u32,
    /// When ticket sales close
    pub sale_end_at: Option<DateTime<Utc>>,
    /// When the draw takes place
    pub draw_scheduled_at: Option<DateTime<Utc>>,
}

impl From<RaffleDetail> for RaffleSnapshot {
    fn from(detail: RaffleDetail) -> Self {
        let price = detail
            .price()
            .and_then(Money::parse_decimal)
            .unwrap_or_default();

        Self {
            id: RaffleId::new(detail.id),
            name: detail.name,
            price,
            range_start: detail.number_start,
            range_end: detail.number_end,
            sale_end_at: detail.sale_end_at,
            draw_scheduled_at: detail.draw_scheduled_at,
        }
    }
}

/// Availability as the session sees it.
///
/// "Loading", "failed", and "never loaded" are distinct states, and a failed
/// refresh keeps the previously loaded pool so a transient failure never
/// flashes "everything available".
#[derive(Debug, Clone, Default)]
pub enum AvailabilityState {
    /// No fetch attempted yet
    #[default]
    NotLoaded,
    /// A fetch is in flight; `stale` holds the previous pool if any
    Loading {
        /// Pool from before the refresh started
        stale: Option<NumberPool>,
    },
    /// A fetch succeeded
    Loaded {
        /// The availability snapshot
        pool: NumberPool,
        /// When the snapshot was taken
        refreshed_at: DateTime<Utc>,
    },
    /// The most recent fetch failed
    Failed {
        /// Why it failed
        error: FlowError,
        /// Pool from before the failed refresh, if any
        stale: Option<NumberPool>,
    },
}

impl AvailabilityState {
    /// The best pool currently known - the loaded one, or the stale one kept
    /// across a refresh or failure.
    #[must_use]
    pub const fn pool(&self) -> Option<&NumberPool> {
        match self {
            Self::NotLoaded => None,
            Self::Loading { stale } | Self::Failed { stale, .. } => stale.as_ref(),
            Self::Loaded { pool, .. } => Some(pool),
        }
    }

    /// Take the current pool out, for carrying into `Loading`/`Failed`.
    pub(crate) fn take_pool(&mut self) -> Option<NumberPool> {
        match std::mem::take(self) {
            Self::NotLoaded => None,
            Self::Loading { stale } | Self::Failed { stale, .. } => stale,
            Self::Loaded { pool, .. } => Some(pool),
        }
    }
}

/// The guest's existing purchase in this raffle, from the phone lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participation {
    /// The purchase binding numbers to this guest
    pub purchase_id: PurchaseId,
    /// Phone used for the lookup, doubles as the guest-auth token
    pub phone: String,
    /// Pending tickets, ascending by number
    pub tickets: Vec<OwnedTicket>,
}

impl Participation {
    /// Numbers still awaiting payment, ascending.
    #[must_use]
    pub fn pending_numbers(&self) -> Vec<u32> {
        self.tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Pending)
            .map(|t| t.number)
            .collect()
    }

    /// Unit price from the first ticket that reports one.
    #[must_use]
    pub fn unit_price(&self) -> Option<Money> {
        self.tickets.iter().find_map(|t| t.unit_price)
    }
}

/// Which operation is currently in flight.
///
/// Operations are mutually exclusive per session; the reducer rejects any
/// trigger while another operation is outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Busy {
    /// Nothing outstanding
    #[default]
    Idle,
    /// Raffle detail fetch in flight
    LoadingRaffle,
    /// Availability fetch in flight
    LoadingAvailability,
    /// Participation lookup in flight
    LookingUp,
    /// Reservation POST in flight
    Submitting,
    /// Receipt upload in flight
    Uploading,
    /// Cancel POST in flight
    Cancelling,
}

impl Busy {
    /// Whether a new operation may start.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Local validation failures, caught before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// Submit attempted with nothing selected
    #[error("no numbers selected")]
    EmptySelection,
    /// Reservation attempted with incomplete identity fields
    #[error("name, email and phone are required")]
    MissingIdentity,
    /// Receipt submit attempted without an attached image
    #[error("no receipt image attached")]
    MissingReceipt,
    /// Receipt or cancel attempted without a known purchase
    #[error("no purchase to operate on")]
    NoPurchase,
}

/// Errors surfaced to the session's caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Rejected locally; no network call was made
    #[error("validation failed: {0}")]
    Validation(ValidationIssue),

    /// Selected numbers were taken/processing by the time the server checked
    #[error("numbers no longer available: {0}")]
    Conflict(String),

    /// The operation needs a (re-)authenticated organizer session
    #[error("authentication required")]
    AuthRequired,

    /// The raffle is outside its sale window
    #[error("raffle is not currently on sale")]
    NotOnSale,

    /// The resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The server rejected the request for another reason
    #[error("server rejected the request (status {status}): {detail}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body
        detail: String,
    },

    /// The response body could not be parsed (e.g. an HTML error page)
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request could not be completed at all
    #[error("network failure: {0}")]
    Network(String),
}

impl From<ApiError> for FlowError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Network(message) => Self::Network(message),
            ApiError::MalformedResponse { status, reason } => {
                Self::MalformedResponse(format!("status {status}: {reason}"))
            },
            ApiError::NumbersInConflict(message) => Self::Conflict(message),
            ApiError::AuthRequired => Self::AuthRequired,
            ApiError::NotFound(detail) => Self::NotFound(detail),
            ApiError::Server { status, detail } => {
                if status == 400 && detail.contains("not currently on sale") {
                    Self::NotOnSale
                } else {
                    Self::Server { status, detail }
                }
            },
        }
    }
}

/// Derived workflow phase, for display and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No selection, nothing in flight
    Browsing,
    /// Numbers selected, not yet submitted
    HasSelection,
    /// Selection plus attached receipt, ready to upload
    ReceiptReady,
    /// Reservation POST outstanding
    Submitting,
    /// Receipt upload outstanding
    UploadingReceipt,
    /// Cancel POST outstanding
    Cancelling,
}

/// Complete state of one raffle-detail session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// The raffle this session browses
    pub raffle_id: RaffleId,
    /// Raffle metadata once loaded
    pub raffle: Option<RaffleSnapshot>,
    /// Availability snapshot lifecycle
    pub availability: AvailabilityState,
    /// The user's in-progress selection
    pub selection: Selection,
    /// The guest's existing purchase, when looked up or just created
    pub participation: Option<Participation>,
    /// Receipt image staged for upload
    pub receipt: Option<ReceiptImage>,
    /// Operation currently in flight
    pub busy: Busy,
    /// Whether the irreversible cancel is awaiting explicit confirmation
    pub confirming_cancel: bool,
    /// Most recent unresolved error
    pub last_error: Option<FlowError>,
}

impl SessionState {
    /// Fresh session for a raffle.
    #[must_use]
    pub fn new(raffle_id: RaffleId) -> Self {
        Self {
            raffle_id,
            ..Self::default()
        }
    }

    /// The current workflow phase, derived from busy/selection/receipt.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.busy {
            Busy::Submitting => Phase::Submitting,
            Busy::Uploading => Phase::UploadingReceipt,
            Busy::Cancelling => Phase::Cancelling,
            _ if !self.selection.is_empty() && self.receipt.is_some() => Phase::ReceiptReady,
            _ if !self.selection.is_empty() => Phase::HasSelection,
            _ => Phase::Browsing,
        }
    }

    /// Running total of the current selection at the raffle's price.
    ///
    /// Participation sessions price at the purchase's unit price when the
    /// backend reported one.
    #[must_use]
    pub fn selection_total(&self) -> Money {
        let price = self
            .participation
            .as_ref()
            .and_then(Participation::unit_price)
            .or_else(|| self.raffle.as_ref().map(|r| r.price))
            .unwrap_or_default();
        self.selection.total(price)
    }
}
