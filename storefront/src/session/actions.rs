//! Actions for the raffle-detail session.

use crate::session::types::{FlowError, Participation, RaffleSnapshot};
use crate::types::{GuestIdentity, PurchaseId, ReceiptImage};

/// Everything that can happen in a raffle-detail session.
///
/// User intents and backend outcomes share one action type; outcomes are fed
/// back into the reducer by the effect futures, so every state transition
/// goes through `reduce` and is unit-testable without a network.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Fetch the raffle metadata (entry point of a session).
    LoadRaffle,
    /// Raffle metadata arrived.
    RaffleLoaded(RaffleSnapshot),
    /// Raffle metadata fetch failed after retries.
    RaffleLoadFailed(FlowError),

    /// Fetch (or refresh) the availability snapshot.
    LoadAvailability,
    /// A fresh availability snapshot arrived.
    AvailabilityLoaded {
        /// Numbers already purchased or reserved
        taken: Vec<u32>,
        /// Numbers with a receipt awaiting verification
        processing: Vec<u32>,
    },
    /// Availability fetch failed after retries.
    AvailabilityLoadFailed(FlowError),

    /// User clicked a number (grid or centena modal - same gate either way).
    ToggleNumber(u32),
    /// User discarded the whole selection.
    ClearSelection,

    /// User submitted the selection as a reservation.
    SubmitReservation {
        /// Guest identity fields from the form
        identity: GuestIdentity,
    },
    /// The backend accepted the reservation.
    ReservationAccepted {
        /// The created purchase
        purchase_id: PurchaseId,
        /// Phone the reservation was made with
        phone: String,
    },
    /// The backend rejected the reservation (or the call failed).
    ReservationFailed(FlowError),

    /// Look up the guest's existing purchase by phone.
    LookupParticipation {
        /// Phone to query
        phone: String,
    },
    /// A purchase for this raffle was found.
    ParticipationLoaded(Participation),
    /// The lookup completed with no purchase for this raffle.
    ParticipationNotFound,
    /// The lookup failed after retries.
    LookupFailed(FlowError),

    /// User attached a receipt image.
    AttachReceipt(ReceiptImage),
    /// User removed the attached receipt image.
    DiscardReceipt,
    /// User submitted the receipt for the selected pending numbers.
    SubmitReceipt,
    /// The backend accepted the receipt.
    ReceiptAccepted,
    /// The receipt upload failed.
    ReceiptFailed(FlowError),

    /// User asked to cancel the reservation (opens confirmation).
    RequestCancel,
    /// User confirmed the irreversible cancel.
    ConfirmCancel,
    /// User backed out of the confirmation.
    DismissCancel,
    /// The backend cancelled the purchase and released its numbers.
    CancelAccepted,
    /// The cancel call failed.
    CancelFailed(FlowError),

    /// User acknowledged the displayed error.
    DismissError,
}
