//! Reducer for the raffle-detail session.

use crate::environment::StorefrontEnvironment;
use crate::pool::NumberPool;
use crate::session::actions::SessionAction;
use crate::session::types::{
    AvailabilityState, Busy, FlowError, Participation, SessionState, ValidationIssue,
};
use crate::types::{GuestIdentity, Money, OwnedTicket, PurchaseId, RaffleId};
use boletera_api::{ApiError, PurchaseRecord, ReceiptUpload, ReservationRequest, TicketStatus};
use boletera_core::{effect::Effect, reducer::Reducer};
use boletera_runtime::retry::retry_if;
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;

use crate::environment::ProductionStorefrontEnvironment;

/// Reducer driving one raffle-detail session.
///
/// Implements the availability store, the selection gate, and the
/// reservation/receipt/cancel workflow as a single state machine:
///
/// - every toggle funnels through one selectability check
/// - reads (raffle, availability, lookup) retry on transient failures
/// - mutations are sent exactly once; a failure leaves selection, receipt
///   and participation untouched and only clears the busy flag
/// - every successful mutation triggers an availability refresh before the
///   session returns to browsing
pub struct SessionReducer;

impl SessionReducer {
    /// Create a session reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for SessionReducer {
    fn default() -> Self {
        Self::new()
    }
}

type Effects = SmallVec<[Effect<SessionAction>; 4]>;

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = ProductionStorefrontEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            SessionAction::LoadRaffle => load_raffle(state, env),
            SessionAction::RaffleLoaded(snapshot) => {
                if state.busy == Busy::LoadingRaffle {
                    state.busy = Busy::Idle;
                }
                state.raffle = Some(snapshot);
                // Availability is the leaf dependency: populate it next.
                smallvec![Effect::future(async {
                    Some(SessionAction::LoadAvailability)
                })]
            },
            SessionAction::RaffleLoadFailed(error) => {
                if state.busy == Busy::LoadingRaffle {
                    state.busy = Busy::Idle;
                }
                tracing::warn!(error = %error, "raffle load failed");
                state.last_error = Some(error);
                smallvec![]
            },

            SessionAction::LoadAvailability => load_availability(state, env),
            SessionAction::AvailabilityLoaded { taken, processing } => {
                availability_loaded(state, env, taken, processing)
            },
            SessionAction::AvailabilityLoadFailed(error) => {
                if state.busy == Busy::LoadingAvailability {
                    state.busy = Busy::Idle;
                }
                tracing::warn!(error = %error, "availability load failed, keeping stale pool");
                let stale = state.availability.take_pool();
                state.availability = AvailabilityState::Failed {
                    error: error.clone(),
                    stale,
                };
                state.last_error = Some(error);
                smallvec![]
            },

            SessionAction::ToggleNumber(number) => {
                if state.busy.is_idle() && can_toggle(state, number) {
                    state.selection.toggle(number);
                }
                smallvec![]
            },
            SessionAction::ClearSelection => {
                if state.busy.is_idle() {
                    state.selection.clear();
                }
                smallvec![]
            },

            SessionAction::SubmitReservation { identity } => submit_reservation(state, env, identity),
            SessionAction::ReservationAccepted { purchase_id, phone } => {
                reservation_accepted(state, purchase_id, phone)
            },
            SessionAction::ReservationFailed(error) => {
                // Selection preserved so the user can retry or re-select.
                if state.busy == Busy::Submitting {
                    state.busy = Busy::Idle;
                }
                tracing::warn!(error = %error, "reservation rejected");
                state.last_error = Some(error);
                smallvec![]
            },

            SessionAction::LookupParticipation { phone } => lookup_participation(state, env, phone),
            SessionAction::ParticipationLoaded(participation) => {
                if state.busy == Busy::LookingUp {
                    state.busy = Busy::Idle;
                }
                state.participation = Some(participation);
                // Fresh context: the pay-my-numbers selection starts empty.
                state.selection.clear();
                smallvec![]
            },
            SessionAction::ParticipationNotFound => {
                if state.busy == Busy::LookingUp {
                    state.busy = Busy::Idle;
                }
                state.participation = None;
                smallvec![]
            },
            SessionAction::LookupFailed(error) => {
                if state.busy == Busy::LookingUp {
                    state.busy = Busy::Idle;
                }
                tracing::warn!(error = %error, "participation lookup failed");
                state.last_error = Some(error);
                smallvec![]
            },

            SessionAction::AttachReceipt(image) => {
                if state.busy.is_idle() {
                    state.receipt = Some(image);
                }
                smallvec![]
            },
            SessionAction::DiscardReceipt => {
                if state.busy.is_idle() {
                    state.receipt = None;
                }
                smallvec![]
            },
            SessionAction::SubmitReceipt => submit_receipt(state, env),
            SessionAction::ReceiptAccepted => {
                if state.busy != Busy::Uploading {
                    return smallvec![];
                }
                state.busy = Busy::Idle;
                state.selection.clear();
                state.receipt = None;
                refresh_after_mutation()
            },
            SessionAction::ReceiptFailed(error) => {
                // Selection and attached file preserved.
                if state.busy == Busy::Uploading {
                    state.busy = Busy::Idle;
                }
                tracing::warn!(error = %error, "receipt upload failed");
                state.last_error = Some(error);
                smallvec![]
            },

            SessionAction::RequestCancel => {
                if !state.busy.is_idle() {
                    return smallvec![];
                }
                if state.participation.is_none() {
                    state.last_error =
                        Some(FlowError::Validation(ValidationIssue::NoPurchase));
                    return smallvec![];
                }
                state.confirming_cancel = true;
                smallvec![]
            },
            SessionAction::DismissCancel => {
                state.confirming_cancel = false;
                smallvec![]
            },
            SessionAction::ConfirmCancel => confirm_cancel(state, env),
            SessionAction::CancelAccepted => {
                if state.busy != Busy::Cancelling {
                    return smallvec![];
                }
                state.busy = Busy::Idle;
                state.participation = None;
                state.selection.clear();
                state.receipt = None;
                refresh_after_mutation()
            },
            SessionAction::CancelFailed(error) => {
                // Nothing changed server-side; keep the participation.
                if state.busy == Busy::Cancelling {
                    state.busy = Busy::Idle;
                }
                tracing::warn!(error = %error, "cancel rejected");
                state.last_error = Some(error);
                smallvec![]
            },

            SessionAction::DismissError => {
                state.last_error = None;
                smallvec![]
            },
        }
    }
}

/// The single selection gate.
///
/// Every entry point that can select a number dispatches `ToggleNumber`,
/// which lands here. In the visitor flow a number must be selectable in the
/// pool; in the participation flow only the guest's own pending numbers not
/// already processing may be toggled.
fn can_toggle(state: &SessionState, number: u32) -> bool {
    let Some(pool) = state.availability.pool() else {
        return false;
    };

    match &state.participation {
        None => pool.is_selectable(number),
        Some(participation) => {
            participation.pending_numbers().contains(&number) && !pool.is_processing(number)
        },
    }
}

fn refresh_after_mutation() -> Effects {
    smallvec![Effect::future(async {
        Some(SessionAction::LoadAvailability)
    })]
}

fn load_raffle(state: &mut SessionState, env: &ProductionStorefrontEnvironment) -> Effects {
    if !state.busy.is_idle() {
        return smallvec![];
    }
    state.busy = Busy::LoadingRaffle;
    state.last_error = None;

    let gateway = env.gateway();
    let policy = env.read_retry();
    let raffle_id = state.raffle_id;

    smallvec![Effect::future(async move {
        let result = retry_if(
            policy,
            || {
                let gateway = Arc::clone(&gateway);
                async move { gateway.raffle_detail(raffle_id.value()).await }
            },
            ApiError::is_transient,
        )
        .await;

        Some(match result {
            Ok(detail) => SessionAction::RaffleLoaded(detail.into()),
            Err(error) => SessionAction::RaffleLoadFailed(error.into()),
        })
    })]
}

fn load_availability(state: &mut SessionState, env: &ProductionStorefrontEnvironment) -> Effects {
    // Refreshes triggered after a mutation run from Idle; a load requested
    // while anything is outstanding is dropped.
    if !state.busy.is_idle() {
        return smallvec![];
    }
    // The snapshot is meaningless without the raffle's number range, so a
    // load requested before the raffle arrives is dropped; `RaffleLoaded`
    // triggers the load itself.
    if state.raffle.is_none() {
        tracing::debug!("availability load requested before the raffle; dropped");
        return smallvec![];
    }
    state.busy = Busy::LoadingAvailability;

    let stale = state.availability.take_pool();
    state.availability = AvailabilityState::Loading { stale };

    let gateway = env.gateway();
    let policy = env.read_retry();
    let raffle_id = state.raffle_id;

    smallvec![Effect::future(async move {
        let result = retry_if(
            policy,
            || {
                let gateway = Arc::clone(&gateway);
                async move { gateway.availability(raffle_id.value()).await }
            },
            ApiError::is_transient,
        )
        .await;

        Some(match result {
            Ok(availability) => SessionAction::AvailabilityLoaded {
                taken: availability.taken_numbers,
                processing: availability.processing_numbers,
            },
            Err(error) => SessionAction::AvailabilityLoadFailed(error.into()),
        })
    })]
}

fn availability_loaded(
    state: &mut SessionState,
    env: &ProductionStorefrontEnvironment,
    taken: Vec<u32>,
    processing: Vec<u32>,
) -> Effects {
    if state.busy == Busy::LoadingAvailability {
        state.busy = Busy::Idle;
    }

    let Some(raffle) = &state.raffle else {
        // A snapshot without raffle bounds is unusable; keep whatever we had.
        return smallvec![];
    };

    // Wholesale replacement - no incremental merge.
    let pool = NumberPool::with_sets(
        raffle.id,
        raffle.range_start,
        raffle.range_end,
        taken,
        processing,
    );

    // Numbers grabbed by another client since the last snapshot leave the
    // selection; the user re-selects against fresh data.
    match &state.participation {
        None => state.selection.retain(|n| pool.is_selectable(*n)),
        Some(participation) => {
            let pending = participation.pending_numbers();
            state
                .selection
                .retain(|n| pending.contains(n) && !pool.is_processing(*n));
        },
    }

    state.availability = AvailabilityState::Loaded {
        pool,
        refreshed_at: env.clock().now(),
    };

    smallvec![]
}

fn submit_reservation(
    state: &mut SessionState,
    env: &ProductionStorefrontEnvironment,
    identity: GuestIdentity,
) -> Effects {
    if !state.busy.is_idle() {
        return smallvec![];
    }
    if state.selection.is_empty() {
        state.last_error = Some(FlowError::Validation(ValidationIssue::EmptySelection));
        return smallvec![];
    }
    if !identity.is_complete() {
        state.last_error = Some(FlowError::Validation(ValidationIssue::MissingIdentity));
        return smallvec![];
    }

    state.busy = Busy::Submitting;
    state.last_error = None;

    let request = ReservationRequest {
        raffle_id: state.raffle_id.value(),
        numbers: state.selection.numbers(),
        guest_name: identity.name,
        guest_email: identity.email,
        guest_phone: identity.phone,
    };
    let phone = request.guest_phone.clone();
    let gateway = env.gateway();

    // Mutation: exactly one attempt, never retried.
    smallvec![Effect::future(async move {
        Some(match gateway.create_reservation(request).await {
            Ok(ack) => SessionAction::ReservationAccepted {
                purchase_id: PurchaseId::new(ack.id),
                phone,
            },
            Err(error) => SessionAction::ReservationFailed(error.into()),
        })
    })]
}

fn reservation_accepted(
    state: &mut SessionState,
    purchase_id: PurchaseId,
    phone: String,
) -> Effects {
    if state.busy != Busy::Submitting {
        return smallvec![];
    }
    state.busy = Busy::Idle;

    // The reserved numbers are now this guest's pending tickets.
    let unit_price = state.raffle.as_ref().map(|r| r.price);
    let tickets = state
        .selection
        .iter()
        .map(|number| OwnedTicket {
            number,
            status: TicketStatus::Pending,
            unit_price,
        })
        .collect();
    state.participation = Some(Participation {
        purchase_id,
        phone,
        tickets,
    });

    state.selection.clear();
    refresh_after_mutation()
}

fn lookup_participation(
    state: &mut SessionState,
    env: &ProductionStorefrontEnvironment,
    phone: String,
) -> Effects {
    if !state.busy.is_idle() {
        return smallvec![];
    }
    state.busy = Busy::LookingUp;
    state.last_error = None;

    let gateway = env.gateway();
    let policy = env.read_retry();
    let raffle_id = state.raffle_id;

    smallvec![Effect::future(async move {
        let result = retry_if(
            policy,
            || {
                let gateway = Arc::clone(&gateway);
                let phone = phone.clone();
                async move { gateway.purchases_by_phone(phone).await }
            },
            ApiError::is_transient,
        )
        .await;

        Some(match result {
            Ok(records) => match participation_for(raffle_id, &phone, records) {
                Some(participation) => SessionAction::ParticipationLoaded(participation),
                None => SessionAction::ParticipationNotFound,
            },
            Err(error) => SessionAction::LookupFailed(error.into()),
        })
    })]
}

/// Pick this raffle's purchase out of the lookup results.
///
/// Keeps only pending details, ascending by number - paid, expired and
/// cancelled lines are not payable again.
fn participation_for(
    raffle_id: RaffleId,
    phone: &str,
    records: Vec<PurchaseRecord>,
) -> Option<Participation> {
    let record = records
        .into_iter()
        .find(|r| r.raffle_id == raffle_id.value())?;

    let mut tickets: Vec<OwnedTicket> = record
        .details
        .iter()
        .filter(|line| line.status == TicketStatus::Pending)
        .map(|line| OwnedTicket {
            number: line.number,
            status: line.status,
            unit_price: line.unit_price.as_deref().and_then(Money::parse_decimal),
        })
        .collect();
    tickets.sort_by_key(|t| t.number);

    if tickets.is_empty() {
        return None;
    }

    Some(Participation {
        purchase_id: PurchaseId::new(record.id),
        phone: phone.to_string(),
        tickets,
    })
}

fn submit_receipt(state: &mut SessionState, env: &ProductionStorefrontEnvironment) -> Effects {
    if !state.busy.is_idle() {
        return smallvec![];
    }
    let Some(participation) = &state.participation else {
        state.last_error = Some(FlowError::Validation(ValidationIssue::NoPurchase));
        return smallvec![];
    };
    if state.selection.is_empty() {
        state.last_error = Some(FlowError::Validation(ValidationIssue::EmptySelection));
        return smallvec![];
    }
    let Some(receipt) = &state.receipt else {
        state.last_error = Some(FlowError::Validation(ValidationIssue::MissingReceipt));
        return smallvec![];
    };

    state.busy = Busy::Uploading;
    state.last_error = None;

    let upload = ReceiptUpload {
        image: receipt.bytes.clone(),
        filename: receipt.filename.clone(),
        content_type: receipt.content_type.clone(),
        phone: participation.phone.clone(),
        numbers: state.selection.numbers(),
    };
    let purchase_id = participation.purchase_id;
    let gateway = env.gateway();

    // Mutation: exactly one attempt, never retried.
    smallvec![Effect::future(async move {
        Some(
            match gateway.upload_receipt(purchase_id.value(), upload).await {
                Ok(_) => SessionAction::ReceiptAccepted,
                Err(error) => SessionAction::ReceiptFailed(error.into()),
            },
        )
    })]
}

fn confirm_cancel(state: &mut SessionState, env: &ProductionStorefrontEnvironment) -> Effects {
    if !state.confirming_cancel || !state.busy.is_idle() {
        return smallvec![];
    }
    let Some(participation) = &state.participation else {
        state.confirming_cancel = false;
        state.last_error = Some(FlowError::Validation(ValidationIssue::NoPurchase));
        return smallvec![];
    };

    state.confirming_cancel = false;
    state.busy = Busy::Cancelling;
    state.last_error = None;

    let purchase_id = participation.purchase_id;
    let phone = participation.phone.clone();
    let gateway = env.gateway();

    // Mutation: exactly one attempt, never retried.
    smallvec![Effect::future(async move {
        Some(
            match gateway.cancel_purchase(purchase_id.value(), phone).await {
                Ok(_) => SessionAction::CancelAccepted,
                Err(error) => SessionAction::CancelFailed(error.into()),
            },
        )
    })]
}
