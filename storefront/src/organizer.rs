//! Organizer receipt-verification flow.
//!
//! Organizers list receipts awaiting verification and approve or reject
//! them. The flow dispatches on an explicit [`Session`] held in state -
//! never an ambient auth flag - and drops that session the moment the
//! backend reports it invalid, so the caller redirects to login instead of
//! looping retries.

use crate::environment::{ProductionStorefrontEnvironment, StorefrontEnvironment};
use crate::session::types::FlowError;
use crate::types::{PaymentId, ViewMode};
use boletera_api::{ApiError, Session, VerificationDecision, VerificationItem};
use boletera_core::{effect::Effect, reducer::Reducer};
use boletera_runtime::retry::retry_if;
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;

/// Which review operation is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewBusy {
    /// Nothing outstanding
    #[default]
    Idle,
    /// Pending-list fetch in flight
    Loading,
    /// A verify POST in flight
    Deciding,
}

impl ReviewBusy {
    /// Whether a new operation may start.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// State of the organizer review queue.
#[derive(Debug, Clone, Default)]
pub struct ReviewState {
    /// Organizer session; `None` after the backend rejects it
    pub session: Option<Session>,
    /// Receipts awaiting a decision
    pub pending: Vec<VerificationItem>,
    /// Operation currently in flight
    pub busy: ReviewBusy,
    /// Most recent unresolved error
    pub last_error: Option<FlowError>,
}

impl ReviewState {
    /// Review queue for an authenticated organizer.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self {
            session: Some(session),
            pending: Vec::new(),
            busy: ReviewBusy::Idle,
            last_error: None,
        }
    }

    /// Review queue for a view mode; `None` for visitors.
    #[must_use]
    pub fn for_mode(mode: &ViewMode) -> Option<Self> {
        mode.session().cloned().map(Self::new)
    }
}

/// Actions for the review queue.
#[derive(Debug, Clone)]
pub enum ReviewAction {
    /// Fetch (or refresh) the pending-verification list.
    LoadPending,
    /// The pending list arrived.
    PendingLoaded(Vec<VerificationItem>),
    /// The pending-list fetch failed after retries.
    PendingFailed(FlowError),
    /// Organizer approved or rejected one receipt.
    Decide {
        /// The payment under review
        payment_id: PaymentId,
        /// Approve or reject
        decision: VerificationDecision,
    },
    /// The backend recorded the decision.
    DecisionAccepted {
        /// The payment that was decided
        payment_id: PaymentId,
    },
    /// The verify call failed.
    DecisionFailed(FlowError),
    /// Organizer acknowledged the displayed error.
    DismissError,
}

/// Reducer for the organizer review queue.
///
/// The pending-list read retries on transient failures; verify calls are
/// sent exactly once. After an accepted decision the list is reloaded so
/// the queue reflects the backend's authoritative state.
pub struct ReviewReducer;

impl ReviewReducer {
    /// Create a review reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for ReviewReducer {
    fn default() -> Self {
        Self::new()
    }
}

type Effects = SmallVec<[Effect<ReviewAction>; 4]>;

impl Reducer for ReviewReducer {
    type State = ReviewState;
    type Action = ReviewAction;
    type Environment = ProductionStorefrontEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            ReviewAction::LoadPending => load_pending(state, env),
            ReviewAction::PendingLoaded(items) => {
                if state.busy == ReviewBusy::Loading {
                    state.busy = ReviewBusy::Idle;
                }
                state.pending = items;
                smallvec![]
            },
            ReviewAction::PendingFailed(error) => {
                if state.busy == ReviewBusy::Loading {
                    state.busy = ReviewBusy::Idle;
                }
                tracing::warn!(error = %error, "pending-verification load failed");
                if error == FlowError::AuthRequired {
                    state.session = None;
                }
                state.last_error = Some(error);
                smallvec![]
            },
            ReviewAction::Decide {
                payment_id,
                decision,
            } => decide(state, env, payment_id, decision),
            ReviewAction::DecisionAccepted { payment_id } => {
                if state.busy != ReviewBusy::Deciding {
                    return smallvec![];
                }
                state.busy = ReviewBusy::Idle;
                state
                    .pending
                    .retain(|item| item.payment_id != payment_id.value());
                // Reload so the queue matches the backend's view.
                smallvec![Effect::future(async { Some(ReviewAction::LoadPending) })]
            },
            ReviewAction::DecisionFailed(error) => {
                if state.busy == ReviewBusy::Deciding {
                    state.busy = ReviewBusy::Idle;
                }
                tracing::warn!(error = %error, "verification decision rejected");
                if error == FlowError::AuthRequired {
                    state.session = None;
                }
                state.last_error = Some(error);
                smallvec![]
            },
            ReviewAction::DismissError => {
                state.last_error = None;
                smallvec![]
            },
        }
    }
}

fn load_pending(state: &mut ReviewState, env: &ProductionStorefrontEnvironment) -> Effects {
    if !state.busy.is_idle() {
        return smallvec![];
    }
    let Some(session) = state.session.clone() else {
        state.last_error = Some(FlowError::AuthRequired);
        return smallvec![];
    };

    state.busy = ReviewBusy::Loading;
    state.last_error = None;

    let gateway = env.gateway();
    let policy = env.read_retry();

    smallvec![Effect::future(async move {
        let result = retry_if(
            policy,
            || {
                let gateway = Arc::clone(&gateway);
                let session = session.clone();
                async move { gateway.pending_verifications(session).await }
            },
            ApiError::is_transient,
        )
        .await;

        Some(match result {
            Ok(items) => ReviewAction::PendingLoaded(items),
            Err(error) => ReviewAction::PendingFailed(error.into()),
        })
    })]
}

fn decide(
    state: &mut ReviewState,
    env: &ProductionStorefrontEnvironment,
    payment_id: PaymentId,
    decision: VerificationDecision,
) -> Effects {
    if !state.busy.is_idle() {
        return smallvec![];
    }
    let Some(session) = state.session.clone() else {
        state.last_error = Some(FlowError::AuthRequired);
        return smallvec![];
    };

    state.busy = ReviewBusy::Deciding;
    state.last_error = None;

    let gateway = env.gateway();

    // Mutation: exactly one attempt, never retried.
    smallvec![Effect::future(async move {
        Some(
            match gateway
                .verify_payment(session, payment_id.value(), decision)
                .await
            {
                Ok(_) => ReviewAction::DecisionAccepted { payment_id },
                Err(error) => ReviewAction::DecisionFailed(error.into()),
            },
        )
    })]
}
