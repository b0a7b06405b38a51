//! Reducer-level tests for the raffle-detail session.
//!
//! Effects are awaited directly where a backend outcome matters; the
//! scripted gateway records every call so the tests can assert exactly what
//! went over the wire.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use super::actions::SessionAction;
use super::reducer::SessionReducer;
use super::types::{
    AvailabilityState, Busy, FlowError, Participation, Phase, RaffleSnapshot, SessionState,
    ValidationIssue,
};
use crate::environment::ProductionStorefrontEnvironment;
use crate::pool::NumberPool;
use crate::types::{GuestIdentity, Money, OwnedTicket, PurchaseId, RaffleId, ReceiptImage};
use boletera_api::{ApiError, ReservationAck, TicketStatus};
use boletera_core::environment::Clock;
use boletera_core::{effect::Effect, reducer::Reducer};
use boletera_runtime::retry::RetryPolicy;
use boletera_testing::{GatewayCall, ScriptedGateway, test_clock};
use std::sync::Arc;
use std::time::Duration;

fn test_env() -> (Arc<ScriptedGateway>, ProductionStorefrontEnvironment) {
    let gateway = Arc::new(ScriptedGateway::new());
    let env = ProductionStorefrontEnvironment::new(gateway.clone(), Arc::new(test_clock()))
        .with_read_retry(RetryPolicy::reads().with_initial_delay(Duration::from_millis(1)));
    (gateway, env)
}

fn snapshot() -> RaffleSnapshot {
    RaffleSnapshot {
        id: RaffleId::new(1),
        name: "Gran Rifa".to_string(),
        price: Money::from_pesos(50),
        range_start: 0,
        range_end: 99,
        sale_end_at: None,
        draw_scheduled_at: None,
    }
}

/// Session with a loaded raffle and availability snapshot.
fn loaded_state(taken: &[u32], processing: &[u32]) -> SessionState {
    let mut state = SessionState::new(RaffleId::new(1));
    state.raffle = Some(snapshot());
    state.availability = AvailabilityState::Loaded {
        pool: NumberPool::with_sets(
            RaffleId::new(1),
            0,
            99,
            taken.iter().copied(),
            processing.iter().copied(),
        ),
        refreshed_at: test_clock().now(),
    };
    state
}

fn identity() -> GuestIdentity {
    GuestIdentity {
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        phone: "5551234567".to_string(),
    }
}

fn receipt_image() -> ReceiptImage {
    ReceiptImage {
        bytes: vec![0xFF, 0xD8],
        filename: "comprobante.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
    }
}

fn participation(pending: &[u32]) -> Participation {
    Participation {
        purchase_id: PurchaseId::new(77),
        phone: "5551234567".to_string(),
        tickets: pending
            .iter()
            .map(|n| OwnedTicket {
                number: *n,
                status: TicketStatus::Pending,
                unit_price: Some(Money::from_pesos(50)),
            })
            .collect(),
    }
}

async fn run_effect(effect: Effect<SessionAction>) -> Option<SessionAction> {
    match effect {
        Effect::Future(future) => future.await,
        other => panic!("expected a future effect, got {other:?}"),
    }
}

// ============================================================================
// Selection gating
// ============================================================================

#[test]
fn taken_and_processing_numbers_never_enter_the_selection() {
    let reducer = SessionReducer::new();
    let (_gateway, env) = test_env();
    let mut state = loaded_state(&[5, 10], &[12]);

    for number in [5, 10, 12, 7] {
        reducer.reduce(&mut state, SessionAction::ToggleNumber(number), &env);
    }

    assert_eq!(state.selection.numbers(), vec![7]);
}

#[test]
fn nothing_is_selectable_before_availability_loads() {
    let reducer = SessionReducer::new();
    let (_gateway, env) = test_env();
    let mut state = SessionState::new(RaffleId::new(1));

    reducer.reduce(&mut state, SessionAction::ToggleNumber(3), &env);

    assert!(state.selection.is_empty());
}

#[test]
fn toggle_is_rejected_while_an_operation_is_outstanding() {
    let reducer = SessionReducer::new();
    let (_gateway, env) = test_env();
    let mut state = loaded_state(&[], &[]);
    state.busy = Busy::Submitting;

    reducer.reduce(&mut state, SessionAction::ToggleNumber(3), &env);

    assert!(state.selection.is_empty());
}

#[test]
fn participation_gate_allows_only_own_pending_numbers() {
    let reducer = SessionReducer::new();
    let (_gateway, env) = test_env();
    // 1,2,3 belong to the guest's purchase; 3 is already processing.
    let mut state = loaded_state(&[1, 2, 3, 50], &[3]);
    state.participation = Some(participation(&[1, 2, 3]));

    for number in [1, 3, 50, 60] {
        reducer.reduce(&mut state, SessionAction::ToggleNumber(number), &env);
    }

    assert_eq!(state.selection.numbers(), vec![1]);
}

// ============================================================================
// Reservation workflow
// ============================================================================

#[test]
fn empty_selection_is_rejected_before_any_network_call() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    let mut state = loaded_state(&[], &[]);

    let effects = reducer.reduce(
        &mut state,
        SessionAction::SubmitReservation {
            identity: identity(),
        },
        &env,
    );

    assert!(effects.is_empty());
    assert_eq!(
        state.last_error,
        Some(FlowError::Validation(ValidationIssue::EmptySelection))
    );
    assert!(gateway.calls().is_empty());
    assert!(state.busy.is_idle());
}

#[test]
fn incomplete_identity_is_rejected_before_any_network_call() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    let mut state = loaded_state(&[], &[]);
    reducer.reduce(&mut state, SessionAction::ToggleNumber(1), &env);

    let effects = reducer.reduce(
        &mut state,
        SessionAction::SubmitReservation {
            identity: GuestIdentity::default(),
        },
        &env,
    );

    assert!(effects.is_empty());
    assert_eq!(
        state.last_error,
        Some(FlowError::Validation(ValidationIssue::MissingIdentity))
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn successful_reservation_clears_selection_and_refreshes_availability() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    gateway.push_reservation(Ok(ReservationAck {
        id: 42,
        status: Some("pending".to_string()),
        total_amount: Some("150.00".to_string()),
    }));

    let mut state = loaded_state(&[5, 10], &[]);
    for number in [1, 2, 7] {
        reducer.reduce(&mut state, SessionAction::ToggleNumber(number), &env);
    }

    let mut effects = reducer.reduce(
        &mut state,
        SessionAction::SubmitReservation {
            identity: identity(),
        },
        &env,
    );
    assert_eq!(state.busy, Busy::Submitting);
    assert_eq!(state.phase(), Phase::Submitting);

    let outcome = run_effect(effects.remove(0)).await.unwrap();
    let SessionAction::ReservationAccepted { purchase_id, .. } = &outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(*purchase_id, PurchaseId::new(42));

    let mut effects = reducer.reduce(&mut state, outcome, &env);

    assert!(state.selection.is_empty());
    assert!(state.busy.is_idle());
    assert_eq!(
        state.participation.as_ref().unwrap().pending_numbers(),
        vec![1, 2, 7]
    );

    // The follow-up effect triggers the availability refresh.
    let follow_up = run_effect(effects.remove(0)).await.unwrap();
    assert!(matches!(follow_up, SessionAction::LoadAvailability));

    // Exactly one POST, with the selection in ascending order.
    let posts: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            GatewayCall::CreateReservation(request) => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].numbers, vec![1, 2, 7]);
    assert_eq!(posts[0].guest_phone, "5551234567");
}

#[tokio::test]
async fn conflict_on_submit_preserves_the_selection() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    gateway.push_reservation(Err(ApiError::NumbersInConflict(
        "some numbers are en proceso".to_string(),
    )));

    let mut state = loaded_state(&[5, 10], &[]);
    for number in [1, 2, 7] {
        reducer.reduce(&mut state, SessionAction::ToggleNumber(number), &env);
    }

    let mut effects = reducer.reduce(
        &mut state,
        SessionAction::SubmitReservation {
            identity: identity(),
        },
        &env,
    );
    let outcome = run_effect(effects.remove(0)).await.unwrap();
    let effects = reducer.reduce(&mut state, outcome, &env);

    assert!(effects.is_empty(), "a failed mutation is never retried");
    assert_eq!(state.selection.numbers(), vec![1, 2, 7]);
    assert!(state.busy.is_idle());
    assert!(matches!(state.last_error, Some(FlowError::Conflict(_))));
    assert_eq!(
        gateway.count_calls(|c| matches!(c, GatewayCall::CreateReservation(_))),
        1
    );
}

#[test]
fn fresh_availability_prunes_numbers_lost_to_another_client() {
    let reducer = SessionReducer::new();
    let (_gateway, env) = test_env();
    let mut state = loaded_state(&[], &[]);
    for number in [1, 2, 7] {
        reducer.reduce(&mut state, SessionAction::ToggleNumber(number), &env);
    }

    // Number 2 got taken elsewhere between snapshots.
    reducer.reduce(
        &mut state,
        SessionAction::AvailabilityLoaded {
            taken: vec![2],
            processing: vec![],
        },
        &env,
    );

    assert_eq!(state.selection.numbers(), vec![1, 7]);
}

// ============================================================================
// Receipt workflow
// ============================================================================

#[test]
fn receipt_guards_reject_locally() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    let mut state = loaded_state(&[1, 2], &[]);

    // No purchase known yet.
    let effects = reducer.reduce(&mut state, SessionAction::SubmitReceipt, &env);
    assert!(effects.is_empty());
    assert_eq!(
        state.last_error,
        Some(FlowError::Validation(ValidationIssue::NoPurchase))
    );

    // Purchase known, nothing selected.
    state.participation = Some(participation(&[1, 2]));
    let effects = reducer.reduce(&mut state, SessionAction::SubmitReceipt, &env);
    assert!(effects.is_empty());
    assert_eq!(
        state.last_error,
        Some(FlowError::Validation(ValidationIssue::EmptySelection))
    );

    // Numbers selected, no file attached.
    reducer.reduce(&mut state, SessionAction::ToggleNumber(1), &env);
    let effects = reducer.reduce(&mut state, SessionAction::SubmitReceipt, &env);
    assert!(effects.is_empty());
    assert_eq!(
        state.last_error,
        Some(FlowError::Validation(ValidationIssue::MissingReceipt))
    );

    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn accepted_receipt_clears_selection_and_file() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    gateway.push_receipt(Ok(boletera_api::Ack::default()));

    let mut state = loaded_state(&[1, 2, 3], &[]);
    state.participation = Some(participation(&[1, 2, 3]));
    reducer.reduce(&mut state, SessionAction::ToggleNumber(1), &env);
    reducer.reduce(&mut state, SessionAction::ToggleNumber(2), &env);
    reducer.reduce(
        &mut state,
        SessionAction::AttachReceipt(receipt_image()),
        &env,
    );
    assert_eq!(state.phase(), Phase::ReceiptReady);

    let mut effects = reducer.reduce(&mut state, SessionAction::SubmitReceipt, &env);
    assert_eq!(state.busy, Busy::Uploading);

    let outcome = run_effect(effects.remove(0)).await.unwrap();
    assert!(matches!(outcome, SessionAction::ReceiptAccepted));
    let mut effects = reducer.reduce(&mut state, outcome, &env);

    assert!(state.selection.is_empty());
    assert!(state.receipt.is_none());
    assert!(state.busy.is_idle());

    let follow_up = run_effect(effects.remove(0)).await.unwrap();
    assert!(matches!(follow_up, SessionAction::LoadAvailability));

    let uploads: Vec<_> = gateway
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            GatewayCall::UploadReceipt {
                purchase_id,
                numbers,
            } => Some((purchase_id, numbers)),
            _ => None,
        })
        .collect();
    assert_eq!(uploads, vec![(77, vec![1, 2])]);
}

#[tokio::test]
async fn failed_upload_preserves_selection_and_file() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    gateway.push_receipt(Err(ApiError::Server {
        status: 500,
        detail: "boom".to_string(),
    }));

    let mut state = loaded_state(&[1, 2], &[]);
    state.participation = Some(participation(&[1, 2]));
    reducer.reduce(&mut state, SessionAction::ToggleNumber(1), &env);
    reducer.reduce(
        &mut state,
        SessionAction::AttachReceipt(receipt_image()),
        &env,
    );

    let mut effects = reducer.reduce(&mut state, SessionAction::SubmitReceipt, &env);
    let outcome = run_effect(effects.remove(0)).await.unwrap();
    let effects = reducer.reduce(&mut state, outcome, &env);

    assert!(effects.is_empty());
    assert_eq!(state.selection.numbers(), vec![1]);
    assert_eq!(state.receipt, Some(receipt_image()));
    assert!(state.busy.is_idle());
    assert!(matches!(state.last_error, Some(FlowError::Server { .. })));
    assert_eq!(
        gateway.count_calls(|c| matches!(c, GatewayCall::UploadReceipt { .. })),
        1
    );
}

// ============================================================================
// Cancel workflow
// ============================================================================

#[test]
fn cancel_requires_explicit_confirmation() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    let mut state = loaded_state(&[1, 2, 3], &[]);
    state.participation = Some(participation(&[1, 2, 3]));

    // Request opens the confirmation; nothing is sent yet.
    let effects = reducer.reduce(&mut state, SessionAction::RequestCancel, &env);
    assert!(effects.is_empty());
    assert!(state.confirming_cancel);
    assert!(gateway.calls().is_empty());

    // Backing out leaves everything unchanged.
    reducer.reduce(&mut state, SessionAction::DismissCancel, &env);
    assert!(!state.confirming_cancel);

    // Confirm without a pending request is ignored.
    let effects = reducer.reduce(&mut state, SessionAction::ConfirmCancel, &env);
    assert!(effects.is_empty());
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn confirmed_cancel_releases_the_purchase() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    gateway.push_cancel(Ok(boletera_api::Ack::default()));

    let mut state = loaded_state(&[1, 2, 3], &[]);
    state.participation = Some(participation(&[1, 2, 3]));

    reducer.reduce(&mut state, SessionAction::RequestCancel, &env);
    let mut effects = reducer.reduce(&mut state, SessionAction::ConfirmCancel, &env);
    assert_eq!(state.busy, Busy::Cancelling);

    let outcome = run_effect(effects.remove(0)).await.unwrap();
    assert!(matches!(outcome, SessionAction::CancelAccepted));
    let mut effects = reducer.reduce(&mut state, outcome, &env);

    assert!(state.participation.is_none());
    assert!(state.busy.is_idle());

    let follow_up = run_effect(effects.remove(0)).await.unwrap();
    assert!(matches!(follow_up, SessionAction::LoadAvailability));

    assert_eq!(
        gateway.count_calls(|c| matches!(
            c,
            GatewayCall::CancelPurchase {
                purchase_id: 77,
                ..
            }
        )),
        1
    );
}

#[tokio::test]
async fn failed_cancel_changes_nothing() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    gateway.push_cancel(Err(ApiError::Server {
        status: 403,
        detail: "phone mismatch".to_string(),
    }));

    let mut state = loaded_state(&[1, 2, 3], &[]);
    state.participation = Some(participation(&[1, 2, 3]));

    reducer.reduce(&mut state, SessionAction::RequestCancel, &env);
    let mut effects = reducer.reduce(&mut state, SessionAction::ConfirmCancel, &env);
    let outcome = run_effect(effects.remove(0)).await.unwrap();
    let effects = reducer.reduce(&mut state, outcome, &env);

    assert!(effects.is_empty());
    assert!(state.participation.is_some());
    assert!(state.busy.is_idle());
    assert!(state.last_error.is_some());
}

// ============================================================================
// Availability lifecycle
// ============================================================================

#[tokio::test]
async fn raffle_load_flows_into_availability_load() {
    let reducer = SessionReducer::new();
    let (_gateway, env) = test_env();
    let mut state = SessionState::new(RaffleId::new(1));

    let mut effects = reducer.reduce(&mut state, SessionAction::RaffleLoaded(snapshot()), &env);

    assert!(state.raffle.is_some());
    let follow_up = run_effect(effects.remove(0)).await.unwrap();
    assert!(matches!(follow_up, SessionAction::LoadAvailability));
}

#[test]
fn availability_load_before_the_raffle_is_dropped() {
    let reducer = SessionReducer::new();
    let (gateway, env) = test_env();
    let mut state = SessionState::new(RaffleId::new(1));

    let effects = reducer.reduce(&mut state, SessionAction::LoadAvailability, &env);

    // No raffle bounds yet: nothing fetched, nothing wedged in Loading.
    assert!(effects.is_empty());
    assert!(matches!(state.availability, AvailabilityState::NotLoaded));
    assert!(state.busy.is_idle());
    assert!(gateway.calls().is_empty());

    // The raffle arriving starts the load itself.
    let effects = reducer.reduce(&mut state, SessionAction::RaffleLoaded(snapshot()), &env);
    assert_eq!(effects.len(), 1);
}

#[test]
fn failed_refresh_keeps_the_stale_pool() {
    let reducer = SessionReducer::new();
    let (_gateway, env) = test_env();
    let mut state = loaded_state(&[5, 10], &[]);

    // Start a refresh (the effect future is dropped, which models the
    // in-flight request), then fail it.
    reducer.reduce(&mut state, SessionAction::LoadAvailability, &env);
    assert!(matches!(
        state.availability,
        AvailabilityState::Loading { stale: Some(_) }
    ));

    reducer.reduce(
        &mut state,
        SessionAction::AvailabilityLoadFailed(FlowError::MalformedResponse(
            "status 200: expected value".to_string(),
        )),
        &env,
    );

    let pool = state.availability.pool().expect("stale pool kept");
    assert!(pool.is_taken(5));
    assert!(matches!(
        state.availability,
        AvailabilityState::Failed { .. }
    ));
    assert!(state.busy.is_idle());
}
