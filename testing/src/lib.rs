//! # Boletera Testing
//!
//! Testing utilities for the boletera workflow crates.
//!
//! This crate provides:
//! - [`mocks::FixedClock`]: deterministic time for reducer tests
//! - [`gateway::ScriptedGateway`]: a scripted backend with a call log, so
//!   tests can assert exactly which requests a workflow issued
//!
//! ## Example
//!
//! ```ignore
//! use boletera_testing::{ScriptedGateway, test_clock};
//!
//! #[tokio::test]
//! async fn reservation_is_posted_once() {
//!     let gateway = Arc::new(ScriptedGateway::new());
//!     gateway.push_reservation(Ok(ReservationAck { id: 1, status: None, total_amount: None }));
//!
//!     // ... drive the store ...
//!
//!     let posts = gateway
//!         .calls()
//!         .iter()
//!         .filter(|c| matches!(c, GatewayCall::CreateReservation(_)))
//!         .count();
//!     assert_eq!(posts, 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use boletera_core::environment::Clock;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boletera_testing::mocks::FixedClock;
    /// use boletera_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Scripted backend gateway.
pub mod gateway {
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use async_trait::async_trait;
    use boletera_api::{
        Ack, ApiError, Availability, PurchaseRecord, RaffleDetail, ReceiptUpload, ReservationAck,
        ReservationRequest, Session, StorefrontGateway, VerificationDecision, VerificationItem,
        VerificationOutcome,
    };

    /// One recorded gateway invocation, with the payload that matters for
    /// assertions.
    #[derive(Debug, Clone)]
    pub enum GatewayCall {
        /// `raffle_detail` was invoked
        RaffleDetail {
            /// Requested raffle
            raffle_id: i64,
        },
        /// `availability` was invoked
        Availability {
            /// Requested raffle
            raffle_id: i64,
        },
        /// `create_reservation` was invoked
        CreateReservation(ReservationRequest),
        /// `purchases_by_phone` was invoked
        PurchasesByPhone {
            /// Queried phone
            phone: String,
        },
        /// `upload_receipt` was invoked
        UploadReceipt {
            /// Target purchase
            purchase_id: i64,
            /// Numbers the receipt covers
            numbers: Vec<u32>,
        },
        /// `cancel_purchase` was invoked
        CancelPurchase {
            /// Target purchase
            purchase_id: i64,
            /// Phone supplied as the guest-auth token
            phone: String,
        },
        /// `pending_verifications` was invoked
        PendingVerifications,
        /// `verify_payment` was invoked
        VerifyPayment {
            /// Target payment
            payment_id: i64,
            /// The decision sent
            decision: VerificationDecision,
        },
    }

    /// A [`StorefrontGateway`] that replays scripted responses.
    ///
    /// Each operation pops from its own FIFO queue; an exhausted queue yields
    /// [`ApiError::Network`] so an unexpected extra call fails the test
    /// loudly instead of hanging. Every invocation is appended to the call
    /// log regardless of outcome.
    #[derive(Debug, Default)]
    pub struct ScriptedGateway {
        raffles: Mutex<VecDeque<Result<RaffleDetail, ApiError>>>,
        availabilities: Mutex<VecDeque<Result<Availability, ApiError>>>,
        reservations: Mutex<VecDeque<Result<ReservationAck, ApiError>>>,
        lookups: Mutex<VecDeque<Result<Vec<PurchaseRecord>, ApiError>>>,
        receipts: Mutex<VecDeque<Result<Ack, ApiError>>>,
        cancellations: Mutex<VecDeque<Result<Ack, ApiError>>>,
        verifications: Mutex<VecDeque<Result<Vec<VerificationItem>, ApiError>>>,
        decisions: Mutex<VecDeque<Result<VerificationOutcome, ApiError>>>,
        calls: Mutex<Vec<GatewayCall>>,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pop<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>, operation: &str) -> Result<T, ApiError> {
        lock(queue).pop_front().unwrap_or_else(|| {
            Err(ApiError::Network(format!(
                "no scripted response for {operation}"
            )))
        })
    }

    impl ScriptedGateway {
        /// Create a gateway with empty scripts.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response for `raffle_detail`.
        pub fn push_raffle(&self, response: Result<RaffleDetail, ApiError>) {
            lock(&self.raffles).push_back(response);
        }

        /// Queue a response for `availability`.
        pub fn push_availability(&self, response: Result<Availability, ApiError>) {
            lock(&self.availabilities).push_back(response);
        }

        /// Queue a response for `create_reservation`.
        pub fn push_reservation(&self, response: Result<ReservationAck, ApiError>) {
            lock(&self.reservations).push_back(response);
        }

        /// Queue a response for `purchases_by_phone`.
        pub fn push_lookup(&self, response: Result<Vec<PurchaseRecord>, ApiError>) {
            lock(&self.lookups).push_back(response);
        }

        /// Queue a response for `upload_receipt`.
        pub fn push_receipt(&self, response: Result<Ack, ApiError>) {
            lock(&self.receipts).push_back(response);
        }

        /// Queue a response for `cancel_purchase`.
        pub fn push_cancel(&self, response: Result<Ack, ApiError>) {
            lock(&self.cancellations).push_back(response);
        }

        /// Queue a response for `pending_verifications`.
        pub fn push_verifications(&self, response: Result<Vec<VerificationItem>, ApiError>) {
            lock(&self.verifications).push_back(response);
        }

        /// Queue a response for `verify_payment`.
        pub fn push_decision(&self, response: Result<VerificationOutcome, ApiError>) {
            lock(&self.decisions).push_back(response);
        }

        /// Snapshot of every call made so far, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<GatewayCall> {
            lock(&self.calls).clone()
        }

        /// Number of calls matching a predicate.
        pub fn count_calls(&self, predicate: impl Fn(&GatewayCall) -> bool) -> usize {
            lock(&self.calls).iter().filter(|c| predicate(c)).count()
        }

        fn record(&self, call: GatewayCall) {
            lock(&self.calls).push(call);
        }
    }

    #[async_trait]
    impl StorefrontGateway for ScriptedGateway {
        async fn raffle_detail(&self, raffle_id: i64) -> Result<RaffleDetail, ApiError> {
            self.record(GatewayCall::RaffleDetail { raffle_id });
            pop(&self.raffles, "raffle_detail")
        }

        async fn availability(&self, raffle_id: i64) -> Result<Availability, ApiError> {
            self.record(GatewayCall::Availability { raffle_id });
            pop(&self.availabilities, "availability")
        }

        async fn create_reservation(
            &self,
            request: ReservationRequest,
        ) -> Result<ReservationAck, ApiError> {
            self.record(GatewayCall::CreateReservation(request));
            pop(&self.reservations, "create_reservation")
        }

        async fn purchases_by_phone(&self, phone: String) -> Result<Vec<PurchaseRecord>, ApiError> {
            self.record(GatewayCall::PurchasesByPhone { phone });
            pop(&self.lookups, "purchases_by_phone")
        }

        async fn upload_receipt(
            &self,
            purchase_id: i64,
            upload: ReceiptUpload,
        ) -> Result<Ack, ApiError> {
            self.record(GatewayCall::UploadReceipt {
                purchase_id,
                numbers: upload.numbers.clone(),
            });
            pop(&self.receipts, "upload_receipt")
        }

        async fn cancel_purchase(&self, purchase_id: i64, phone: String) -> Result<Ack, ApiError> {
            self.record(GatewayCall::CancelPurchase { purchase_id, phone });
            pop(&self.cancellations, "cancel_purchase")
        }

        async fn pending_verifications(
            &self,
            _session: Session,
        ) -> Result<Vec<VerificationItem>, ApiError> {
            self.record(GatewayCall::PendingVerifications);
            pop(&self.verifications, "pending_verifications")
        }

        async fn verify_payment(
            &self,
            _session: Session,
            payment_id: i64,
            decision: VerificationDecision,
        ) -> Result<VerificationOutcome, ApiError> {
            self.record(GatewayCall::VerifyPayment {
                payment_id,
                decision,
            });
            pop(&self.decisions, "verify_payment")
        }
    }
}

// Re-export commonly used items
pub use gateway::{GatewayCall, ScriptedGateway};
pub use mocks::{FixedClock, test_clock};
