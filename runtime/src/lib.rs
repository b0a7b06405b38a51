//! # Boletera Runtime
//!
//! Runtime for driving boletera reducers: the [`store::Store`] that owns
//! feature state, executes effects, and feeds effect outcomes back into the
//! reducer; and the consolidated [`retry`] policy applied to idempotent
//! backend reads.
//!
//! The store enforces the client's concurrency model: reducer execution is
//! serialized behind a single lock (one writer per state structure), effects
//! run in spawned tasks, and every action produced by an effect is broadcast
//! so callers can wait for the terminal outcome of a workflow with
//! [`store::Store::send_and_wait_for`].

pub mod retry;
pub mod store;

pub use retry::{RetryPolicy, retry_if};
pub use store::{Store, StoreError};
