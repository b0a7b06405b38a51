//! Store - owns feature state and drives reducers.
//!
//! One store instance corresponds to one state structure with exactly one
//! writer: the reducer runs behind a write lock, so concurrent `send` calls
//! serialize at the reducer and the state machine stays race-free on the
//! client. Effects execute in spawned tasks and feed their outcomes back as
//! actions, which are also broadcast to observers so request/response flows
//! can wait for their terminal action.

use boletera_core::effect::Effect;
use boletera_core::reducer::Reducer;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

/// Errors produced by store coordination primitives.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Timed out waiting for a matching action or for effects to settle
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The action broadcast channel closed (store dropped)
    #[error("action channel closed")]
    ChannelClosed,
}

/// Store that owns state and executes effects for one reducer.
///
/// # Type Parameters
///
/// - `S`: state type
/// - `A`: action type
/// - `E`: environment type
/// - `R`: reducer implementation
///
/// # Example
///
/// ```ignore
/// let store = Store::new(SessionState::new(raffle_id), SessionReducer::new(), env);
/// store.send(SessionAction::LoadRaffle).await;
/// ```
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
    pending_effects: Arc<AtomicUsize>,
    /// Actions produced by effects are broadcast to observers. This enables
    /// waiting for the terminal outcome of a workflow without polling state.
    action_tx: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
    }

    /// Create a new store with a custom action broadcast capacity.
    ///
    /// The default of 16 is plenty for a single raffle-detail session; raise
    /// it if many slow observers subscribe.
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_tx, _) = broadcast::channel(capacity);

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            action_tx,
        }
    }

    /// Send an action to the store.
    ///
    /// Acquires the state write lock, runs the reducer, then starts executing
    /// the returned effects in background tasks. Returns once effect execution
    /// has been *started*, not completed; use [`Self::send_and_wait_for`] or
    /// [`Self::settle`] to observe completion.
    #[tracing::instrument(skip_all, name = "store_send")]
    pub async fn send(&self, action: A) {
        let effects = {
            let mut state = self.state.write().await;
            self.reducer.reduce(&mut state, action, &self.environment)
        };

        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    /// Send an action and wait for an effect-produced action matching the
    /// predicate.
    ///
    /// Subscribes to the action broadcast *before* sending, so the terminal
    /// action cannot be missed, then returns the first match.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if no matching action arrives in time
    /// - [`StoreError::ChannelClosed`] if the store is dropped while waiting
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.action_tx.subscribe();
        self.send(action).await;

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(StoreError::Timeout(timeout));
            }

            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Ok(candidate)) => {
                    if predicate(&candidate) {
                        return Ok(candidate);
                    }
                },
                // A lagged observer just missed some actions; keep listening.
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => {},
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(StoreError::ChannelClosed);
                },
                Err(_) => return Err(StoreError::Timeout(timeout)),
            }
        }
    }

    /// Read the current state through a closure.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Subscribe to actions produced by effects.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<A> {
        self.action_tx.subscribe()
    }

    /// Number of effects currently executing.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending_effects.load(Ordering::Acquire)
    }

    /// Wait until all in-flight effects (including follow-ups they trigger)
    /// have completed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when the
    /// timeout expires.
    pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
        let start = tokio::time::Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            if self.pending_effects.load(Ordering::Acquire) == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(StoreError::Timeout(timeout));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Broadcast an effect-produced action, then reduce it.
    async fn dispatch(&self, action: A) {
        let _ = self.action_tx.send(action.clone());

        let effects = {
            let mut state = self.state.write().await;
            self.reducer.reduce(&mut state, action, &self.environment)
        };

        for effect in effects {
            self.spawn_effect(effect);
        }
    }

    fn spawn_effect(&self, effect: Effect<A>) {
        self.pending_effects.fetch_add(1, Ordering::AcqRel);

        let store = self.clone();
        // Boxed so the task type does not recurse through spawn_effect.
        let task: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(async move {
            store.run_effect(effect).await;
            store.pending_effects.fetch_sub(1, Ordering::AcqRel);
        });
        tokio::spawn(task);
    }

    async fn run_effect(&self, effect: Effect<A>) {
        match effect {
            Effect::None => {},
            Effect::Parallel(effects) => {
                for nested in effects {
                    self.spawn_effect(nested);
                }
            },
            Effect::Sequential(effects) => {
                for nested in effects {
                    Box::pin(self.run_effect(nested)).await;
                }
            },
            Effect::Delay { duration, action } => {
                tokio::time::sleep(duration).await;
                self.dispatch(*action).await;
            },
            Effect::Future(future) => {
                if let Some(action) = future.await {
                    self.dispatch(action).await;
                }
            },
        }
    }
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            pending_effects: Arc::clone(&self.pending_effects),
            action_tx: self.action_tx.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boletera_core::{SmallVec, smallvec};

    #[derive(Debug, Clone, Default)]
    struct CounterState {
        value: i64,
        confirmations: usize,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum CounterAction {
        Increment,
        Incremented,
        IncrementLater(Duration),
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut CounterState,
            action: CounterAction,
            _env: &(),
        ) -> SmallVec<[Effect<CounterAction>; 4]> {
            match action {
                CounterAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::future(async { Some(CounterAction::Incremented) })]
                },
                CounterAction::Incremented => {
                    state.confirmations += 1;
                    smallvec![]
                },
                CounterAction::IncrementLater(duration) => {
                    smallvec![Effect::Delay {
                        duration,
                        action: Box::new(CounterAction::Increment),
                    }]
                },
            }
        }
    }

    #[tokio::test]
    async fn send_runs_reducer_and_effects() {
        let store = Store::new(CounterState::default(), CounterReducer, ());

        store.send(CounterAction::Increment).await;
        store.settle(Duration::from_secs(1)).await.unwrap();

        let state = store.state(Clone::clone).await;
        assert_eq!(state.value, 1);
        assert_eq!(state.confirmations, 1);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_terminal_action() {
        let store = Store::new(CounterState::default(), CounterReducer, ());

        let action = store
            .send_and_wait_for(
                CounterAction::Increment,
                |a| matches!(a, CounterAction::Incremented),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(action, CounterAction::Incremented);
    }

    #[tokio::test]
    async fn delay_effect_dispatches_after_sleep() {
        let store = Store::new(CounterState::default(), CounterReducer, ());

        store
            .send(CounterAction::IncrementLater(Duration::from_millis(20)))
            .await;

        assert_eq!(store.state(|s| s.value).await, 0);
        store.settle(Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 1);
    }

    #[tokio::test]
    async fn wait_times_out_without_matching_action() {
        let store = Store::new(CounterState::default(), CounterReducer, ());

        let result = store
            .send_and_wait_for(
                CounterAction::Incremented, // produces no effects
                |a| matches!(a, CounterAction::Increment),
                Duration::from_millis(50),
            )
            .await;

        assert!(matches!(result, Err(StoreError::Timeout(_))));
    }
}
