//! # Boletera Core
//!
//! Core traits and types for the boletera raffle storefront client.
//!
//! The client is built as a set of small, testable state machines using the
//! Reducer pattern:
//!
//! - **State**: domain state for one feature (a raffle-detail session, the
//!   organizer review queue)
//! - **Action**: all possible inputs to a reducer (user intents, backend
//!   outcomes)
//! - **Reducer**: pure function `(State, Action, Environment) → Effects`
//! - **Effect**: side effect descriptions (not execution)
//! - **Environment**: injected dependencies via traits
//!
//! Reducers never perform I/O themselves; they return [`effect::Effect`]
//! values that the runtime store executes. Outcomes of those effects are fed
//! back into the reducer as new actions, which is what keeps every state
//! transition observable and unit-testable without a network.

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - the core trait for feature logic.
///
/// Reducers are pure functions: `(State, Action, Environment) → Effects`.
/// They contain all transition rules and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for feature logic.
    ///
    /// # Type Parameters
    ///
    /// - `State`: the domain state this reducer operates on
    /// - `Action`: the action type this reducer processes
    /// - `Environment`: the injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for SessionReducer {
    ///     type State = SessionState;
    ///     type Action = SessionAction;
    ///     type Environment = ProductionSessionEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut SessionState,
    ///         action: SessionAction,
    ///         env: &ProductionSessionEnvironment,
    ///     ) -> SmallVec<[Effect<SessionAction>; 4]> {
    ///         match action {
    ///             SessionAction::ToggleNumber(n) => {
    ///                 // transition rules here
    ///                 smallvec![]
    ///             }
    ///             _ => smallvec![],
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects.
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed by the runtime
        ///
        /// Most actions produce zero or one effect, so the return type is a
        /// `SmallVec` that avoids heap allocation in the common case.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions.
///
/// Effects describe side effects to be performed by the runtime store.
/// They are values (not execution) and are composable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed.
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned from reducers and executed by the store.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: the action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (for timeouts)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation (typically a backend call).
        ///
        /// Returns `Option<Action>` - if `Some`, the action is fed back into
        /// the reducer.
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run concurrently
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap a future that resolves to a follow-up action.
        pub fn future<F>(future: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(future))
        }
    }
}

/// Environment module - dependency injection traits.
///
/// All external dependencies are abstracted behind traits and injected via
/// the Environment parameter, so reducers stay deterministic under test.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability.
    ///
    /// Production uses a system clock; tests use a fixed clock so that
    /// timestamps recorded in state (e.g. when availability was last
    /// refreshed) are reproducible.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// System clock backed by [`Utc::now`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
