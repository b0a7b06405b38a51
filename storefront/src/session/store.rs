//! Store wiring for the raffle-detail session.

use crate::environment::ProductionStorefrontEnvironment;
use crate::session::actions::SessionAction;
use crate::session::reducer::SessionReducer;
use crate::session::types::SessionState;
use crate::types::RaffleId;
use boletera_runtime::Store;

/// Store driving one raffle-detail session.
pub type SessionStore =
    Store<SessionState, SessionAction, ProductionStorefrontEnvironment, SessionReducer>;

/// Create a session store for a raffle.
#[must_use]
pub fn session_store(
    raffle_id: RaffleId,
    environment: ProductionStorefrontEnvironment,
) -> SessionStore {
    Store::new(
        SessionState::new(raffle_id),
        SessionReducer::new(),
        environment,
    )
}
