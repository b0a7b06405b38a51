//! Environment trait for the storefront reducers.

use boletera_api::StorefrontGateway;
use boletera_core::environment::Clock;
use boletera_runtime::retry::RetryPolicy;
use std::sync::Arc;

/// Dependencies injected into the storefront reducers.
///
/// Follows the dependency-injection-via-traits pattern: production wires a
/// real HTTP gateway and the system clock, tests wire a scripted gateway and
/// a fixed clock.
pub trait StorefrontEnvironment: Send + Sync {
    /// Backend gateway the effect futures call.
    fn gateway(&self) -> Arc<dyn StorefrontGateway>;

    /// Clock for timestamps recorded in state.
    ///
    /// Production uses `SystemClock`, tests use `FixedClock`.
    fn clock(&self) -> &dyn Clock;

    /// Retry policy applied to idempotent reads.
    ///
    /// Mutations never consult this; they are sent exactly once.
    fn read_retry(&self) -> RetryPolicy;
}

/// Production environment for the storefront reducers.
#[derive(Clone)]
pub struct ProductionStorefrontEnvironment {
    gateway: Arc<dyn StorefrontGateway>,
    clock: Arc<dyn Clock>,
    read_retry: RetryPolicy,
}

impl ProductionStorefrontEnvironment {
    /// Create a production environment with the default read retry policy.
    #[must_use]
    pub fn new(gateway: Arc<dyn StorefrontGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            clock,
            read_retry: RetryPolicy::reads(),
        }
    }

    /// Override the read retry policy (tests shorten the delays).
    #[must_use]
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }
}

impl StorefrontEnvironment for ProductionStorefrontEnvironment {
    fn gateway(&self) -> Arc<dyn StorefrontGateway> {
        Arc::clone(&self.gateway)
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn read_retry(&self) -> RetryPolicy {
        self.read_retry.clone()
    }
}
