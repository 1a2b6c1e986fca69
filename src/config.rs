//! Runtime configuration for the shop core and its simulated collaborators.

use std::time::Duration;

/// How long a reservation waits for its checkout decision before aborting.
pub const DEFAULT_DECISION_TIMEOUT: Duration = Duration::from_secs(30);

/// How concurrent reservations of the same product are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservationPolicy {
    /// The exclusive lock only covers the availability check and the opening
    /// of the write. A second reservation on the same product may run while
    /// the first is waiting for its payment, reading the last committed stock,
    /// so both can commit and oversubscribe the product.
    #[default]
    Optimistic,
    /// Each reserved product stays locked until its reservation is committed
    /// or aborted. Reservations on the same product run one after another.
    SerializedPerProduct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopConfig {
    pub decision_timeout: Duration,
    pub reservation_policy: ReservationPolicy,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            decision_timeout: DEFAULT_DECISION_TIMEOUT,
            reservation_policy: ReservationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentConfig {
    pub latency: Duration,
    /// Probability in `[0, 1]` that a payment is declined.
    pub failure_rate: f64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(200),
            failure_rate: 0.5,
        }
    }
}
