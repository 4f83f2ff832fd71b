//! In-memory collaborators for tests.
//!
//! Enabled by the default `test-utils` feature so downstream crates can use
//! them from their own tests.

pub mod gateway;
pub mod notifier;
pub mod store;

pub use gateway::MockPaymentGateway;
pub use notifier::RecordingNotifier;
pub use store::InMemoryStore;

use crate::environment::Clock;
use crate::signature::payment_signature;
use chrono::{DateTime, Utc};

/// Clock frozen at one instant.
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

/// Fixed clock at 2026-01-01 00:00:00 UTC.
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock::new(DateTime::<Utc>::from_timestamp(1_767_225_600, 0).unwrap_or_default())
}

/// Sign an order/payment pair the way the gateway does.
///
/// Returns an empty string if the secret cannot key the MAC, which makes
/// the verifier reject it.
#[must_use]
pub fn sign_payment(secret: &str, order_id: &str, payment_id: &str) -> String {
    payment_signature(secret, order_id, payment_id).unwrap_or_default()
}
