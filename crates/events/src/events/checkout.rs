use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Checkout and purchase confirmation events.
///
/// The confirmation poller emits one `Settled`, `PaymentDeclined` or
/// `GaveUp` per run, and at most one `RedirectScheduled` after a
/// settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CheckoutEvent {
    /// A checkout session was created and is ready to open.
    SessionCreated {
        session_id: String,
        checkout_url: String,
    },

    /// The confirmation poller started for a session.
    VerificationStarted { session_id: String },

    /// One verification attempt out of the fixed budget.
    Attempt {
        session_id: String,
        attempt: u32,
        max_attempts: u32,
    },

    /// The payment settled.
    Settled {
        session_id: String,
        product_id: i64,
        product_title: Option<String>,
    },

    /// The payment can never settle (declined or refunded).
    PaymentDeclined { session_id: String, status: String },

    /// The attempt budget ran out while the order stayed pending.
    GaveUp {
        session_id: String,
        attempts: u32,
        failure: FailureContext,
    },

    /// Fired once, a fixed delay after settlement, naming where the
    /// storefront sends the buyer next.
    RedirectScheduled { session_id: String, location: String },

    /// The poller was torn down before reaching a terminal state.
    Cancelled { session_id: String },
}
