//! Purchase and checkout session types
//!
//! Wire shapes of the storefront's order endpoints. The client reads
//! these; it never owns them — settlement is decided server-side by the
//! payment processor's webhooks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side settlement state of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Funds are confirmed; the purchase grants access.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// The purchase can never settle: declined or reversed.
    #[must_use]
    pub fn is_declined(self) -> bool {
        matches!(self, Self::Failed | Self::Refunded)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One order as reported by the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    #[serde(default)]
    pub stripe_payment_intent_id: Option<String>,
    #[serde(default)]
    pub stripe_session_id: Option<String>,
    #[serde(default)]
    pub amount_paid: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product_title: Option<String>,
}

fn default_currency() -> String {
    "usd".to_string()
}

/// Response of checkout initiation (`POST /purchase/{product_id}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub session_id: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for checkout initiation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub success_url: String,
    pub cancel_url: String,
    pub payment_method: String,
}

impl CheckoutRequest {
    /// Card checkout through the storefront's Stripe integration.
    #[must_use]
    pub fn stripe(success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            payment_method: "stripe".to_string(),
        }
    }
}
