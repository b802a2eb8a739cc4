//! Purchase and settlement error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PurchaseError {
    #[error("payment verification gave up after {attempts} attempts")]
    VerificationTimedOut { attempts: u32 },

    #[error("payment not completed: {status}")]
    PaymentFailed { status: String },

    #[error("checkout session not found: {session_id}")]
    SessionMissing { session_id: String },
}

impl UserFacingError for PurchaseError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::VerificationTimedOut { .. } => Cow::Borrowed(
                "Payment verification is taking longer than expected. Please check your dashboard or contact support.",
            ),
            Self::PaymentFailed { .. } => {
                Cow::Borrowed("Unfortunately, your payment could not be processed.")
            }
            Self::SessionMissing { .. } => {
                Cow::Borrowed("We couldn't find that checkout session.")
            }
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::VerificationTimedOut { .. } => {
                Some("Run `vend verify <session-id>` to re-check the payment.")
            }
            Self::PaymentFailed { .. } => {
                Some("Try the purchase again, or contact support if the problem persists.")
            }
            Self::SessionMissing { .. } => {
                Some("Double-check the session id from your checkout redirect.")
            }
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::VerificationTimedOut { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::VerificationTimedOut { .. } => "purchase.verification_timed_out",
            Self::PaymentFailed { .. } => "purchase.payment_failed",
            Self::SessionMissing { .. } => "purchase.session_missing",
        })
    }
}
