//! Confirmation state machine types

use serde::Serialize;
use vend_errors::{Error, PurchaseError};
use vend_types::PurchaseRecord;

/// Where a session's confirmation currently stands.
///
/// Observable mid-run through [`crate::PollHandle::state`]; terminal
/// variants are also reflected in the run's outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfirmationState {
    /// No attempt has completed yet.
    Unverified,
    /// Attempt `attempt` is in flight.
    Verifying { attempt: u32 },
    /// The backend still reported the order pending on `attempt`.
    Pending { attempt: u32 },
    /// The payment settled.
    Completed { record: PurchaseRecord },
    /// The payment can never settle.
    Failed { status: String },
    /// The attempt budget ran out without an answer.
    GaveUp { attempts: u32 },
}

impl ConfirmationState {
    /// Whether the machine stops here.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::GaveUp { .. }
        )
    }
}

/// How a confirmation run ended.
#[derive(Debug, Clone)]
pub enum ConfirmationOutcome {
    /// The payment settled; the record grants access.
    Settled(PurchaseRecord),
    /// Terminal decline reported by the backend.
    Declined { status: String },
    /// The budget ran out while the order stayed pending. Manual
    /// re-verification remains possible; it is never retried here.
    GaveUp { attempts: u32 },
    /// The run was torn down before reaching an answer.
    Cancelled,
}

impl ConfirmationOutcome {
    /// Collapse into a `Result` for callers that only need pass or fail.
    ///
    /// # Errors
    ///
    /// `Declined` becomes `PurchaseError::PaymentFailed`, `GaveUp`
    /// becomes `PurchaseError::VerificationTimedOut` and `Cancelled`
    /// becomes `Error::Cancelled`.
    pub fn into_result(self) -> Result<PurchaseRecord, Error> {
        match self {
            Self::Settled(record) => Ok(record),
            Self::Declined { status } => Err(PurchaseError::PaymentFailed { status }.into()),
            Self::GaveUp { attempts } => {
                Err(PurchaseError::VerificationTimedOut { attempts }.into())
            }
            Self::Cancelled => Err(Error::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_marked() {
        assert!(!ConfirmationState::Unverified.is_terminal());
        assert!(!ConfirmationState::Verifying { attempt: 1 }.is_terminal());
        assert!(!ConfirmationState::Pending { attempt: 4 }.is_terminal());
        assert!(ConfirmationState::Failed {
            status: "failed".to_string()
        }
        .is_terminal());
        assert!(ConfirmationState::GaveUp { attempts: 10 }.is_terminal());
    }

    #[test]
    fn outcomes_collapse_to_the_purchase_taxonomy() {
        let declined = ConfirmationOutcome::Declined {
            status: "failed".to_string(),
        }
        .into_result()
        .unwrap_err();
        assert!(matches!(
            declined,
            Error::Purchase(PurchaseError::PaymentFailed { .. })
        ));

        let gave_up = ConfirmationOutcome::GaveUp { attempts: 10 }
            .into_result()
            .unwrap_err();
        assert!(matches!(
            gave_up,
            Error::Purchase(PurchaseError::VerificationTimedOut { attempts: 10 })
        ));

        assert!(matches!(
            ConfirmationOutcome::Cancelled.into_result().unwrap_err(),
            Error::Cancelled
        ));
    }
}
