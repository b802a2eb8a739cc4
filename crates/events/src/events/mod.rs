use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource};
use vend_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code from the error taxonomy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

// Declare all domain modules
pub mod checkout;
pub mod download;
pub mod general;

// Re-export all domain events
pub use checkout::*;
pub use download::*;
pub use general::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// File delivery events (grants, strategies, fallback)
    Download(DownloadEvent),

    /// Checkout and purchase confirmation events
    Checkout(CheckoutEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Download(_) => EventSource::DOWNLOAD,
            Self::Checkout(_) => EventSource::CHECKOUT,
        }
    }

    /// Severity this event should be logged at.
    #[must_use]
    pub fn event_level(&self) -> EventLevel {
        match self {
            Self::General(event) => match event {
                GeneralEvent::DebugLog { .. } => EventLevel::Debug,
                GeneralEvent::Warning { .. }
                | GeneralEvent::OperationCompleted { success: false, .. } => EventLevel::Warn,
                GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. } => {
                    EventLevel::Error
                }
                _ => EventLevel::Info,
            },
            Self::Download(event) => match event {
                DownloadEvent::FallbackEngaged { .. } => EventLevel::Warn,
                DownloadEvent::Failed { .. } => EventLevel::Error,
                _ => EventLevel::Info,
            },
            Self::Checkout(event) => match event {
                CheckoutEvent::Attempt { .. } => EventLevel::Debug,
                CheckoutEvent::GaveUp { .. } => EventLevel::Warn,
                CheckoutEvent::PaymentDeclined { .. } => EventLevel::Error,
                _ => EventLevel::Info,
            },
        }
    }
}
