//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("network unavailable")]
    NetworkUnavailable,

    #[error("transfer interrupted: {0}")]
    TransferInterrupted(String),

    #[error("rate limited: retry after {seconds} seconds")]
    RateLimited { seconds: u64 },
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::NetworkUnavailable | Self::ConnectionRefused(_) => {
                Cow::Borrowed("Network error or server unavailable")
            }
            Self::Timeout { .. } => Cow::Borrowed("The server took too long to respond."),
            Self::TransferInterrupted(_) => {
                Cow::Borrowed("The download was interrupted. Please try again.")
            }
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NetworkUnavailable | Self::ConnectionRefused(_) | Self::Timeout { .. } => {
                Some("Check your connection and retry.")
            }
            Self::RateLimited { .. } => Some("Wait a moment before retrying."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ConnectionRefused(_)
                | Self::NetworkUnavailable
                | Self::TransferInterrupted(_)
                | Self::RateLimited { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Timeout { .. } => "network.timeout",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::HttpError { .. } => "network.http_error",
            Self::NetworkUnavailable => "network.unavailable",
            Self::TransferInterrupted(_) => "network.transfer_interrupted",
            Self::RateLimited { .. } => "network.rate_limited",
        })
    }
}
