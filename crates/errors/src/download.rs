//! File delivery error types
//!
//! Failures of both signed delivery strategies and of the authenticated
//! fallback. Messages here are what the user ultimately sees, so the
//! cause stays specific: an expired link, a revoked session and a
//! missing file each read differently.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("download link expired at {expires_at}")]
    LinkExpired { expires_at: u64 },

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("access to this file is forbidden")]
    Forbidden,

    #[error("file not found: {filename}")]
    NotFound { filename: String },

    #[error("transfer failed with status {status}: {status_text}")]
    TransferFailed { status: u16, status_text: String },

    #[error("malformed download grant: {reason}")]
    MalformedGrant { reason: String },
}

impl UserFacingError for DownloadError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::LinkExpired { .. } => {
                Cow::Borrowed("Your download link has expired. Request a fresh one from your dashboard.")
            }
            Self::AuthenticationRequired => {
                Cow::Borrowed("Your session has expired. Please log in again.")
            }
            Self::Forbidden => Cow::Borrowed("You don't have permission to download this file."),
            Self::NotFound { .. } => Cow::Borrowed("This file is missing or has been removed."),
            Self::TransferFailed { .. } => {
                Cow::Borrowed("Download failed. Please try again from your dashboard.")
            }
            Self::MalformedGrant { .. } => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::LinkExpired { .. } => {
                Some("Download links expire shortly after they are issued; start the download promptly.")
            }
            Self::AuthenticationRequired => Some("Run `vend login` and retry the download."),
            Self::NotFound { .. } => Some("Contact support if this purchase should still be available."),
            Self::TransferFailed { .. } => Some("Request a new download link and retry."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::TransferFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::LinkExpired { .. } => "download.link_expired",
            Self::AuthenticationRequired => "download.auth_required",
            Self::Forbidden => "download.forbidden",
            Self::NotFound { .. } => "download.not_found",
            Self::TransferFailed { .. } => "download.transfer_failed",
            Self::MalformedGrant { .. } => "download.malformed_grant",
        })
    }
}
