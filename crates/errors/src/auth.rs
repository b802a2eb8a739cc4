//! Token storage error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("failed to read stored token: {message}")]
    TokenRead { message: String },

    #[error("failed to write stored token: {message}")]
    TokenWrite { message: String },
}

impl UserFacingError for AuthError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::NotLoggedIn => Cow::Borrowed("Please log in to access files."),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotLoggedIn => Some("Run `vend login` with your access token."),
            Self::TokenRead { .. } | Self::TokenWrite { .. } => {
                Some("Ensure the vend data directory is readable and writable.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NotLoggedIn => "auth.not_logged_in",
            Self::TokenRead { .. } => "auth.token_read",
            Self::TokenWrite { .. } => "auth.token_write",
        })
    }
}
