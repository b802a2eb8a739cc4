//! CLI error handling

use std::fmt;

use vend_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Error from the vend library crates
    App(vend_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::App(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::App(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::InvalidArguments(_) => None,
        }
    }
}

impl From<vend_errors::Error> for CliError {
    fn from(e: vend_errors::Error) -> Self {
        CliError::App(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vend_errors::DownloadError;

    #[test]
    fn test_app_errors_render_code_and_hint() {
        let error = CliError::from(vend_errors::Error::from(DownloadError::Forbidden));
        let rendered = error.to_string();
        assert!(rendered.contains("You don't have permission to download this file."));
        assert!(rendered.contains("Code: download.forbidden"));
    }

    #[test]
    fn test_invalid_arguments_render_plainly() {
        let error = CliError::InvalidArguments("a token is required".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid arguments: a token is required"
        );
    }
}
