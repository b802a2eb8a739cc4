//! Integration tests for error types

#[cfg(test)]
mod tests {
    use vend_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_error_display() {
        let err = DownloadError::TransferFailed {
            status: 502,
            status_text: "Bad Gateway".into(),
        };
        assert_eq!(
            err.to_string(),
            "transfer failed with status 502: Bad Gateway"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = PurchaseError::SessionMissing {
            session_id: "cs_test_123".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
    }

    #[test]
    fn test_forbidden_user_message_is_exact() {
        let err = DownloadError::Forbidden;
        assert_eq!(
            err.user_message(),
            "You don't have permission to download this file."
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_verification_timeout_user_message() {
        let err = PurchaseError::VerificationTimedOut { attempts: 10 };
        assert_eq!(
            err.user_message(),
            "Payment verification is taking longer than expected. Please check your dashboard or contact support."
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_network_unavailable_user_message() {
        let err = NetworkError::NetworkUnavailable;
        assert_eq!(err.user_message(), "Network error or server unavailable");
    }

    #[test]
    fn test_user_codes_delegate_through_root() {
        let err: Error = AuthError::NotLoggedIn.into();
        assert_eq!(err.user_code(), Some("auth.not_logged_in"));
        assert_eq!(err.user_message(), "Please log in to access files.");
    }
}
