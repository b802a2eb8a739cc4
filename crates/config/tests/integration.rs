//! Integration tests for config

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;
    use vend_config::constants;
    use vend_config::Config;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = Config::default();
        assert_eq!(
            config.download.grant_ttl,
            constants::DOWNLOAD_GRANT_TTL_SECS
        );
        assert_eq!(config.checkout.poll_interval, constants::POLL_INTERVAL_SECS);
        assert_eq!(config.checkout.max_attempts, constants::MAX_VERIFY_ATTEMPTS);
        assert_eq!(
            config.checkout.redirect_delay,
            constants::REDIRECT_DELAY_SECS
        );
        assert_eq!(config.storefront.api_url, constants::DEFAULT_API_URL);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[storefront]
api_url = "https://shop.example.com"

[network]
timeout = 120
retries = 5

[checkout]
poll_interval = 1
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.storefront.api_url, "https://shop.example.com");
        assert_eq!(config.network.timeout, 120);
        assert_eq!(config.network.retries, 5);
        // Sections and fields not present keep their defaults
        assert_eq!(config.network.retry_delay, 1);
        assert_eq!(config.checkout.poll_interval, 1);
        assert_eq!(config.checkout.max_attempts, constants::MAX_VERIFY_ATTEMPTS);
        assert_eq!(
            config.download.grant_ttl,
            constants::DOWNLOAD_GRANT_TTL_SECS
        );
    }

    #[tokio::test]
    async fn test_malformed_toml_is_a_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[storefront\napi_url = ").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            vend_errors::Error::Config(vend_errors::ConfigError::ParseError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = Config::load_from_file(std::path::Path::new("/nonexistent/vend.toml"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            vend_errors::Error::Config(vend_errors::ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("VEND_API_URL");
        std::env::remove_var("VEND_OUTPUT_DIR");
        std::env::remove_var("VEND_MAX_VERIFY_ATTEMPTS");

        std::env::set_var("VEND_API_URL", "http://127.0.0.1:9000");
        std::env::set_var("VEND_MAX_VERIFY_ATTEMPTS", "4");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.storefront.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.checkout.max_attempts, 4);

        std::env::remove_var("VEND_API_URL");
        std::env::remove_var("VEND_MAX_VERIFY_ATTEMPTS");
    }

    #[test]
    fn test_merge_env_rejects_garbage() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::set_var("VEND_MAX_VERIFY_ATTEMPTS", "often");
        let mut config = Config::default();
        assert!(config.merge_env().is_err());
        std::env::remove_var("VEND_MAX_VERIFY_ATTEMPTS");
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.checkout.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.checkout.poll_interval = 0;
        assert!(config.validate().is_err());
    }
}
