#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for vend
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/vend/config.toml)
//! - Environment variables
//! - CLI flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use vend_errors::{ConfigError, Error};

pub mod constants;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storefront: StorefrontConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub checkout: CheckoutConfig,
}

/// Storefront endpoints configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Where the payment processor sends the buyer after a successful
    /// checkout. The `{CHECKOUT_SESSION_ID}` placeholder is substituted
    /// by the processor.
    #[serde(default = "default_success_url")]
    pub success_url: String,
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
}

/// File delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Seconds a signed link stays valid. Protocol constant; configurable
    /// only for test rigs pointing at non-standard issuers.
    #[serde(default = "default_grant_ttl")]
    pub grant_ttl: u64,
    /// Milliseconds a staged blob outlives its save.
    #[serde(default = "default_cleanup_delay_ms")]
    pub cleanup_delay_ms: u64,
    /// Where delivered files land. Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
}

/// Purchase confirmation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64, // seconds
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_redirect_delay")]
    pub redirect_delay: u64, // seconds
}

// Default implementations

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: 300, // 5 minutes
            retries: 3,
            retry_delay: 1, // 1 second
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            grant_ttl: constants::DOWNLOAD_GRANT_TTL_SECS,
            cleanup_delay_ms: constants::CLEANUP_DELAY_MS,
            output_dir: None,
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            poll_interval: constants::POLL_INTERVAL_SECS,
            max_attempts: constants::MAX_VERIFY_ATTEMPTS,
            redirect_delay: constants::REDIRECT_DELAY_SECS,
        }
    }
}

// Default value functions for serde
fn default_api_url() -> String {
    constants::DEFAULT_API_URL.to_string()
}

fn default_success_url() -> String {
    "http://localhost:3000/checkout/success?session_id={CHECKOUT_SESSION_ID}".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/checkout/cancel".to_string()
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}

fn default_grant_ttl() -> u64 {
    constants::DOWNLOAD_GRANT_TTL_SECS
}

fn default_cleanup_delay_ms() -> u64 {
    constants::CLEANUP_DELAY_MS
}

fn default_poll_interval() -> u64 {
    constants::POLL_INTERVAL_SECS
}

fn default_max_attempts() -> u32 {
    constants::MAX_VERIFY_ATTEMPTS
}

fn default_redirect_delay() -> u64 {
    constants::REDIRECT_DELAY_SECS
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("vend").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// If path is provided, loads from that file.
    /// If path is None, uses the default loading behavior.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // VEND_API_URL
        if let Ok(api_url) = std::env::var("VEND_API_URL") {
            if api_url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "VEND_API_URL".to_string(),
                    value: api_url,
                }
                .into());
            }
            self.storefront.api_url = api_url;
        }

        // VEND_OUTPUT_DIR
        if let Ok(dir) = std::env::var("VEND_OUTPUT_DIR") {
            if dir.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "VEND_OUTPUT_DIR".to_string(),
                    value: dir,
                }
                .into());
            }
            self.download.output_dir = Some(PathBuf::from(dir));
        }

        // VEND_MAX_VERIFY_ATTEMPTS
        if let Ok(attempts) = std::env::var("VEND_MAX_VERIFY_ATTEMPTS") {
            self.checkout.max_attempts =
                attempts.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "VEND_MAX_VERIFY_ATTEMPTS".to_string(),
                    value: attempts,
                })?;
        }

        Ok(())
    }

    /// Reject configurations the protocol cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error when the attempt budget or poll interval is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.checkout.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "checkout.max_attempts".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.checkout.poll_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "checkout.poll_interval".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Get the delivery output directory (with default)
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.download
            .output_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
