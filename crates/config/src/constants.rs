//! Canonical protocol timings for the vend client
//!
//! The grant window and the confirmation cadence are protocol facts, not
//! preferences. They live here once; the config defaults below and any
//! user-facing copy reference these values instead of restating them.

/// Seconds a signed download link stays valid after issuance.
pub const DOWNLOAD_GRANT_TTL_SECS: u64 = 45;

/// Seconds between purchase confirmation attempts.
pub const POLL_INTERVAL_SECS: u64 = 3;

/// Confirmation attempts before the poller gives up.
pub const MAX_VERIFY_ATTEMPTS: u32 = 10;

/// Seconds between settlement and the dashboard redirect, giving the
/// buyer time to read the confirmation.
pub const REDIRECT_DELAY_SECS: u64 = 2;

/// Milliseconds a staged blob outlives the save that consumed it.
pub const CLEANUP_DELAY_MS: u64 = 100;

/// Storefront API base when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Where the buyer is sent once a payment settles.
pub const DEFAULT_REDIRECT_LOCATION: &str = "/dashboard";
