//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields.
//! The library crates never log directly; everything user-visible or
//! observable flows through here.

use tracing::{debug, error, info, warn};
use vend_events::{AppEvent, CheckoutEvent, DownloadEvent, EventMeta, GeneralEvent};

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event(event: &AppEvent) {
    let meta = EventMeta::new(event.event_level(), event.event_source());

    match event {
        AppEvent::Download(download_event) => match download_event {
            DownloadEvent::GrantIssued {
                product_id,
                filename,
                expires_in,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    product_id = product_id,
                    filename = %filename,
                    expires_in = ?expires_in,
                    "Download grant issued"
                );
            }
            DownloadEvent::Started {
                url,
                filename,
                total_size,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    url = %url,
                    filename = %filename,
                    total_size = ?total_size,
                    "Download started"
                );
            }
            DownloadEvent::FallbackEngaged { filename, cause } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    filename = %filename,
                    code = ?cause.code,
                    message = %cause.message,
                    "Signed delivery failed, falling back to authenticated download"
                );
            }
            DownloadEvent::Completed {
                filename,
                path,
                bytes,
                route,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    filename = %filename,
                    path = %path.display(),
                    bytes = bytes,
                    route = route.as_str(),
                    "Download completed"
                );
            }
            DownloadEvent::Failed { filename, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    filename = %filename,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Download failed"
                );
            }
        },

        AppEvent::Checkout(checkout_event) => match checkout_event {
            CheckoutEvent::SessionCreated {
                session_id,
                checkout_url,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    checkout_url = %checkout_url,
                    "Checkout session created"
                );
            }
            CheckoutEvent::VerificationStarted { session_id } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    "Payment verification started"
                );
            }
            CheckoutEvent::Attempt {
                session_id,
                attempt,
                max_attempts,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    "Verification attempt"
                );
            }
            CheckoutEvent::Settled {
                session_id,
                product_id,
                product_title,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    product_id = product_id,
                    product_title = ?product_title,
                    "Payment settled"
                );
            }
            CheckoutEvent::PaymentDeclined { session_id, status } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    status = %status,
                    "Payment declined"
                );
            }
            CheckoutEvent::GaveUp {
                session_id,
                attempts,
                failure,
            } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    attempts = attempts,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Verification gave up"
                );
            }
            CheckoutEvent::RedirectScheduled {
                session_id,
                location,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    location = %location,
                    "Post-settlement redirect scheduled"
                );
            }
            CheckoutEvent::Cancelled { session_id } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    session_id = %session_id,
                    "Verification cancelled"
                );
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::OperationStarted { operation } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    "Operation started"
                );
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if *success {
                    info!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        operation = %operation,
                        success = success,
                        "Operation completed successfully"
                    );
                } else {
                    warn!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        operation = %operation,
                        success = success,
                        "Operation completed with issues"
                    );
                }
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    error = %error,
                    "Operation failed"
                );
            }
            GeneralEvent::Warning { message, context } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    message = %message,
                    context = ?context,
                    "Warning"
                );
            }
            GeneralEvent::Error { message, details } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    message = %message,
                    details = ?details,
                    "Error"
                );
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    message = %message,
                    context = ?context,
                    "Debug log"
                );
            }
        },
    }
}
