//! Event handling and user feedback
//!
//! Renders domain events as console status lines on stderr, keeping
//! stdout clean for the final command result. Every event is also
//! bridged into tracing before rendering.

use console::Style;
use vend_events::{AppEvent, CheckoutEvent, DownloadEvent, FailureContext, GeneralEvent};
use vend_types::DeliveryRoute;

/// Event handler for status display and user feedback
pub struct EventHandler {
    /// Suppress console rendering (JSON mode)
    json: bool,
    /// Show debug-level events
    debug: bool,
    good: Style,
    caution: Style,
    bad: Style,
    dim: Style,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors: bool, json: bool, debug: bool) -> Self {
        let styled = |style: Style| if colors { style } else { Style::new() };
        Self {
            json,
            debug,
            good: styled(Style::new().green().bold()),
            caution: styled(Style::new().yellow()),
            bad: styled(Style::new().red().bold()),
            dim: styled(Style::new().dim()),
        }
    }

    /// Handle incoming event
    pub fn handle_event(&self, event: &AppEvent) {
        crate::logging::log_event(event);
        if self.json {
            return;
        }
        match event {
            AppEvent::Download(event) => self.handle_download(event),
            AppEvent::Checkout(event) => self.handle_checkout(event),
            AppEvent::General(event) => self.handle_general(event),
        }
    }

    fn handle_download(&self, event: &DownloadEvent) {
        match event {
            DownloadEvent::GrantIssued {
                product_id,
                filename,
                expires_in,
            } => {
                let validity = expires_in
                    .map(|secs| format!(" (link valid {secs}s)"))
                    .unwrap_or_default();
                eprintln!(
                    "{}",
                    self.dim
                        .apply_to(format!("Grant for product {product_id}: {filename}{validity}"))
                );
            }
            DownloadEvent::Started {
                filename,
                total_size,
                ..
            } => {
                let size = total_size
                    .map(|bytes| format!(" ({bytes} bytes)"))
                    .unwrap_or_default();
                eprintln!("Fetching {filename}{size}");
            }
            DownloadEvent::FallbackEngaged { filename, cause } => {
                eprintln!(
                    "{} Signed link failed for {filename}: {}",
                    self.caution.apply_to("!"),
                    cause.message
                );
                eprintln!(
                    "  {}",
                    self.dim.apply_to("retrying with your session token")
                );
            }
            DownloadEvent::Completed {
                path, bytes, route, ..
            } => {
                eprintln!(
                    "{} Saved {} ({bytes} bytes, {})",
                    self.good.apply_to("✓"),
                    path.display(),
                    route_label(*route)
                );
            }
            DownloadEvent::Failed { filename, failure } => {
                eprintln!(
                    "{} Download of {filename} failed: {}",
                    self.bad.apply_to("✗"),
                    failure.message
                );
                self.print_failure_detail(failure);
            }
        }
    }

    fn handle_checkout(&self, event: &CheckoutEvent) {
        match event {
            CheckoutEvent::SessionCreated {
                session_id,
                checkout_url,
            } => {
                eprintln!("Checkout ready: {checkout_url}");
                eprintln!("  {}", self.dim.apply_to(format!("session {session_id}")));
            }
            CheckoutEvent::VerificationStarted { session_id } => {
                eprintln!(
                    "{}",
                    self.dim
                        .apply_to(format!("Confirming payment for session {session_id}"))
                );
            }
            CheckoutEvent::Attempt {
                attempt,
                max_attempts,
                ..
            } => {
                eprintln!(
                    "  {}",
                    self.dim.apply_to(format!("checking ({attempt}/{max_attempts})"))
                );
            }
            CheckoutEvent::Settled { product_title, .. } => {
                let what = product_title
                    .as_deref()
                    .map(|title| format!(" for {title}"))
                    .unwrap_or_default();
                eprintln!("{} Payment confirmed{what}", self.good.apply_to("✓"));
            }
            CheckoutEvent::PaymentDeclined { status, .. } => {
                eprintln!("{} Payment {status}", self.bad.apply_to("✗"));
            }
            CheckoutEvent::GaveUp {
                attempts, failure, ..
            } => {
                eprintln!(
                    "{} Payment still unconfirmed after {attempts} attempts",
                    self.caution.apply_to("!")
                );
                self.print_failure_detail(failure);
            }
            CheckoutEvent::RedirectScheduled { location, .. } => {
                eprintln!("{}", self.dim.apply_to(format!("Continue at {location}")));
            }
            CheckoutEvent::Cancelled { .. } => {
                eprintln!("{}", self.dim.apply_to("Confirmation cancelled"));
            }
        }
    }

    fn handle_general(&self, event: &GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => {
                eprintln!("{} {message}", self.caution.apply_to("!"));
                if let Some(context) = context {
                    eprintln!("  {}", self.dim.apply_to(context));
                }
            }
            GeneralEvent::Error { message, details } => {
                eprintln!("{} {message}", self.bad.apply_to("✗"));
                if let Some(details) = details {
                    eprintln!("  {}", self.dim.apply_to(details));
                }
            }
            GeneralEvent::DebugLog { message, .. } => {
                if self.debug {
                    eprintln!("{}", self.dim.apply_to(format!("debug: {message}")));
                }
            }
            GeneralEvent::OperationStarted { operation } => {
                eprintln!("{}", self.dim.apply_to(format!("{operation}...")));
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if *success {
                    eprintln!("{} {operation}", self.good.apply_to("✓"));
                } else {
                    eprintln!("{} {operation}", self.caution.apply_to("!"));
                }
            }
            GeneralEvent::OperationFailed { operation, error } => {
                eprintln!("{} {operation}: {error}", self.bad.apply_to("✗"));
            }
        }
    }

    fn print_failure_detail(&self, failure: &FailureContext) {
        if let Some(hint) = &failure.hint {
            eprintln!("  {}", self.dim.apply_to(hint));
        }
        if failure.retryable {
            eprintln!("  {}", self.dim.apply_to("Safe to retry."));
        }
    }
}

fn route_label(route: DeliveryRoute) -> &'static str {
    match route {
        DeliveryRoute::Direct => "signed link",
        DeliveryRoute::SecureEndpoint => "secure endpoint",
        DeliveryRoute::Fallback => "authenticated fallback",
    }
}
