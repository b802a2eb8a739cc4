//! Output rendering and formatting
//!
//! Status lines stream to stderr through the event handler; the final
//! outcome lands on stdout, as JSON in `--json` mode or as one plain
//! scriptable line otherwise.

use serde::Serialize;
use std::io;
use vend_net::Delivery;
use vend_types::{CheckoutSession, PurchaseRecord};

/// Final result of a CLI command
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// A session token was stored.
    LoggedIn,
    /// The stored session token was cleared.
    LoggedOut,
    /// A file was delivered to disk.
    Delivered(Delivery),
    /// A checkout session is open and waiting for the buyer.
    CheckoutOpen(CheckoutSession),
    /// The payment settled.
    Settled(PurchaseRecord),
    /// A single verification pass found the payment still pending.
    Pending(PurchaseRecord),
}

/// Output renderer for CLI results
pub struct OutputRenderer {
    json_output: bool,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render the command outcome to stdout
    pub fn render(&self, outcome: &CommandOutcome) -> io::Result<()> {
        if self.json_output {
            let json = serde_json::to_string_pretty(outcome).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match outcome {
            CommandOutcome::LoggedIn => println!("Logged in."),
            CommandOutcome::LoggedOut => println!("Logged out."),
            CommandOutcome::Delivered(delivery) => println!("{}", delivery.path.display()),
            CommandOutcome::CheckoutOpen(session) => println!("{}", session.checkout_url),
            CommandOutcome::Settled(record) | CommandOutcome::Pending(record) => {
                println!("{}", record.payment_status);
            }
        }
        Ok(())
    }
}
