#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Purchase confirmation for vend
//!
//! After a buyer returns from the payment processor's checkout page,
//! settlement lands asynchronously via webhook and may lag the redirect.
//! This crate polls the storefront on a fixed budget, reconciles
//! sessions the backend has not recorded yet, and surfaces the result
//! through events and a watchable state machine.

mod poller;
mod state;

pub use poller::{PollHandle, PollerConfig, PurchasePoller};
pub use state::{ConfirmationOutcome, ConfirmationState};
