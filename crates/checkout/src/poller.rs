//! Sequential confirmation poller
//!
//! Settlement is webhook-driven on the backend and routinely lags the
//! buyer's redirect, so absence of a purchase record is not failure.
//! Each attempt looks the session up and, when the backend has nothing
//! yet, asks it to reconcile against the payment processor directly.
//! Attempts are strictly sequential; one run never has two requests in
//! flight.

use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use vend_config::constants;
use vend_errors::{Error, PurchaseError};
use vend_events::{AppEvent, CheckoutEvent, EventEmitter, EventSender, FailureContext};
use vend_net::StorefrontClient;
use vend_types::PurchaseRecord;

use crate::state::{ConfirmationOutcome, ConfirmationState};

/// Poller tunables.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Pause between confirmation attempts. The first attempt fires
    /// immediately.
    pub poll_interval: Duration,
    /// Attempts before the run gives up.
    pub max_attempts: u32,
    /// Pause between settlement and the redirect notification.
    pub redirect_delay: Duration,
    /// Where the storefront sends the buyer after settlement.
    pub redirect_location: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(constants::POLL_INTERVAL_SECS),
            max_attempts: constants::MAX_VERIFY_ATTEMPTS,
            redirect_delay: Duration::from_secs(constants::REDIRECT_DELAY_SECS),
            redirect_location: constants::DEFAULT_REDIRECT_LOCATION.to_string(),
        }
    }
}

impl PollerConfig {
    /// Build poller tunables from the loaded application config.
    #[must_use]
    pub fn from_config(config: &vend_config::Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.checkout.poll_interval),
            max_attempts: config.checkout.max_attempts,
            redirect_delay: Duration::from_secs(config.checkout.redirect_delay),
            redirect_location: constants::DEFAULT_REDIRECT_LOCATION.to_string(),
        }
    }
}

/// Spawns confirmation runs for checkout sessions.
pub struct PurchasePoller {
    api: StorefrontClient,
    config: PollerConfig,
    tx: Option<EventSender>,
}

impl PurchasePoller {
    #[must_use]
    pub fn new(api: StorefrontClient, config: PollerConfig) -> Self {
        Self {
            api,
            config,
            tx: None,
        }
    }

    /// Attach an event sender; confirmation events flow through it.
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Start confirming `session_id` on a background task.
    ///
    /// The returned handle owns the run: await it, watch its state, or
    /// cancel it. Dropping the handle also cancels the run.
    #[must_use]
    pub fn spawn(&self, session_id: impl Into<String>) -> PollHandle {
        let session_id = session_id.into();
        let (state_tx, state_rx) = watch::channel(ConfirmationState::Unverified);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let run = Run {
            api: self.api.clone(),
            config: self.config.clone(),
            tx: self.tx.clone(),
            session_id: session_id.clone(),
            state: state_tx,
        };
        let task = tokio::spawn(run.run(cancel_rx));

        PollHandle {
            session_id,
            state: state_rx,
            cancel: Some(cancel_tx),
            task,
        }
    }
}

/// Owning handle for one confirmation run.
pub struct PollHandle {
    session_id: String,
    state: watch::Receiver<ConfirmationState>,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<ConfirmationOutcome>,
}

impl PollHandle {
    /// The session this run is confirming.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Live view of the state machine.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<ConfirmationState> {
        self.state.clone()
    }

    /// Wait for the run to finish.
    pub async fn wait(self) -> ConfirmationOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(_) => ConfirmationOutcome::Cancelled,
        }
    }

    /// Tear the run down at its next suspension point and wait for it.
    /// A redirect still pending at that moment is suppressed.
    pub async fn cancel(mut self) -> ConfirmationOutcome {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        match self.task.await {
            Ok(outcome) => outcome,
            Err(_) => ConfirmationOutcome::Cancelled,
        }
    }
}

/// One spawned confirmation run.
struct Run {
    api: StorefrontClient,
    config: PollerConfig,
    tx: Option<EventSender>,
    session_id: String,
    state: watch::Sender<ConfirmationState>,
}

/// What one attempt learned.
enum Probe {
    Settled(PurchaseRecord),
    Declined(String),
    Pending,
}

impl Run {
    async fn run(self, mut cancel_rx: oneshot::Receiver<()>) -> ConfirmationOutcome {
        self.emit(AppEvent::Checkout(CheckoutEvent::VerificationStarted {
            session_id: self.session_id.clone(),
        }));

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        for attempt in 1..=self.config.max_attempts {
            tokio::select! {
                _ = &mut cancel_rx => return self.cancelled(),
                _ = ticker.tick() => {}
            }

            self.transition(ConfirmationState::Verifying { attempt });
            self.emit(AppEvent::Checkout(CheckoutEvent::Attempt {
                session_id: self.session_id.clone(),
                attempt,
                max_attempts: self.config.max_attempts,
            }));

            let probe = tokio::select! {
                _ = &mut cancel_rx => return self.cancelled(),
                probe = self.check_once() => probe,
            };

            match probe {
                Probe::Settled(record) => return self.settled(record, &mut cancel_rx).await,
                Probe::Declined(status) => {
                    self.transition(ConfirmationState::Failed {
                        status: status.clone(),
                    });
                    self.emit(AppEvent::Checkout(CheckoutEvent::PaymentDeclined {
                        session_id: self.session_id.clone(),
                        status: status.clone(),
                    }));
                    return ConfirmationOutcome::Declined { status };
                }
                Probe::Pending => self.transition(ConfirmationState::Pending { attempt }),
            }
        }

        let attempts = self.config.max_attempts;
        self.transition(ConfirmationState::GaveUp { attempts });
        let timeout = Error::from(PurchaseError::VerificationTimedOut { attempts });
        self.emit(AppEvent::Checkout(CheckoutEvent::GaveUp {
            session_id: self.session_id.clone(),
            attempts,
            failure: FailureContext::from_error(&timeout),
        }));
        ConfirmationOutcome::GaveUp { attempts }
    }

    /// One sequential attempt: look the session up, and reconcile when
    /// the backend has not recorded it yet. Errors leave the machine
    /// pending; the webhook may simply not have landed.
    async fn check_once(&self) -> Probe {
        match self.api.purchase_by_session(&self.session_id).await {
            Ok(Some(record)) => Self::classify(record),
            Ok(None) => match self.api.verify_purchase(&self.session_id).await {
                Ok(record) => Self::classify(record),
                Err(error) => {
                    self.emit_debug(format!("session reconciliation failed: {error}"));
                    Probe::Pending
                }
            },
            Err(error) => {
                self.emit_debug(format!("session lookup failed: {error}"));
                Probe::Pending
            }
        }
    }

    fn classify(record: PurchaseRecord) -> Probe {
        if record.payment_status.is_settled() {
            Probe::Settled(record)
        } else if record.payment_status.is_declined() {
            Probe::Declined(record.payment_status.as_str().to_string())
        } else {
            Probe::Pending
        }
    }

    /// Settlement: one settled event, then one redirect after the
    /// configured delay. Cancellation during the delay suppresses the
    /// redirect but the outcome stays settled.
    async fn settled(
        self,
        record: PurchaseRecord,
        cancel_rx: &mut oneshot::Receiver<()>,
    ) -> ConfirmationOutcome {
        self.transition(ConfirmationState::Completed {
            record: record.clone(),
        });
        self.emit(AppEvent::Checkout(CheckoutEvent::Settled {
            session_id: self.session_id.clone(),
            product_id: record.product_id,
            product_title: record.product_title.clone(),
        }));

        tokio::select! {
            _ = cancel_rx => {}
            () = sleep(self.config.redirect_delay) => {
                self.emit(AppEvent::Checkout(CheckoutEvent::RedirectScheduled {
                    session_id: self.session_id.clone(),
                    location: self.config.redirect_location.clone(),
                }));
            }
        }

        ConfirmationOutcome::Settled(record)
    }

    fn cancelled(&self) -> ConfirmationOutcome {
        self.emit(AppEvent::Checkout(CheckoutEvent::Cancelled {
            session_id: self.session_id.clone(),
        }));
        ConfirmationOutcome::Cancelled
    }

    fn transition(&self, state: ConfirmationState) {
        let _ = self.state.send(state);
    }
}

impl EventEmitter for Run {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}
