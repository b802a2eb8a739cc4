//! Integration tests for checkout crate

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use httpmock::prelude::*;
    use vend_auth::{MemoryTokenStore, TokenStore};
    use vend_checkout::{ConfirmationOutcome, ConfirmationState, PollerConfig, PurchasePoller};
    use vend_events::{channel, AppEvent, CheckoutEvent, EventReceiver};
    use vend_net::{NetClient, StorefrontClient};

    fn api_for(server: &MockServer) -> StorefrontClient {
        let store = MemoryTokenStore::new();
        store.set_token("tok-1").unwrap();
        StorefrontClient::new(
            NetClient::with_defaults().unwrap(),
            &server.base_url(),
            Arc::new(store),
        )
        .unwrap()
    }

    fn fast_config(max_attempts: u32) -> PollerConfig {
        PollerConfig {
            poll_interval: Duration::from_millis(10),
            max_attempts,
            redirect_delay: Duration::from_millis(10),
            redirect_location: "/dashboard".to_string(),
        }
    }

    fn purchase_json(status: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 41,
            "user_id": 7,
            "product_id": 3,
            "stripe_session_id": "cs_test_a1",
            "payment_status": status,
            "created_at": "2024-11-02T09:30:00Z",
            "product_title": "Starter Kit"
        })
    }

    struct EventTally {
        started: usize,
        attempts: usize,
        settled: usize,
        redirects: usize,
        declined: usize,
        gave_up: usize,
        cancelled: usize,
    }

    fn tally(rx: &mut EventReceiver) -> EventTally {
        let mut counts = EventTally {
            started: 0,
            attempts: 0,
            settled: 0,
            redirects: 0,
            declined: 0,
            gave_up: 0,
            cancelled: 0,
        };
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Checkout(event) = event {
                match event {
                    CheckoutEvent::VerificationStarted { .. } => counts.started += 1,
                    CheckoutEvent::Attempt { .. } => counts.attempts += 1,
                    CheckoutEvent::Settled { .. } => counts.settled += 1,
                    CheckoutEvent::RedirectScheduled { .. } => counts.redirects += 1,
                    CheckoutEvent::PaymentDeclined { .. } => counts.declined += 1,
                    CheckoutEvent::GaveUp { .. } => counts.gave_up += 1,
                    CheckoutEvent::Cancelled { .. } => counts.cancelled += 1,
                    CheckoutEvent::SessionCreated { .. } => {}
                }
            }
        }
        counts
    }

    #[tokio::test]
    async fn test_settles_on_first_attempt_with_one_redirect() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        let session_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/purchase/session/cs_test_a1")
                .header("authorization", "Bearer tok-1");
            then.status(200).json_body(purchase_json("completed"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(10)).with_events(tx);
        let outcome = poller.spawn("cs_test_a1").wait().await;

        session_mock.assert();
        let ConfirmationOutcome::Settled(record) = outcome else {
            panic!("expected settlement, got {outcome:?}");
        };
        assert!(record.payment_status.is_settled());

        let counts = tally(&mut rx);
        assert_eq!(counts.started, 1);
        assert_eq!(counts.attempts, 1);
        assert_eq!(counts.settled, 1);
        assert_eq!(counts.redirects, 1);
        assert_eq!(counts.gave_up, 0);
    }

    #[tokio::test]
    async fn test_missing_record_reconciles_through_verify() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        // The webhook has not landed: the lookup 404s, reconciliation
        // answers instead.
        let session_mock = server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(404)
                .json_body(serde_json::json!({ "detail": "Purchase not found" }));
        });
        let verify_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/purchase/verify/cs_test_a1")
                .header("authorization", "Bearer tok-1");
            then.status(200).json_body(purchase_json("completed"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(10)).with_events(tx);
        let outcome = poller.spawn("cs_test_a1").wait().await;

        session_mock.assert();
        verify_mock.assert();
        assert!(matches!(outcome, ConfirmationOutcome::Settled(_)));

        let counts = tally(&mut rx);
        assert_eq!(counts.attempts, 1);
        assert_eq!(counts.settled, 1);
        assert_eq!(counts.redirects, 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_exact_budget() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        let session_mock = server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("pending"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(10)).with_events(tx);
        let outcome = poller.spawn("cs_test_a1").wait().await;

        assert!(matches!(
            outcome,
            ConfirmationOutcome::GaveUp { attempts: 10 }
        ));
        // Ten lookups, never an eleventh
        assert_eq!(session_mock.hits(), 10);

        let counts = tally(&mut rx);
        assert_eq!(counts.attempts, 10);
        assert_eq!(counts.gave_up, 1);
        assert_eq!(counts.settled, 0);
        assert_eq!(counts.redirects, 0);
    }

    #[tokio::test]
    async fn test_gave_up_failure_points_at_manual_verification() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("pending"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(2)).with_events(tx);
        let _ = poller.spawn("cs_test_a1").wait().await;

        let mut failure = None;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Checkout(CheckoutEvent::GaveUp {
                failure: context, ..
            }) = event
            {
                failure = Some(context);
            }
        }
        let failure = failure.expect("expected a gave-up event");
        assert_eq!(
            failure.code.as_deref(),
            Some("purchase.verification_timed_out")
        );
        assert!(failure.retryable);
    }

    #[tokio::test]
    async fn test_declined_payment_is_terminal() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        let session_mock = server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("failed"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(10)).with_events(tx);
        let outcome = poller.spawn("cs_test_a1").wait().await;

        // A decline never retries
        assert_eq!(session_mock.hits(), 1);
        let ConfirmationOutcome::Declined { status } = outcome else {
            panic!("expected a decline, got {outcome:?}");
        };
        assert_eq!(status, "failed");

        let counts = tally(&mut rx);
        assert_eq!(counts.declined, 1);
        assert_eq!(counts.settled, 0);
        assert_eq!(counts.redirects, 0);
    }

    #[tokio::test]
    async fn test_refunded_counts_as_declined() {
        let server = MockServer::start();
        let (tx, _rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("refunded"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(10)).with_events(tx);
        let outcome = poller.spawn("cs_test_a1").wait().await;

        assert!(matches!(
            outcome,
            ConfirmationOutcome::Declined { status } if status == "refunded"
        ));
    }

    #[tokio::test]
    async fn test_pending_then_completed_settles() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        let mut pending_mock = server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("pending"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(10)).with_events(tx);
        let handle = poller.spawn("cs_test_a1");

        // Let two attempts observe the pending order, then settle it
        let mut state = handle.state();
        loop {
            state.changed().await.unwrap();
            let snapshot = state.borrow().clone();
            if matches!(snapshot, ConfirmationState::Pending { attempt } if attempt >= 2) {
                break;
            }
        }
        pending_mock.delete();
        server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("completed"));
        });

        let outcome = handle.wait().await;
        assert!(matches!(outcome, ConfirmationOutcome::Settled(_)));

        let counts = tally(&mut rx);
        assert!(counts.attempts >= 3);
        assert_eq!(counts.settled, 1);
        assert_eq!(counts.redirects, 1);
    }

    #[tokio::test]
    async fn test_cancel_tears_down_mid_run() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("pending"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(10)).with_events(tx);
        let handle = poller.spawn("cs_test_a1");

        let mut state = handle.state();
        loop {
            state.changed().await.unwrap();
            if matches!(*state.borrow(), ConfirmationState::Pending { .. }) {
                break;
            }
        }
        let outcome = handle.cancel().await;
        assert!(matches!(outcome, ConfirmationOutcome::Cancelled));

        let counts = tally(&mut rx);
        assert_eq!(counts.cancelled, 1);
        assert_eq!(counts.settled, 0);
        assert_eq!(counts.gave_up, 0);
        assert_eq!(counts.redirects, 0);
    }

    #[tokio::test]
    async fn test_cancel_during_redirect_delay_suppresses_redirect() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("completed"));
        });

        let config = PollerConfig {
            redirect_delay: Duration::from_secs(30),
            ..fast_config(10)
        };
        let poller = PurchasePoller::new(api_for(&server), config).with_events(tx);
        let handle = poller.spawn("cs_test_a1");

        // The payment settles, then we tear down inside the delay
        let mut state = handle.state();
        loop {
            state.changed().await.unwrap();
            if state.borrow().is_terminal() {
                break;
            }
        }
        let outcome = handle.cancel().await;
        assert!(matches!(outcome, ConfirmationOutcome::Settled(_)));

        let counts = tally(&mut rx);
        assert_eq!(counts.settled, 1);
        assert_eq!(counts.redirects, 0);
        assert_eq!(counts.cancelled, 0);
    }

    #[tokio::test]
    async fn test_dropped_handle_cancels_run() {
        let server = MockServer::start();
        let (tx, mut rx) = channel();

        server.mock(|when, then| {
            when.method(GET).path("/purchase/session/cs_test_a1");
            then.status(200).json_body(purchase_json("pending"));
        });

        let poller = PurchasePoller::new(api_for(&server), fast_config(10)).with_events(tx);
        let handle = poller.spawn("cs_test_a1");

        let mut state = handle.state();
        loop {
            state.changed().await.unwrap();
            if matches!(*state.borrow(), ConfirmationState::Pending { .. }) {
                break;
            }
        }
        drop(handle);

        // The detached task notices the closed cancel channel and exits
        tokio::time::sleep(Duration::from_millis(50)).await;
        let counts = tally(&mut rx);
        assert_eq!(counts.cancelled, 1);
        assert_eq!(counts.gave_up, 0);
    }
}
