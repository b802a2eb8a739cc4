//! Typed client for the storefront's REST endpoints
//!
//! Grants, checkout sessions and purchase lookups. Every endpoint here
//! requires a logged-in user; the bearer token comes from the shared
//! [`TokenStore`] so callers never handle credentials directly.

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde_json::Value;
use url::Url;
use vend_auth::TokenStore;
use vend_errors::{DownloadError, Error, NetworkError, PurchaseError};
use vend_events::{AppEvent, CheckoutEvent, DownloadEvent, EventEmitter, EventSender};
use vend_types::{CheckoutRequest, CheckoutSession, DownloadGrant, GrantResponse, PurchaseRecord};

use crate::NetClient;

/// Client for the storefront API.
#[derive(Clone)]
pub struct StorefrontClient {
    net: NetClient,
    base: String,
    tokens: Arc<dyn TokenStore>,
    tx: Option<EventSender>,
}

impl StorefrontClient {
    /// Create a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` when `base_url` does not parse.
    pub fn new(
        net: NetClient,
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        Url::parse(base_url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            net,
            base: base_url.trim_end_matches('/').to_string(),
            tokens,
            tx: None,
        })
    }

    /// Attach an event sender; protocol events flow through it.
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// The network client this API client rides on.
    #[must_use]
    pub fn net(&self) -> &NetClient {
        &self.net
    }

    /// The token store behind this client.
    #[must_use]
    pub fn tokens(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.tokens)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Ask the issuer for a signed download grant and classify it.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::AuthenticationRequired` on a 401,
    /// `DownloadError::MalformedGrant` when the issued locator cannot be
    /// classified, and transport or HTTP errors otherwise.
    pub async fn fetch_download_grant(&self, product_id: i64) -> Result<DownloadGrant, Error> {
        let token = self.tokens.require_token()?;
        let url = self.endpoint(&format!("/download/{product_id}"));
        let response = self.net.get_with_bearer(&url, &token).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(DownloadError::AuthenticationRequired.into()),
            status if !status.is_success() => return Err(http_error(response).await),
            _ => {}
        }

        let issued: GrantResponse =
            response
                .json()
                .await
                .map_err(|e| DownloadError::MalformedGrant {
                    reason: format!("grant response did not parse: {e}"),
                })?;
        let grant = DownloadGrant::from_issued(&issued)?;

        self.emit(AppEvent::Download(DownloadEvent::GrantIssued {
            product_id,
            filename: grant.target_filename().to_string(),
            expires_in: issued.expires_in,
        }));
        Ok(grant)
    }

    /// Open a checkout session for a product.
    ///
    /// # Errors
    ///
    /// Returns transport or HTTP errors, including the server's `detail`
    /// message when it sends one.
    pub async fn create_checkout(
        &self,
        product_id: i64,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, Error> {
        let token = self.tokens.require_token()?;
        let url = self.endpoint(&format!("/purchase/{product_id}"));
        let response = self.net.post_json(&url, Some(&token), request).await?;

        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("checkout response did not parse: {e}")))?;

        self.emit(AppEvent::Checkout(CheckoutEvent::SessionCreated {
            session_id: session.session_id.clone(),
            checkout_url: session.checkout_url.clone(),
        }));
        Ok(session)
    }

    /// Look up the purchase recorded for a checkout session.
    ///
    /// Returns `Ok(None)` on a 404: the webhook that records the purchase
    /// may simply not have landed yet.
    ///
    /// # Errors
    ///
    /// Returns transport or HTTP errors for anything but success and 404.
    pub async fn purchase_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PurchaseRecord>, Error> {
        let token = self.tokens.require_token()?;
        let url = self.endpoint(&format!("/purchase/session/{session_id}"));
        let response = self.net.get_with_bearer(&url, &token).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let record = response
            .json()
            .await
            .map_err(|e| Error::internal(format!("purchase record did not parse: {e}")))?;
        Ok(Some(record))
    }

    /// Ask the storefront to reconcile a session against the payment
    /// processor and return the resulting purchase.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::SessionMissing` on a 404, and transport or
    /// HTTP errors otherwise.
    pub async fn verify_purchase(&self, session_id: &str) -> Result<PurchaseRecord, Error> {
        let token = self.tokens.require_token()?;
        let url = self.endpoint(&format!("/purchase/verify/{session_id}"));
        let response = self.net.post_bearer(&url, &token).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PurchaseError::SessionMissing {
                session_id: session_id.to_string(),
            }
            .into());
        }
        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| Error::internal(format!("purchase record did not parse: {e}")))
    }
}

impl EventEmitter for StorefrontClient {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

/// Turn a non-success response into an error, preferring the server's own
/// `detail` (or `message`) body field over the bare status line.
async fn http_error(response: Response) -> Error {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();
    let message = match response.json::<Value>().await {
        Ok(body) => detail_message(&body).unwrap_or(fallback),
        Err(_) => fallback,
    };
    NetworkError::HttpError {
        status: status.as_u16(),
        message,
    }
    .into()
}

fn detail_message(body: &Value) -> Option<String> {
    body.get("detail")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
