//! File delivery
//!
//! Dispatches a classified grant to its delivery strategy, falls back to
//! the bearer-authenticated fetch when a signed strategy fails, and emits
//! exactly one `Completed` or `Failed` event per delivery.

mod fallback;
mod staging;

pub use staging::StagedBlob;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use vend_auth::TokenStore;
use vend_errors::{DownloadError, Error, NetworkError};
use vend_events::{AppEvent, DownloadEvent, EventEmitter, EventSender, FailureContext};
use vend_types::{CloudGrant, DeliveryRoute, DownloadGrant, LocalGrant};

use crate::NetClient;

/// A file on disk, delivered.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub path: PathBuf,
    pub bytes: u64,
    pub route: DeliveryRoute,
}

/// Tunables for the delivery pipeline.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// How long a staged fallback blob lingers before cleanup.
    pub cleanup_delay: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            cleanup_delay: Duration::from_millis(vend_config::constants::CLEANUP_DELAY_MS),
        }
    }
}

impl DeliveryConfig {
    /// Build delivery tunables from the loaded application config.
    #[must_use]
    pub fn from_config(config: &vend_config::Config) -> Self {
        Self {
            cleanup_delay: Duration::from_millis(config.download.cleanup_delay_ms),
        }
    }
}

/// Drives one grant through its delivery strategy, with fallback.
pub struct Downloader {
    net: NetClient,
    tokens: Arc<dyn TokenStore>,
    config: DeliveryConfig,
    tx: Option<EventSender>,
}

impl Downloader {
    #[must_use]
    pub fn new(net: NetClient, tokens: Arc<dyn TokenStore>, config: DeliveryConfig) -> Self {
        Self {
            net,
            tokens,
            config,
            tx: None,
        }
    }

    /// Attach an event sender; delivery events flow through it.
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Deliver a grant into `dest_dir`, creating it if needed.
    ///
    /// The signed strategy for the grant's kind runs first. Any failure
    /// there engages the bearer-authenticated fallback; only when that
    /// fails too does the delivery fail. Every call emits exactly one
    /// `Completed` or `Failed` event.
    ///
    /// # Errors
    ///
    /// Returns the fallback's error when both strategies fail, or an I/O
    /// error when the destination cannot be written.
    pub async fn download(&self, grant: &DownloadGrant, dest_dir: &Path) -> Result<Delivery, Error> {
        match self.deliver(grant, dest_dir).await {
            Ok(delivery) => {
                self.emit(AppEvent::Download(DownloadEvent::Completed {
                    filename: grant.target_filename().to_string(),
                    path: delivery.path.clone(),
                    bytes: delivery.bytes,
                    route: delivery.route,
                }));
                Ok(delivery)
            }
            Err(error) => {
                self.emit(AppEvent::Download(DownloadEvent::Failed {
                    filename: grant.target_filename().to_string(),
                    failure: FailureContext::from_error(&error),
                }));
                Err(error)
            }
        }
    }

    /// Destination setup, signed strategy, then fallback. Every failure
    /// exits through `download`'s terminal match, destination I/O
    /// included.
    async fn deliver(&self, grant: &DownloadGrant, dest_dir: &Path) -> Result<Delivery, Error> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, dest_dir))?;
        let dest = dest_dir.join(grant.target_filename());

        match self.primary(grant, &dest).await {
            Ok(delivery) => Ok(delivery),
            Err(cause) => {
                self.emit(AppEvent::Download(DownloadEvent::FallbackEngaged {
                    filename: grant.target_filename().to_string(),
                    cause: FailureContext::from_error(&cause),
                }));
                fallback::fetch_with_auth(
                    &self.net,
                    self.tokens.as_ref(),
                    grant,
                    &dest,
                    self.config.cleanup_delay,
                )
                .await
            }
        }
    }

    async fn primary(&self, grant: &DownloadGrant, dest: &Path) -> Result<Delivery, Error> {
        match grant {
            DownloadGrant::Cloud(cloud) => self.deliver_direct(cloud, dest).await,
            DownloadGrant::Local(local) => self.deliver_secure(local, dest).await,
        }
    }

    /// Plain GET of the signed cloud locator. The signature lives in the
    /// URL; attaching our bearer token would hand it to a third party, so
    /// nothing is attached.
    async fn deliver_direct(&self, grant: &CloudGrant, dest: &Path) -> Result<Delivery, Error> {
        let response = self.net.get(&grant.url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("cloud fetch failed")
                    .to_string(),
            }
            .into());
        }

        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: grant.url.clone(),
            filename: grant.target_filename.clone(),
            total_size: response.content_length(),
        }));

        let bytes = stream_to_file(response, dest).await?;
        Ok(Delivery {
            path: dest.to_path_buf(),
            bytes,
            route: DeliveryRoute::Direct,
        })
    }

    /// POST to the secure re-delivery endpoint, after checking the grant
    /// window locally. An expired grant never touches the endpoint.
    async fn deliver_secure(&self, grant: &LocalGrant, dest: &Path) -> Result<Delivery, Error> {
        if grant.is_expired() {
            return Err(DownloadError::LinkExpired {
                expires_at: grant.expires_at,
            }
            .into());
        }

        let token = self.tokens.require_token()?;
        let secure_url = grant.secure_download_url()?;
        let response = self
            .net
            .post_form(
                &secure_url,
                &[
                    ("auth_token", token.as_str()),
                    ("filename", grant.target_filename.as_str()),
                ],
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("secure endpoint refused")
                    .to_string(),
            }
            .into());
        }

        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: secure_url,
            filename: grant.target_filename.clone(),
            total_size: response.content_length(),
        }));

        let bytes = stream_to_file(response, dest).await?;
        Ok(Delivery {
            path: dest.to_path_buf(),
            bytes,
            route: DeliveryRoute::SecureEndpoint,
        })
    }
}

impl EventEmitter for Downloader {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

/// Stream a response body to `dest`. Partial files are removed when the
/// stream breaks mid-transfer.
async fn stream_to_file(response: reqwest::Response, dest: &Path) -> Result<u64, Error> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;

    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| Error::io_with_path(&e, dest))?;
                written += chunk.len() as u64;
            }
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(dest).await;
                return Err(NetworkError::TransferInterrupted(e.to_string()).into());
            }
        }
    }

    file.flush()
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;
    Ok(written)
}
