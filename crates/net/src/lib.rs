#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for vend
//!
//! This crate provides the HTTP client, the typed storefront API and the
//! file delivery pipeline. Signed grants are classified once (in
//! `vend-types`) and dispatched here: cloud locators are fetched bare,
//! local locators go through the secure re-delivery endpoint, and any
//! signed-strategy failure engages the bearer-authenticated fallback.

mod api;
mod client;
mod download;

pub use api::StorefrontClient;
pub use client::{NetClient, NetConfig};
pub use download::{Delivery, DeliveryConfig, Downloader, StagedBlob};

use std::path::Path;

use vend_errors::Error;
use vend_events::{AppEvent, DownloadEvent, EventEmitter, FailureContext};
use vend_types::DownloadGrant;

/// Classify a raw locator and deliver it in one call.
///
/// Convenience over [`Downloader::download`] for callers holding a URL
/// rather than an already classified grant. A locator that fails
/// classification emits the same single `Failed` event a failed
/// delivery would, labelled by the title when one was given.
///
/// # Errors
///
/// Returns `DownloadError::MalformedGrant` when the locator cannot be
/// classified, and any delivery error otherwise.
pub async fn download_with_auth(
    downloader: &Downloader,
    url: &str,
    title: Option<&str>,
    dest_dir: &Path,
) -> Result<Delivery, Error> {
    let grant = match DownloadGrant::from_url(url, title) {
        Ok(grant) => grant,
        Err(cause) => {
            let error = Error::from(cause);
            downloader.emit(AppEvent::Download(DownloadEvent::Failed {
                filename: title.unwrap_or(url).to_string(),
                failure: FailureContext::from_error(&error),
            }));
            return Err(error);
        }
    };
    downloader.download(&grant, dest_dir).await
}
