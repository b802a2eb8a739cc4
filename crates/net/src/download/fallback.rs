//! Bearer-authenticated last resort
//!
//! When a signed strategy fails, fetch the raw locator with the user's
//! own token. The body is staged to a temporary blob and copied to its
//! destination, so a failed fetch never clobbers an existing file.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use vend_auth::TokenStore;
use vend_errors::{DownloadError, Error, NetworkError};
use vend_types::{DeliveryRoute, DownloadGrant};

use super::staging::StagedBlob;
use super::Delivery;
use crate::NetClient;

pub(super) async fn fetch_with_auth(
    net: &NetClient,
    tokens: &dyn TokenStore,
    grant: &DownloadGrant,
    dest: &Path,
    cleanup_delay: Duration,
) -> Result<Delivery, Error> {
    let token = tokens.require_token()?;
    let response = net.get_with_bearer(grant.url(), &token).await?;

    match response.status() {
        StatusCode::UNAUTHORIZED => return Err(DownloadError::AuthenticationRequired.into()),
        StatusCode::FORBIDDEN => return Err(DownloadError::Forbidden.into()),
        StatusCode::NOT_FOUND => {
            return Err(DownloadError::NotFound {
                filename: grant.target_filename().to_string(),
            }
            .into());
        }
        status if !status.is_success() => {
            return Err(DownloadError::TransferFailed {
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            }
            .into());
        }
        _ => {}
    }

    let body: Bytes = response
        .bytes()
        .await
        .map_err(|e| NetworkError::TransferInterrupted(e.to_string()))?;

    let staging_dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let staged = StagedBlob::create(staging_dir, &body).await?;
    let bytes = staged.save_as(dest).await?;
    staged.release_after(cleanup_delay);

    Ok(Delivery {
        path: dest.to_path_buf(),
        bytes,
        route: DeliveryRoute::Fallback,
    })
}
