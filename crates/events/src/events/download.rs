use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;
use vend_types::DeliveryRoute;

/// File delivery events covering both signed strategies and the
/// authenticated fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// A signed grant was issued for a product.
    GrantIssued {
        product_id: i64,
        filename: String,
        /// Seconds the issuer says the link stays valid, when reported.
        expires_in: Option<u64>,
    },

    /// A delivery attempt began.
    Started {
        url: String,
        filename: String,
        total_size: Option<u64>,
    },

    /// The primary strategy failed; the authenticated fallback takes over.
    FallbackEngaged {
        filename: String,
        cause: FailureContext,
    },

    /// Exactly one per successful delivery.
    Completed {
        filename: String,
        path: PathBuf,
        bytes: u64,
        route: DeliveryRoute,
    },

    /// Exactly one per terminal failure.
    Failed {
        filename: String,
        failure: FailureContext,
    },
}
