//! Download grant types and classification
//!
//! A grant is the client-side permission to fetch one purchased file. The
//! issuer hands back a signed URL; which delivery strategy applies is
//! decided exactly once, here, when the response is parsed. Consumers
//! dispatch on the resulting variant and never re-inspect the URL.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use vend_errors::DownloadError;

/// Path prefix the storefront uses for locally stored files. A locator
/// carrying this prefix plus signed query parameters is served by the
/// storefront itself rather than an external object store.
const STORAGE_PREFIX: &str = "/files/";

/// Path prefix of the authenticated re-delivery endpoint for local files.
const SECURE_PREFIX: &str = "/secure-download/";

/// Fallback name when neither the product title nor the locator yields one.
const DEFAULT_FILENAME: &str = "download.bin";

/// Issuer response for `GET /download/{product_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantResponse {
    pub download_url: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub product_title: Option<String>,
}

/// Permission to fetch one purchased file, classified at creation.
///
/// `Cloud` locators are fully authenticated by the issuer: the signature is
/// embedded in the URL and the client attaches nothing. `Local` locators
/// point at the storefront's own file endpoint and expose the signature
/// token and expiry so the client can verify the window and drive the
/// secure re-delivery endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownloadGrant {
    Cloud(CloudGrant),
    Local(LocalGrant),
}

/// Grant whose URL is served by an external object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudGrant {
    pub url: String,
    pub target_filename: String,
}

/// Grant whose URL is served by the storefront's own file endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalGrant {
    /// The locator exactly as issued.
    pub url: String,
    /// Path remainder after the storage prefix, e.g. `products/3/kit.zip`.
    pub file_path: String,
    /// Signature over the file path and expiry, echoed back verbatim.
    pub signature_token: String,
    /// Expiry as seconds since the Unix epoch.
    pub expires_at: u64,
    pub target_filename: String,
}

impl DownloadGrant {
    /// Classify an issued response into a grant.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::MalformedGrant` when the locator does not
    /// parse, or when it carries the storage prefix without a complete set
    /// of signed query parameters.
    pub fn from_issued(response: &GrantResponse) -> Result<Self, DownloadError> {
        Self::from_url(&response.download_url, response.product_title.as_deref())
    }

    /// Classify a raw locator, optionally naming the file after `title`.
    ///
    /// The decision is made once: a path containing the storage prefix with
    /// both `token` and a numeric `expires` in the query is `Local`;
    /// everything else is `Cloud`. Signed query parameters alone never make
    /// a locator local — external object stores sign with query tokens too.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::MalformedGrant` for unparseable locators and
    /// for storage-prefix locators missing their signed parameters.
    pub fn from_url(url: &str, title: Option<&str>) -> Result<Self, DownloadError> {
        let parsed = Url::parse(url).map_err(|e| DownloadError::MalformedGrant {
            reason: format!("invalid locator {url}: {e}"),
        })?;

        let filename = title
            .and_then(sanitize_filename)
            .or_else(|| filename_from_url(&parsed))
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

        let Some((_, file_path)) = parsed.path().split_once(STORAGE_PREFIX) else {
            return Ok(Self::Cloud(CloudGrant {
                url: url.to_string(),
                target_filename: filename,
            }));
        };

        if file_path.is_empty() {
            return Err(DownloadError::MalformedGrant {
                reason: "storage locator has no file path".to_string(),
            });
        }

        let mut token = None;
        let mut expires = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "token" => token = Some(value.into_owned()),
                "expires" => expires = Some(value.into_owned()),
                _ => {}
            }
        }

        let Some(signature_token) = token else {
            return Err(DownloadError::MalformedGrant {
                reason: "storage locator is missing the token parameter".to_string(),
            });
        };
        let expires_at = expires
            .as_deref()
            .and_then(|raw| raw.parse::<u64>().ok())
            .ok_or_else(|| DownloadError::MalformedGrant {
                reason: "storage locator is missing a numeric expires parameter".to_string(),
            })?;

        Ok(Self::Local(LocalGrant {
            url: url.to_string(),
            file_path: file_path.to_string(),
            signature_token,
            expires_at,
            target_filename: filename,
        }))
    }

    /// The locator exactly as issued.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Cloud(grant) => &grant.url,
            Self::Local(grant) => &grant.url,
        }
    }

    /// Name the delivered file will be saved under.
    #[must_use]
    pub fn target_filename(&self) -> &str {
        match self {
            Self::Cloud(grant) => &grant.target_filename,
            Self::Local(grant) => &grant.target_filename,
        }
    }
}

impl LocalGrant {
    /// Whether the grant window has closed at `now` (seconds since epoch).
    ///
    /// The comparison is the issuer's own: strictly past the expiry. A
    /// grant observed exactly at `expires_at` is still inside its window.
    #[must_use]
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }

    /// Whether the grant window has closed right now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }

    /// Locator of the authenticated re-delivery endpoint for this grant:
    /// the storage prefix swapped for the secure prefix, with scheme,
    /// authority and the signed query preserved verbatim.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::MalformedGrant` if the stored locator no
    /// longer parses or lost its storage prefix (possible only for grants
    /// deserialized from external data).
    pub fn secure_download_url(&self) -> Result<String, DownloadError> {
        let mut parsed = Url::parse(&self.url).map_err(|e| DownloadError::MalformedGrant {
            reason: format!("invalid locator {}: {e}", self.url),
        })?;
        let path = parsed.path().to_string();
        let Some((prefix, rest)) = path.split_once(STORAGE_PREFIX) else {
            return Err(DownloadError::MalformedGrant {
                reason: "locator lost its storage prefix".to_string(),
            });
        };
        parsed.set_path(&format!("{prefix}{SECURE_PREFIX}{rest}"));
        Ok(parsed.to_string())
    }
}

/// Which strategy ultimately delivered a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryRoute {
    /// Plain GET of a cloud locator.
    Direct,
    /// POST to the storefront's secure re-delivery endpoint.
    SecureEndpoint,
    /// Bearer-authenticated GET of the raw locator.
    Fallback,
}

impl DeliveryRoute {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::SecureEndpoint => "secure_endpoint",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DeliveryRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduce a product title to a safe file name. Path separators and control
/// characters become underscores; names that collapse to nothing yield
/// `None` so callers can fall back.
fn sanitize_filename(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn filename_from_url(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .and_then(sanitize_filename)
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_grant(expires_at: u64) -> LocalGrant {
        LocalGrant {
            url: format!(
                "http://localhost:8000/files/products/3/kit.zip?token=abc123&expires={expires_at}"
            ),
            file_path: "products/3/kit.zip".to_string(),
            signature_token: "abc123".to_string(),
            expires_at,
            target_filename: "kit.zip".to_string(),
        }
    }

    #[test]
    fn storage_locator_classifies_as_local() {
        let grant = DownloadGrant::from_url(
            "http://localhost:8000/files/products/3/kit.zip?token=abc123&expires=1700000045",
            Some("Starter Kit"),
        )
        .unwrap();
        match grant {
            DownloadGrant::Local(local) => {
                assert_eq!(local.file_path, "products/3/kit.zip");
                assert_eq!(local.signature_token, "abc123");
                assert_eq!(local.expires_at, 1_700_000_045);
                assert_eq!(local.target_filename, "Starter Kit");
            }
            DownloadGrant::Cloud(_) => panic!("expected a local grant"),
        }
    }

    #[test]
    fn signed_query_without_storage_prefix_stays_cloud() {
        // Object stores sign with query tokens too; only the storage
        // prefix makes a locator local.
        let grant = DownloadGrant::from_url(
            "https://cdn.example.com/storage/v1/object/sign/products/kit.zip?token=eyJhbGci&expires=1700000045",
            None,
        )
        .unwrap();
        assert!(matches!(grant, DownloadGrant::Cloud(_)));
    }

    #[test]
    fn plain_cloud_locator_classifies_as_cloud() {
        let grant =
            DownloadGrant::from_url("https://cdn.example.com/dl/kit.zip?sig=xyz", None).unwrap();
        match grant {
            DownloadGrant::Cloud(cloud) => assert_eq!(cloud.target_filename, "kit.zip"),
            DownloadGrant::Local(_) => panic!("expected a cloud grant"),
        }
    }

    #[test]
    fn storage_locator_missing_token_is_malformed() {
        let err = DownloadGrant::from_url(
            "http://localhost:8000/files/products/3/kit.zip?expires=1700000045",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DownloadError::MalformedGrant { .. }));
    }

    #[test]
    fn storage_locator_with_unparseable_expiry_is_malformed() {
        let err = DownloadGrant::from_url(
            "http://localhost:8000/files/products/3/kit.zip?token=abc&expires=soon",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DownloadError::MalformedGrant { .. }));
    }

    #[test]
    fn expiry_boundary_is_strictly_past() {
        let local = local_grant(1_700_000_045);
        assert!(!local.is_expired_at(1_700_000_044));
        assert!(!local.is_expired_at(1_700_000_045));
        assert!(local.is_expired_at(1_700_000_046));
    }

    #[test]
    fn secure_locator_swaps_prefix_and_keeps_query() {
        let local = local_grant(1_700_000_045);
        assert_eq!(
            local.secure_download_url().unwrap(),
            "http://localhost:8000/secure-download/products/3/kit.zip?token=abc123&expires=1700000045"
        );
    }

    #[test]
    fn secure_locator_preserves_mount_prefix() {
        let grant = DownloadGrant::from_url(
            "http://localhost:8000/api/files/kit.zip?token=t&expires=99",
            None,
        )
        .unwrap();
        let DownloadGrant::Local(local) = grant else {
            panic!("expected a local grant");
        };
        assert_eq!(
            local.secure_download_url().unwrap(),
            "http://localhost:8000/api/secure-download/kit.zip?token=t&expires=99"
        );
    }

    #[test]
    fn titles_with_separators_are_neutralized() {
        let grant = DownloadGrant::from_url(
            "https://cdn.example.com/dl/kit.zip",
            Some("../../etc/passwd"),
        )
        .unwrap();
        assert_eq!(grant.target_filename(), "_.._etc_passwd");
    }

    #[test]
    fn empty_title_falls_back_to_locator_segment_then_default() {
        let from_segment =
            DownloadGrant::from_url("https://cdn.example.com/dl/kit.zip", Some("   ")).unwrap();
        assert_eq!(from_segment.target_filename(), "kit.zip");

        let from_default = DownloadGrant::from_url("https://cdn.example.com/", None).unwrap();
        assert_eq!(from_default.target_filename(), DEFAULT_FILENAME);
    }
}
