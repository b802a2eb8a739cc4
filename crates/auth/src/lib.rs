#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Bearer token storage for the vend client
//!
//! Everything that needs the session token goes through the `TokenStore`
//! capability instead of reaching into ambient global state. The CLI uses
//! the file-backed store; tests and embedders use the in-memory one.

use std::path::PathBuf;
use std::sync::Mutex;

use vend_errors::{AuthError, Error};

/// Capability interface for reading and writing the session bearer token.
///
/// Implementations are synchronous: the token is a small local secret and
/// every consumer needs it on the hot path of request construction.
pub trait TokenStore: Send + Sync {
    /// The stored token, if any. Whitespace-only tokens count as absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage exists but cannot be read.
    fn token(&self) -> Result<Option<String>, Error>;

    /// Persist a new token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be written.
    fn set_token(&self, token: &str) -> Result<(), Error>;

    /// Remove the stored token. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be modified.
    fn clear_token(&self) -> Result<(), Error>;

    /// The stored token, or `AuthError::NotLoggedIn` when absent.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` when no token is stored, or a
    /// storage error when the token cannot be read.
    fn require_token(&self) -> Result<String, Error> {
        self.token()?
            .ok_or_else(|| AuthError::NotLoggedIn.into())
    }
}

/// Token persisted as a plain file under the platform data directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location (`<data dir>/vend/token`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    pub fn with_default_path() -> Result<Self, Error> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Default token path under the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let data_dir = dirs::data_dir().ok_or_else(|| AuthError::TokenRead {
            message: "data directory could not be determined".to_string(),
        })?;
        Ok(data_dir.join("vend").join("token"))
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Result<Option<String>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AuthError::TokenRead {
                message: err.to_string(),
            }
            .into()),
        }
    }

    fn set_token(&self, token: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| AuthError::TokenWrite {
                message: err.to_string(),
            })?;
        }
        std::fs::write(&self.path, token).map_err(|err| AuthError::TokenWrite {
            message: err.to_string(),
        })?;
        Ok(())
    }

    fn clear_token(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::TokenWrite {
                message: err.to_string(),
            }
            .into()),
        }
    }
}

/// In-memory token store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Result<Option<String>, Error> {
        Ok(self
            .lock()
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string))
    }

    fn set_token(&self, token: &str) -> Result<(), Error> {
        *self.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), Error> {
        *self.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.token().unwrap(), None);

        store.set_token("tok-123").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("tok-123"));
        assert_eq!(store.require_token().unwrap(), "tok-123");

        store.clear_token().unwrap();
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn require_token_reports_not_logged_in() {
        let store = MemoryTokenStore::new();
        let err = store.require_token().unwrap_err();
        assert!(matches!(
            err,
            Error::Auth(vend_errors::AuthError::NotLoggedIn)
        ));
    }

    #[test]
    fn whitespace_token_counts_as_absent() {
        let store = MemoryTokenStore::with_token("   ");
        assert_eq!(store.token().unwrap(), None);
        assert!(store.require_token().is_err());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token"));

        assert_eq!(store.token().unwrap(), None);
        store.set_token("tok-456\n").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("tok-456"));

        store.clear_token().unwrap();
        assert_eq!(store.token().unwrap(), None);
        // Clearing again is still fine
        store.clear_token().unwrap();
    }
}
