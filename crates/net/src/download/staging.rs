//! Staged blob with delayed, idempotent release
//!
//! Fallback bodies land in a uniquely named staging file next to their
//! destination. Saving copies the blob out; release deletes the staging
//! file at most once, on a delay, with a drop backstop for early exits.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use uuid::Uuid;
use vend_errors::Error;

/// A fetched body parked on disk until its destination copy is safe.
#[derive(Debug)]
pub struct StagedBlob {
    path: PathBuf,
    released: AtomicBool,
}

impl StagedBlob {
    /// Write `contents` to a fresh staging file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the staging file cannot be written.
    pub async fn create(dir: &Path, contents: &[u8]) -> Result<Self, Error> {
        let path = dir.join(format!(".vend-stage-{}", Uuid::new_v4()));
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| Error::io_with_path(&e, &path))?;
        Ok(Self {
            path,
            released: AtomicBool::new(false),
        })
    }

    /// Location of the staging file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the staged contents to `dest`, replacing any existing file.
    /// Returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the copy fails.
    pub async fn save_as(&self, dest: &Path) -> Result<u64, Error> {
        tokio::fs::copy(&self.path, dest)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))
    }

    /// Delete the staging file. Calling this more than once is fine; only
    /// the first call touches the filesystem.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the first removal fails for any reason
    /// other than the file already being gone.
    pub async fn release(&self) -> Result<(), Error> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io_with_path(&e, &self.path)),
        }
    }

    /// Release on a background task after `delay`, consuming the blob.
    pub fn release_after(self, delay: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = self.release().await;
        })
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_release_leaves_only_destination() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedBlob::create(dir.path(), b"blob contents").await.unwrap();
        let stage_path = staged.path().to_path_buf();
        assert!(stage_path.exists());

        let dest = dir.path().join("kit.zip");
        let copied = staged.save_as(&dest).await.unwrap();
        assert_eq!(copied, 13);

        staged.release().await.unwrap();
        assert!(!stage_path.exists());
        assert_eq!(std::fs::read(&dest).unwrap(), b"blob contents");
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedBlob::create(dir.path(), b"x").await.unwrap();
        staged.release().await.unwrap();
        staged.release().await.unwrap();
    }

    #[tokio::test]
    async fn drop_backstop_removes_stage_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedBlob::create(dir.path(), b"x").await.unwrap();
        let stage_path = staged.path().to_path_buf();
        drop(staged);
        assert!(!stage_path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_release_runs_after_the_delay() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedBlob::create(dir.path(), b"x").await.unwrap();
        let stage_path = staged.path().to_path_buf();

        staged
            .release_after(Duration::from_millis(100))
            .await
            .unwrap();
        assert!(!stage_path.exists());
    }
}
