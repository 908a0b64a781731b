use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use crate::errors::KeyrunError;
use tracing::{debug, error, warn};

/// Owns the temporary config path for the duration of a run.
///
/// [`TempConfigGuard::cleanup`] is the normal release; `Drop` removes the
/// file if the guard is dropped without it (panic, early return).
#[derive(Debug)]
pub struct TempConfigGuard {
    path: PathBuf,
    released: bool,
}

#[derive(Debug)]
pub enum CleanupOutcome {
    /// A temp file existed and was deleted.
    Removed,
    /// Nothing was on disk at the temp path.
    NothingToRemove,
    Failed(KeyrunError),
}

impl CleanupOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl TempConfigGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), released: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to the temp path, replacing any existing file.
    /// On Unix the file is readable by the owner only.
    pub async fn write(&self, contents: &str) -> Result<(), KeyrunError> {
        let to_err = |source| KeyrunError::TempWrite { path: self.path.clone(), source };

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await.map_err(to_err)?;
        file.write_all(contents.as_bytes()).await.map_err(to_err)?;
        file.flush().await.map_err(to_err)?;

        // `mode` only applies on creation; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(to_err)?;
        }

        debug!(path = %self.path.display(), bytes = contents.len(), "Wrote temporary config");
        Ok(())
    }

    /// Delete the temp file if it exists.
    pub async fn cleanup(mut self) -> CleanupOutcome {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed temporary config");
                CleanupOutcome::Removed
            }
            Err(e) if e.kind() == ErrorKind::NotFound => CleanupOutcome::NothingToRemove,
            Err(source) => {
                error!(path = %self.path.display(), error = %source, "Temporary config could not be removed and still holds the secret");
                CleanupOutcome::Failed(KeyrunError::Cleanup { path: self.path.clone(), source })
            }
        }
    }
}

impl Drop for TempConfigGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!(path = %self.path.display(), "Removed temporary config during unwind"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => error!(path = %self.path.display(), error = %e, "Failed to remove temporary config during unwind"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_cleanup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp.yaml");
        let guard = TempConfigGuard::new(&path);

        guard.write("apiKey: \"abc\"\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "apiKey: \"abc\"\n");

        assert!(matches!(guard.cleanup().await, CleanupOutcome::Removed));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp.yaml");
        std::fs::write(&path, "a much longer stale body that must be truncated").unwrap();

        let guard = TempConfigGuard::new(&path);
        guard.write("new").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        guard.cleanup().await;
    }

    #[tokio::test]
    async fn test_cleanup_without_file() {
        let dir = TempDir::new().unwrap();
        let guard = TempConfigGuard::new(dir.path().join("never-written.yaml"));
        assert!(matches!(guard.cleanup().await, CleanupOutcome::NothingToRemove));
    }

    #[tokio::test]
    async fn test_cleanup_removes_stale_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp.yaml");
        std::fs::write(&path, "left over from a crashed run").unwrap();

        let guard = TempConfigGuard::new(&path);
        assert!(matches!(guard.cleanup().await, CleanupOutcome::Removed));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp.yaml");
        {
            let guard = TempConfigGuard::new(&path);
            guard.write("secret").await.unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("temp.yaml");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let guard = TempConfigGuard::new(&path);
        guard.write("secret").await.unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        guard.cleanup().await;
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let guard = TempConfigGuard::new(dir.path().join("missing").join("temp.yaml"));
        assert!(matches!(guard.write("x").await, Err(KeyrunError::TempWrite { .. })));
        assert!(matches!(guard.cleanup().await, CleanupOutcome::NothingToRemove));
    }
}
