//! Storage backend trait and implementations.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
use crate::error::{ErrorKind, Result};
use crate::path::{suffixed, validate as validate_path};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// How many alternative names [`StorageBackend::create`] tries before giving up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Unified interface for storage backends.
///
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// should enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ampstory_storage::{backend::StorageBackend, error::Result};
///
/// async fn store_thumbnail(backend: &dyn StorageBackend, data: &[u8]) -> Result<String> {
///     let stored = backend.create(Path::new("media_thumbnails/poster.png"), data).await?;
///     Ok(stored.display().to_string())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write a file only if nothing exists at `path` yet, creating parent
    /// directories as needed.
    ///
    /// The check and the write must be a single atomic step for the backend,
    /// so that two writers racing for the same name cannot both succeed.
    /// Returns `false` (and writes nothing) if the path is taken.
    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<bool>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Store a new file without ever overwriting an existing one.
    ///
    /// If `path` is taken, a numeric suffix is added to the file stem
    /// (`clip.mp4`, `clip_2.mp4`, `clip_3.mp4`, ...) until a free name is
    /// found. Returns the path the data was actually written to.
    async fn create(&self, path: &Path, data: &[u8]) -> Result<PathBuf> {
        let path = validate_path(path)?;
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let candidate = suffixed(&path, attempt);
            if self.write_new(&candidate, data).await? {
                if attempt > 1 {
                    tracing::debug!(backend = self.name(), requested = %path.display(), stored = %candidate.display(), "File name taken; stored under alternative name");
                }
                return Ok(candidate);
            }
        }
        exn::bail!(ErrorKind::AlreadyExists(path));
    }
}
