//! Local filesystem storage backend.
//!
//! Files live under a configured media root (`MEDIA_ROOT` in a typical
//! deployment) and are accessed via `tokio::fs`.

use crate::error::ErrorKind;
use crate::{StorageBackend, error::Result, path::validate as validate_path};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage backend.
///
/// Stores files in a directory on the local filesystem. All paths are
/// relative to the configured root directory, which the web server is
/// expected to serve under the media URL.
///
/// # Examples
///
/// ```no_run
/// use ampstory_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("media", "/srv/ampstory/media")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory for stored media
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Arguments
    /// * `name` - Name used when logging about this backend
    /// * `root` - Absolute path to the media root, created if missing
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute or names something other than a directory, and an I/O error
    /// if the directory cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ampstory_storage::backend::LocalBackend;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let backend = LocalBackend::new("media", "/var/www/media")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Only happens once at startup, not worth an async constructor.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    /// Get the absolute path for a relative storage path.
    ///
    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    async fn ensure_parent(&self, abs_path: &Path, path: &Path) -> Result<()> {
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        self.ensure_parent(&abs_path, path).await?;
        // O_CREAT|O_EXCL: the filesystem decides who wins a race for the name.
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&abs_path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => exn::bail!(Self::map_io_error(e, path)),
        };
        file.write_all(data).await.map_err(|e| Self::map_io_error(e, path))?;
        file.flush().await.map_err(|e| Self::map_io_error(e, path))?;
        Ok(true)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}
