//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. The backend can
/// also be switched into an "unavailable" mode where every operation fails,
/// to exercise storage outages.
///
/// # Examples
///
/// ```
/// use ampstory_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("original_images/logo.png", b"\x89PNG..."),
/// ]);
/// assert_eq!(backend.read(Path::new("original_images/logo.png")).await?, b"\x89PNG...");
///
/// let stored = backend.create(Path::new("original_images/logo.png"), b"other").await?;
/// assert_eq!(stored, Path::new("original_images/logo_2.png"));
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<PathBuf, Vec<u8>>>,
    unavailable: AtomicBool,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every stored path, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.storage.read().await.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::BackendError(format!("{} is unavailable", self.name)));
        }
        Ok(())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.check_available()?;
        let path = validate_path(path)?;
        self.storage.read().await.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn write_new(&self, path: &Path, data: &[u8]) -> Result<bool> {
        self.check_available()?;
        let path = validate_path(path)?;
        let mut guard = self.storage.write().await;
        if guard.contains_key(&path) {
            return Ok(false);
        }
        guard.insert(path, data.to_vec());
        Ok(true)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        self.check_available()?;
        let path = validate_path(path)?;
        self.storage.write().await.remove(&path).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }
}
