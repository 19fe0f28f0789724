use crate::error::{ErrorKind, Result};
use crate::locks::KeyedLocks;
use ampstory_catalog::Repository;
use ampstory_fetch::{FetcherHandle, Response};
use ampstory_storage::BackendHandle;
use exn::ResultExt;
use std::path::{Component, Path};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

/// Everything an import or render needs: where files go, where rows go, how
/// remote media is fetched and the public URL stored files are served from.
///
/// Cheap to clone; clones share the per-URL import locks.
#[derive(Clone)]
pub struct Context {
    backend: BackendHandle,
    catalog: Repository,
    fetcher: FetcherHandle,
    media_url: String,
    locks: Arc<KeyedLocks>,
}
impl Context {
    /// `media_url` is the public prefix of the storage root, e.g.
    /// `https://media.example.com/media/`. A trailing slash is added if missing.
    pub fn new(backend: BackendHandle, catalog: Repository, fetcher: FetcherHandle, media_url: impl Into<String>) -> Self {
        let mut media_url = media_url.into();
        if !media_url.ends_with('/') {
            media_url.push('/');
        }
        Self { backend, catalog, fetcher, media_url, locks: Arc::default() }
    }

    /// Storage that originals, renditions, media files and thumbnails are
    /// written to.
    pub fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    /// The catalog rows for imported assets and saved stories.
    pub fn catalog(&self) -> &Repository {
        &self.catalog
    }

    /// Always ends with `/`.
    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    /// Public URL of a stored file.
    ///
    /// Only the normal components of `path` are used, so `./media/clip.mp4`
    /// and `media/clip.mp4` give the same URL.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ampstory_library::Context;
    /// # use std::path::Path;
    /// # fn example(ctx: &Context) {
    /// let url = ctx.url(Path::new("images/wagtail.fill-96x96.png"));
    /// assert!(url.ends_with("/images/wagtail.fill-96x96.png"));
    /// # }
    /// ```
    pub fn url(&self, path: &Path) -> String {
        let segments = path.components().filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        });
        let mut url = self.media_url.clone();
        for (i, segment) in segments.enumerate() {
            if i > 0 {
                url.push('/');
            }
            url.push_str(&segment);
        }
        url
    }

    pub(crate) async fn lock(&self, url: &str) -> OwnedMutexGuard<()> {
        self.locks.lock(url).await
    }

    pub(crate) async fn fetch(&self, url: &str) -> Result<Response> {
        self.fetcher.get(url).await.or_raise(|| ErrorKind::Fetch(url.to_string()))
    }

    pub(crate) async fn store(&self, path: &Path, data: &[u8]) -> Result<std::path::PathBuf> {
        self.backend.create(path, data).await.or_raise(|| ErrorKind::Storage)
    }

    pub(crate) async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.backend.read(path).await.or_raise(|| ErrorKind::Storage)
    }

    /// Remove a file nobody will reference. Failure only leaves an orphan behind.
    pub(crate) async fn discard(&self, path: &Path) {
        if let Err(err) = self.backend.delete(path).await {
            tracing::warn!(path = %path.display(), error = %err, "Could not delete unused file");
        }
    }
}
