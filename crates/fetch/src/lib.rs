//! Fetching remote media.
//!
//! The import pipeline only ever needs a plain `GET` that hands back the
//! status, the content type and the whole body. [`Fetcher`] is that seam:
//! [`HttpFetcher`] does it over the network with `reqwest`, and the
//! `MockFetcher` (feature `mock`) serves canned responses in tests.

pub mod error;
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use crate::http::{FetchOptions, HttpFetcher};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockFetcher;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// URL that was requested
    pub url: String,
    pub status: u16,
    /// `Content-Type` header, if the server sent a readable one
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` with a `GET` request.
    ///
    /// Transport failures and non-2xx responses are both errors, so a
    /// returned [`Response`] always carries a usable body.
    async fn get(&self, url: &str) -> Result<Response>;
}

pub type FetcherHandle = Arc<dyn Fetcher>;

/// The last non-empty path segment of a URL, ignoring query and fragment.
///
/// ```
/// use ampstory_fetch::file_name;
/// assert_eq!(file_name("https://example.com/a/wagtail.jpg?w=10").as_deref(), Some("wagtail.jpg"));
/// assert_eq!(file_name("https://example.com/"), None);
/// assert_eq!(file_name("not a url"), None);
/// ```
pub fn file_name(url: &str) -> Option<String> {
    let url = reqwest::Url::parse(url).ok()?;
    let segment = url.path_segments()?.filter(|segment| !segment.is_empty()).next_back()?;
    Some(segment.to_string())
}
