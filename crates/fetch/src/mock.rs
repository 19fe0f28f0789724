//! Canned-response fetcher for testing.

use crate::error::{ErrorKind, Result};
use crate::{Fetcher, Response};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

enum Route {
    Body { content_type: Option<String>, body: Vec<u8> },
    Status(u16),
}

/// Fetcher that answers from a fixed table of URLs and records every request.
///
/// Any URL without a route fails with a transport error, the same way an
/// unreachable host would.
///
/// ```
/// use ampstory_fetch::{Fetcher, MockFetcher};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = MockFetcher::default()
///     .with_body("https://example.com/logo.png", "image/png", b"png bytes")
///     .with_status("https://example.com/gone.png", 404);
/// assert_eq!(fetcher.get("https://example.com/logo.png").await.unwrap().body, b"png bytes");
/// assert!(fetcher.get("https://example.com/gone.png").await.is_err());
/// assert_eq!(fetcher.request_count("https://example.com/logo.png").await, 1);
/// # }
/// ```
#[derive(Default)]
pub struct MockFetcher {
    routes: RwLock<HashMap<String, Route>>,
    requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn with_body(mut self, url: impl Into<String>, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        let route = Route::Body { content_type: Some(content_type.to_string()), body: body.into() };
        self.routes.get_mut().insert(url.into(), route);
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.routes.get_mut().insert(url.into(), Route::Status(status));
        self
    }

    /// Wait this long before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add or replace a route after construction.
    pub async fn set_body(&self, url: impl Into<String>, content_type: &str, body: impl Into<Vec<u8>>) {
        let route = Route::Body { content_type: Some(content_type.to_string()), body: body.into() };
        self.routes.write().await.insert(url.into(), route);
    }

    /// Every requested URL, in request order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self, url: &str) -> usize {
        self.requests.lock().await.iter().filter(|requested| *requested == url).count()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<Response> {
        self.requests.lock().await.push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.routes.read().await.get(url) {
            Some(Route::Body { content_type, body }) => Ok(Response {
                url: url.to_string(),
                status: 200,
                content_type: content_type.clone(),
                body: body.clone(),
            }),
            Some(Route::Status(status)) if (200..300).contains(status) => {
                Ok(Response { url: url.to_string(), status: *status, content_type: None, body: Vec::new() })
            },
            Some(Route::Status(status)) => exn::bail!(ErrorKind::Status { url: url.to_string(), status: *status }),
            None => exn::bail!(ErrorKind::Transport(url.to_string())),
        }
    }
}
