//! `reqwest`-backed fetcher.

use crate::error::{ErrorKind, Result};
use crate::{Fetcher, Response};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::instrument;

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client settings, normally filled from the `fetch` config section.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Whole-request timeout, connection through to the last body byte
    pub timeout: Duration,
    pub user_agent: String,
    /// Bodies larger than this are rejected instead of buffered
    pub max_body_bytes: u64,
}
impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    max_body_bytes: u64,
}
impl HttpFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client, max_body_bytes: options.max_body_bytes })
    }

    fn parse_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url).or_raise(|| ErrorKind::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            exn::bail!(ErrorKind::InvalidUrl(url.to_string()));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self), err(Display))]
    async fn get(&self, url: &str) -> Result<Response> {
        let parsed = Self::parse_url(url)?;
        let mut response =
            self.client.get(parsed).send().await.or_raise(|| ErrorKind::Transport(url.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status { url: url.to_string(), status: status.as_u16() });
        }
        let too_large = || ErrorKind::BodyTooLarge { url: url.to_string(), limit: self.max_body_bytes };
        if response.content_length().is_some_and(|length| length > self.max_body_bytes) {
            exn::bail!(too_large());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.or_raise(|| ErrorKind::Transport(url.to_string()))? {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                exn::bail!(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        tracing::debug!(status = status.as_u16(), bytes = body.len(), content_type = content_type.as_deref(), "Fetched");

        Ok(Response { url: url.to_string(), status: status.as_u16(), content_type, body })
    }
}
