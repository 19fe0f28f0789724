//! Fetch Error Types

use derive_more::{Display, Error};

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed from the given options
    #[display("invalid HTTP client configuration")]
    Client,
    /// Not an absolute http(s) URL
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Connection, TLS, timeout or body read failure
    #[display("request to {_0} failed")]
    Transport(#[error(not(source))] String),
    /// Server answered with a non-2xx status
    #[display("request to {url} returned HTTP {status}")]
    Status {
        #[error(not(source))]
        url: String,
        status: u16,
    },
    /// Response body exceeded the configured limit
    #[display("response from {url} exceeds {limit} bytes")]
    BodyTooLarge {
        #[error(not(source))]
        url: String,
        limit: u64,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Client | Self::InvalidUrl(_) | Self::BodyTooLarge { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Transport("http://a".into()).is_retryable());
        assert!(ErrorKind::Status { url: "http://a".into(), status: 503 }.is_retryable());
        assert!(ErrorKind::Status { url: "http://a".into(), status: 429 }.is_retryable());
        assert!(!ErrorKind::Status { url: "http://a".into(), status: 404 }.is_retryable());
        assert!(!ErrorKind::InvalidUrl("ftp://a".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = ErrorKind::Status { url: "http://example.com/a.png".into(), status: 404 };
        assert_eq!(err.to_string(), "request to http://example.com/a.png returned HTTP 404");
    }
}
