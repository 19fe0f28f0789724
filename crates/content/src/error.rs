//! Content Error Types

use derive_more::{Display, Error};

/// A content error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Scanning and rewriting never fail on bad markup, so these only cover values
/// supplied by callers.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A rendition filter spec could not be parsed.
    #[display("invalid filter spec: {_0}")]
    InvalidFilterSpec(#[error(not(source))] String),
    /// A story page is missing something it cannot do without.
    #[display("invalid story page: {_0}")]
    InvalidStory(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
