//! Library Error Types

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A remote URL could not be fetched.
    #[display("could not fetch {_0}")]
    Fetch(#[error(not(source))] String),
    /// A body that should have been an image could not be decoded.
    #[display("not a usable image: {_0}")]
    InvalidImage(#[error(not(source))] String),
    /// Reading or writing stored files failed.
    #[display("storage error")]
    Storage,
    /// Reading or writing the catalog failed.
    #[display("catalog error")]
    Catalog,
    /// A rendition could not be derived from its original.
    #[display("could not derive rendition {_0}")]
    Rendition(#[error(not(source))] String),
    #[display("issue rendering story template")]
    Template,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Fetch(_) | ErrorKind::Storage | ErrorKind::Catalog)
    }

    /// Failures confined to a single reference: the import pass records them
    /// and moves on to the next reference.
    pub fn is_reference_failure(&self) -> bool {
        matches!(self, ErrorKind::Fetch(_) | ErrorKind::InvalidImage(_))
    }
}
