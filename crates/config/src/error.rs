//! Config Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested config file does not exist
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Config file extension is not one of toml, yaml, yml or json
    #[display("unsupported config format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// Sources could not be merged into a config (syntax or type errors)
    #[display("could not read configuration")]
    Parse,
    /// Config parsed but a value is unusable
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
