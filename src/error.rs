//! Command Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    /// Storage, catalog or HTTP client could not be set up.
    #[display("could not start: {_0}")]
    Setup(#[error(not(source))] &'static str),
    #[display("could not read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    #[display("could not parse story file {}", _0.display())]
    StoryFile(#[error(not(source))] PathBuf),
    #[display("story is not valid")]
    InvalidStory,
    #[display("no story with slug {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("catalog error")]
    Catalog,
    #[display("import failed")]
    Import,
    #[display("render failed")]
    Render,
    #[display("could not write output")]
    Output,
}
