//! File storage for imported assets.
//!
//! Original images, renditions, media files and thumbnails all end up in a
//! [`StorageBackend`]. Paths are always relative to the backend root and are
//! validated before use; the public URL of a stored file is the configured
//! media URL joined with that relative path.

pub mod backend;
pub mod error;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::path::{suffixed as suffixed_path, validate as validate_path};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
