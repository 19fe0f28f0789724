//! Story pages and the media references inside their markup.
//!
//! Scanning goes through a real HTML parser ([`scan`]); edits go through a
//! byte-level tag lexer ([`rewrite`], [`expand`]) so that markup the author
//! wrote is never reformatted.

mod consts;
pub mod error;
mod lexer;
pub mod models;
mod reference;
mod rewrite;
mod scan;

pub use crate::consts::{IMAGE_ID_ATTR, MEDIA_ID_ATTR};
pub use crate::reference::{Reference, ReferenceKind, is_importable_url};
pub use crate::rewrite::{Expansion, Expansions, Resolutions, expand, rewrite};
pub use crate::scan::scan;
