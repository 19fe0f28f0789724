//! SQLite catalog of imported images, renditions, media and stories.
//!
//! The catalog is the record of which remote URLs have already been imported
//! and where their files live in storage. Unique constraints on source URLs
//! and on `(image, filter spec)` make concurrent imports converge on a single
//! row; see [`Inserted`].

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{Inserted, NewImage, NewMedia, NewRendition};
pub use crate::repo::Repository;
