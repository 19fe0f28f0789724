mod asset;
mod story;

pub(crate) use self::asset::{ImageRow, MediaRow, RenditionRow};
pub(crate) use self::story::StoryRow;
pub use self::asset::{Inserted, NewImage, NewMedia, NewRendition};

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};
use time::UtcDateTime;

pub(crate) fn path_to_text(path: &Path, what: &'static str) -> Result<String> {
    Ok(path.to_str().ok_or_raise(|| ErrorKind::InvalidData(what))?.to_string())
}

pub(crate) fn text_to_path(text: String) -> PathBuf {
    PathBuf::from(text)
}

pub(crate) fn to_u32(value: i64, what: &'static str) -> Result<u32> {
    u32::try_from(value).or_raise(|| ErrorKind::InvalidData(what))
}

pub(crate) fn to_timestamp(value: i64, what: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(value).or_raise(|| ErrorKind::InvalidData(what))
}
