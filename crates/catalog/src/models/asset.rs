use super::{path_to_text, text_to_path, to_timestamp, to_u32};
use crate::error::{Error, ErrorKind, Result};
use ampstory_content::models::{FilterSpec, Image, ImageId, Media, MediaId, MediaKind, Rendition};
use exn::{OptionExt, ResultExt};
use std::path::PathBuf;
use time::UtcDateTime;

/// Outcome of an insert that is skipped when the row's identity already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted<T> {
    /// This call wrote the row.
    Created(T),
    /// Another writer got there first; this is their row.
    Existing(T),
}
impl<T> Inserted<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Inserted::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Inserted::Created(value) | Inserted::Existing(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Inserted::Created(value) | Inserted::Existing(value) => value,
        }
    }
}

/// An image that has been written to storage but not yet catalogued.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub title: String,
    pub file: PathBuf,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    pub file_hash: String,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub title: String,
    pub kind: MediaKind,
    pub file: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: u32,
    pub thumbnail: Option<PathBuf>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRendition {
    pub image_id: ImageId,
    pub filter_spec: FilterSpec,
    pub file: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ImageRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) file: String,
    pub(crate) width: i64,
    pub(crate) height: i64,
    pub(crate) file_size: i64,
    pub(crate) file_hash: String,
    pub(crate) source_url: Option<String>,
    pub(crate) created_at: i64,
}
impl ImageRow {
    pub(crate) fn new(image: &NewImage, created_at: UtcDateTime) -> Result<Self> {
        Ok(Self {
            id: 0,
            title: image.title.clone(),
            file: path_to_text(&image.file, "image file")?,
            width: i64::from(image.width),
            height: i64::from(image.height),
            file_size: i64::try_from(image.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            file_hash: image.file_hash.clone(),
            source_url: image.source_url.clone(),
            created_at: created_at.unix_timestamp(),
        })
    }
}
impl TryFrom<ImageRow> for Image {
    type Error = Error;
    fn try_from(row: ImageRow) -> Result<Self> {
        Ok(Self {
            id: ImageId(row.id),
            title: row.title,
            file: text_to_path(row.file),
            width: to_u32(row.width, "image width")?,
            height: to_u32(row.height, "image height")?,
            file_size: u64::try_from(row.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            file_hash: row.file_hash,
            source_url: row.source_url,
            created_at: to_timestamp(row.created_at, "image creation date")?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RenditionRow {
    pub(crate) image_id: i64,
    pub(crate) filter_spec: String,
    pub(crate) file: String,
    pub(crate) width: i64,
    pub(crate) height: i64,
}
impl TryFrom<&NewRendition> for RenditionRow {
    type Error = Error;
    fn try_from(rendition: &NewRendition) -> Result<Self> {
        Ok(Self {
            image_id: rendition.image_id.0,
            filter_spec: rendition.filter_spec.to_string(),
            file: path_to_text(&rendition.file, "rendition file")?,
            width: i64::from(rendition.width),
            height: i64::from(rendition.height),
        })
    }
}
impl TryFrom<RenditionRow> for Rendition {
    type Error = Error;
    fn try_from(row: RenditionRow) -> Result<Self> {
        Ok(Self {
            image_id: ImageId(row.image_id),
            filter_spec: row.filter_spec.parse::<FilterSpec>().or_raise(|| ErrorKind::InvalidData("filter spec"))?,
            file: text_to_path(row.file),
            width: to_u32(row.width, "rendition width")?,
            height: to_u32(row.height, "rendition height")?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct MediaRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) kind: String,
    pub(crate) file: String,
    pub(crate) width: Option<i64>,
    pub(crate) height: Option<i64>,
    pub(crate) duration: i64,
    pub(crate) thumbnail: Option<String>,
    pub(crate) source_url: Option<String>,
    pub(crate) created_at: i64,
}
impl MediaRow {
    pub(crate) fn new(media: &NewMedia, created_at: UtcDateTime) -> Result<Self> {
        Ok(Self {
            id: 0,
            title: media.title.clone(),
            kind: media.kind.as_str().to_string(),
            file: path_to_text(&media.file, "media file")?,
            width: media.width.map(i64::from),
            height: media.height.map(i64::from),
            duration: i64::from(media.duration),
            thumbnail: media.thumbnail.as_deref().map(|path| path_to_text(path, "thumbnail")).transpose()?,
            source_url: media.source_url.clone(),
            created_at: created_at.unix_timestamp(),
        })
    }
}
impl TryFrom<MediaRow> for Media {
    type Error = Error;
    fn try_from(row: MediaRow) -> Result<Self> {
        Ok(Self {
            id: MediaId(row.id),
            title: row.title,
            kind: MediaKind::from_name(&row.kind).ok_or_raise(|| ErrorKind::InvalidData("media kind"))?,
            file: text_to_path(row.file),
            width: row.width.map(|w| to_u32(w, "media width")).transpose()?,
            height: row.height.map(|h| to_u32(h, "media height")).transpose()?,
            duration: to_u32(row.duration, "duration")?,
            thumbnail: row.thumbnail.map(text_to_path),
            source_url: row.source_url,
            created_at: to_timestamp(row.created_at, "media creation date")?,
        })
    }
}
