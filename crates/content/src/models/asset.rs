use super::{FilterSpec, ImageId, MediaId};
use std::path::{Path, PathBuf};
use time::UtcDateTime;

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

/// An image asset.
///
/// Imported images remember the URL they were fetched from; that URL is the
/// identity used for deduplication. Uploaded images have no source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: ImageId,
    pub title: String,
    /// Path of the original file, relative to the media root
    pub file: PathBuf,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    /// BLAKE3 hash of the original file
    pub file_hash: String,
    pub source_url: Option<String>,
    pub created_at: UtcDateTime,
}
impl Image {
    pub fn filename(&self) -> Option<&str> {
        file_name(&self.file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}
impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

/// A video (or audio) asset, optionally with a thumbnail image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub id: MediaId,
    pub title: String,
    pub kind: MediaKind,
    /// Path of the media file, relative to the media root
    pub file: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Duration in seconds; imports do not probe files, so this is `0` for them
    pub duration: u32,
    pub thumbnail: Option<PathBuf>,
    pub source_url: Option<String>,
    pub created_at: UtcDateTime,
}
impl Media {
    pub fn filename(&self) -> Option<&str> {
        file_name(&self.file)
    }

    pub fn thumbnail_filename(&self) -> Option<&str> {
        self.thumbnail.as_deref().and_then(file_name)
    }
}

/// A stored derivative of an [`Image`] for one filter spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub image_id: ImageId,
    pub filter_spec: FilterSpec,
    /// Path of the rendition file, relative to the media root
    pub file: PathBuf,
    pub width: u32,
    pub height: u32,
}
