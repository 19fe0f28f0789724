//! Where stored files live, relative to the storage root.
//!
//! ```text
//! original_images/<name>.<ext>        original image bytes
//! images/<name>.<filter-spec>.<ext>   renditions
//! media/<name>.<ext>                  video and audio files
//! media_thumbnails/<name>.<ext>       video posters
//! ```
//!
//! Collisions are not resolved here; the storage backend appends `_2`, `_3`…
//! when it creates the file.

use ampstory_content::models::FilterSpec;
use std::path::{Path, PathBuf};

const ORIGINAL_IMAGES: &str = "original_images";
const RENDITIONS: &str = "images";
const MEDIA: &str = "media";
const THUMBNAILS: &str = "media_thumbnails";
const MAX_STEM_LEN: usize = 60;

pub(crate) fn original_image(name: &str) -> PathBuf {
    Path::new(ORIGINAL_IMAGES).join(name)
}

/// `images/<stem of original>.<spec>.<ext>`
pub(crate) fn rendition(original: &Path, spec: FilterSpec, ext: &str) -> PathBuf {
    let stem = original.file_stem().and_then(|stem| stem.to_str()).unwrap_or("image");
    Path::new(RENDITIONS).join(format!("{stem}.{spec}.{ext}"))
}

pub(crate) fn media(name: &str) -> PathBuf {
    Path::new(MEDIA).join(name)
}

pub(crate) fn thumbnail(name: &str) -> PathBuf {
    Path::new(THUMBNAILS).join(name)
}

/// Lowercase extension of a stored path, if it has one.
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase)
}

/// A file name that is safe to store, built from an untrusted one.
///
/// Anything other than ASCII letters, digits, `-`, `_` and `.` becomes `_`,
/// leading dots are dropped and over-long stems are shortened. `fallback`
/// is used when nothing usable is left. A missing extension is filled in
/// from `default_ext`.
pub(crate) fn sanitize(name: Option<&str>, fallback: &str, default_ext: Option<&str>) -> String {
    let cleaned: String = name
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let (stem, ext) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_extension(ext) => (stem, Some(ext)),
        _ => (cleaned.trim_end_matches('.'), None),
    };
    let stem = if stem.is_empty() { fallback } else { &stem[..stem.len().min(MAX_STEM_LEN)] };
    match ext.or(default_ext) {
        Some(ext) => format!("{stem}.{}", ext.to_ascii_lowercase()),
        None => stem.to_string(),
    }
}

fn is_extension(ext: &str) -> bool {
    (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Usual file extension for a `Content-Type`, for URLs that do not name one.
pub(crate) fn extension_for(content_type: Option<&str>) -> Option<&'static str> {
    let essence = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    Some(match essence.as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/ogg" => "ogv",
        "video/quicktime" => "mov",
        _ => return None,
    })
}
