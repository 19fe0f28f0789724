//! Media references found in page markup.

use crate::models::{ImageId, MediaId};

/// What kind of reference an element makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "kebab-case"))]
pub enum ReferenceKind {
    ImageUrl,
    ImageId,
    VideoSourceUrl,
    VideoId,
}
impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::ImageUrl => "image-url",
            ReferenceKind::ImageId => "image-id",
            ReferenceKind::VideoSourceUrl => "video-source-url",
            ReferenceKind::VideoId => "video-id",
        }
    }
}

/// A single media reference in a page fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(tag = "kind", rename_all = "kebab-case"))]
pub enum Reference {
    /// `<amp-img src="…">`
    ImageUrl { url: String, alt: Option<String> },
    /// `<amp-img data-wagtail-image-id="…">`
    ImageId { id: ImageId },
    /// `<source src="…">` inside an `<amp-video>`, or a bare `<amp-video src="…">`.
    ///
    /// Poster and dimensions are taken from the `<amp-video>` element.
    VideoSourceUrl { url: String, poster: Option<String>, width: Option<u32>, height: Option<u32> },
    /// `<source data-wagtail-media-id="…">` or `<amp-video data-wagtail-media-id="…">`
    VideoId { id: MediaId },
}

impl Reference {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            Reference::ImageUrl { .. } => ReferenceKind::ImageUrl,
            Reference::ImageId { .. } => ReferenceKind::ImageId,
            Reference::VideoSourceUrl { .. } => ReferenceKind::VideoSourceUrl,
            Reference::VideoId { .. } => ReferenceKind::VideoId,
        }
    }

    /// Whether this reference points at remote media that still needs importing.
    pub fn is_importable(&self) -> bool {
        matches!(self, Reference::ImageUrl { .. } | Reference::VideoSourceUrl { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Reference::ImageUrl { url, .. } | Reference::VideoSourceUrl { url, .. } => Some(url),
            Reference::ImageId { .. } | Reference::VideoId { .. } => None,
        }
    }
}

/// Whether `url` is an absolute `http(s)` URL with a host.
///
/// ```
/// use ampstory_content::is_importable_url;
/// assert!(is_importable_url("https://example.com/pied-wagtail.jpg"));
/// assert!(is_importable_url("HTTP://example.com/a.png"));
/// assert!(!is_importable_url("data:image/png;base64,AAAA"));
/// assert!(!is_importable_url("/media/images/a.png"));
/// assert!(!is_importable_url("//example.com/a.png"));
/// assert!(!is_importable_url("https:///a.png"));
/// ```
pub fn is_importable_url(url: &str) -> bool {
    let lowered = url.trim().to_ascii_lowercase();
    let rest = match lowered.strip_prefix("https://").or_else(|| lowered.strip_prefix("http://")) {
        Some(rest) => rest,
        None => return false,
    };
    rest.chars().next().is_some_and(|c| !matches!(c, '/' | '?' | '#') && !c.is_whitespace())
}
