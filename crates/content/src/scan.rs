//! Finding media references in page fragments.

use crate::consts::{AMP_IMG, AMP_VIDEO, IMAGE_ID_ATTR, MEDIA_ID_ATTR, REFERENCE_SELECTOR, SOURCE, SOURCE_SELECTOR};
use crate::reference::{Reference, is_importable_url};
use scraper::{ElementRef, Html};
use tracing::instrument;

/// Scan one page fragment for media references, in document order.
///
/// Never fails: elements whose attributes are missing or unusable are logged
/// and skipped. Elements carrying an internal ID marker are reported as ID
/// references and never as importable URLs, even if they also have a `src`.
///
/// ```
/// use ampstory_content::{Reference, scan};
/// let refs = scan(r#"<amp-img src="https://example.com/a.jpg" alt="A"></amp-img>"#);
/// assert_eq!(refs, vec![Reference::ImageUrl { url: "https://example.com/a.jpg".into(), alt: Some("A".into()) }]);
/// ```
#[instrument(skip(html), fields(html_size = html.len()))]
pub fn scan(html: &str) -> Vec<Reference> {
    let fragment = Html::parse_fragment(html);
    let mut references = Vec::new();
    for element in fragment.select(&REFERENCE_SELECTOR) {
        let reference = match element.value().name() {
            AMP_IMG => image_reference(element),
            AMP_VIDEO => video_reference(element),
            SOURCE => enclosing_video(element).and_then(|video| source_reference(element, video)),
            _ => None,
        };
        references.extend(reference);
    }
    tracing::trace!(references = references.len(), "Scanned fragment");
    references
}

fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).map(str::trim)
}

fn malformed(element: ElementRef<'_>, reason: &'static str) -> Option<Reference> {
    tracing::debug!(element = element.value().name(), reason, "Skipping malformed media reference");
    None
}

fn image_reference(element: ElementRef<'_>) -> Option<Reference> {
    if let Some(id) = attr(element, IMAGE_ID_ATTR) {
        return match id.parse() {
            Ok(id) => Some(Reference::ImageId { id }),
            Err(_) => malformed(element, "image ID is not a number"),
        };
    }
    let url = attr(element, "src")?;
    if !is_importable_url(url) {
        return malformed(element, "src is not an absolute http(s) URL");
    }
    let alt = attr(element, "alt").filter(|alt| !alt.is_empty()).map(str::to_string);
    Some(Reference::ImageUrl { url: url.to_string(), alt })
}

fn video_reference(video: ElementRef<'_>) -> Option<Reference> {
    if let Some(id) = attr(video, MEDIA_ID_ATTR) {
        return match id.parse() {
            Ok(id) => Some(Reference::VideoId { id }),
            Err(_) => malformed(video, "media ID is not a number"),
        };
    }
    // With <source> children the element's own src is only a fallback.
    if video.select(&SOURCE_SELECTOR).next().is_some() {
        return None;
    }
    let url = attr(video, "src")?;
    video_source(video, url, video)
}

fn source_reference(source: ElementRef<'_>, video: ElementRef<'_>) -> Option<Reference> {
    if let Some(id) = attr(source, MEDIA_ID_ATTR) {
        return match id.parse() {
            Ok(id) => Some(Reference::VideoId { id }),
            Err(_) => malformed(source, "media ID is not a number"),
        };
    }
    let url = attr(source, "src")?;
    video_source(source, url, video)
}

fn video_source(element: ElementRef<'_>, url: &str, video: ElementRef<'_>) -> Option<Reference> {
    if !is_importable_url(url) {
        return malformed(element, "src is not an absolute http(s) URL");
    }
    let poster = attr(video, "poster").filter(|poster| is_importable_url(poster)).map(str::to_string);
    let dimension = |name| attr(video, name).and_then(|value| value.parse::<u32>().ok());
    Some(Reference::VideoSourceUrl { url: url.to_string(), poster, width: dimension("width"), height: dimension("height") })
}

fn enclosing_video(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.ancestors().filter_map(ElementRef::wrap).find(|ancestor| ancestor.value().name() == AMP_VIDEO)
}
