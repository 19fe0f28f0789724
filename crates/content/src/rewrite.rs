//! In-place edits of page fragment markup.
//!
//! Both directions work on exact byte spans from the lexer, so everything
//! other than the edited attribute comes out byte-for-byte as it went in.

use crate::consts::{AMP_IMG, AMP_VIDEO, IMAGE_ID_ATTR, MEDIA_ID_ATTR, SOURCE};
use crate::lexer::{Tag, escape_attribute, tags};
use crate::models::{ImageId, MediaId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;
use tracing::instrument;

/// Imported assets for remote URLs, keyed by the URL as written in `src`.
///
/// A URL that failed to import is simply absent, which leaves every element
/// referencing it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolutions {
    images: HashMap<String, ImageId>,
    media: HashMap<String, MediaId>,
}
impl Resolutions {
    pub fn insert_image(&mut self, url: impl Into<String>, id: ImageId) {
        self.images.insert(url.into(), id);
    }

    pub fn insert_media(&mut self, url: impl Into<String>, id: MediaId) {
        self.media.insert(url.into(), id);
    }

    pub fn image(&self, url: &str) -> Option<ImageId> {
        self.images.get(url).copied()
    }

    pub fn media(&self, url: &str) -> Option<MediaId> {
        self.media.get(url).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.media.is_empty()
    }
}

/// How an internal reference is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub src: String,
    /// Added as `width`/`height` attributes when the element has none
    pub width: Option<u32>,
    pub height: Option<u32>,
}
impl Expansion {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into(), width: None, height: None }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Served form of every internal ID found in a fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansions {
    images: HashMap<ImageId, Expansion>,
    media: HashMap<MediaId, Expansion>,
}
impl Expansions {
    pub fn insert_image(&mut self, id: ImageId, expansion: Expansion) {
        self.images.insert(id, expansion);
    }

    pub fn insert_media(&mut self, id: MediaId, expansion: Expansion) {
        self.media.insert(id, expansion);
    }
}

struct Edit {
    span: Range<usize>,
    replacement: String,
}

fn apply(html: &str, edits: Vec<Edit>) -> Cow<'_, str> {
    if edits.is_empty() {
        return Cow::Borrowed(html);
    }
    let mut output = String::with_capacity(html.len() + edits.len() * 16);
    let mut position = 0;
    for edit in edits {
        output.push_str(&html[position..edit.span.start]);
        output.push_str(&edit.replacement);
        position = edit.span.end;
    }
    output.push_str(&html[position..]);
    Cow::Owned(output)
}

/// Tracks whether the lexer is inside an `<amp-video>` element.
#[derive(Default)]
struct VideoDepth(usize);
impl VideoDepth {
    /// Update for `tag` and report which media-bearing element it is, if any.
    fn classify(&mut self, tag: &Tag<'_>) -> Option<&'static str> {
        match (tag.name.as_str(), tag.is_end) {
            (AMP_VIDEO, true) => {
                self.0 = self.0.saturating_sub(1);
                None
            },
            // Custom elements ignore a trailing `/`, so this always opens.
            (AMP_VIDEO, false) => {
                self.0 += 1;
                Some(AMP_VIDEO)
            },
            (AMP_IMG, false) => Some(AMP_IMG),
            (SOURCE, false) if self.0 > 0 => Some(SOURCE),
            _ => None,
        }
    }
}

/// Replace the `src` of every resolved remote reference with its internal ID
/// marker.
///
/// Elements that already carry a marker are left alone, so running this on
/// its own output changes nothing.
///
/// ```
/// use ampstory_content::models::ImageId;
/// use ampstory_content::{Resolutions, rewrite};
/// let mut resolutions = Resolutions::default();
/// resolutions.insert_image("https://example.com/a.jpg", ImageId(7));
/// let html = r#"<amp-img  src="https://example.com/a.jpg" alt="A"></amp-img>"#;
/// assert_eq!(rewrite(html, &resolutions), r#"<amp-img  data-wagtail-image-id="7" alt="A"></amp-img>"#);
/// ```
#[instrument(skip_all, fields(html_size = html.len()))]
pub fn rewrite<'h>(html: &'h str, resolutions: &Resolutions) -> Cow<'h, str> {
    if resolutions.is_empty() {
        return Cow::Borrowed(html);
    }
    let mut depth = VideoDepth::default();
    let mut edits = Vec::new();
    for tag in tags(html) {
        let (marker, id) = match depth.classify(&tag) {
            Some(AMP_IMG) if tag.attribute(IMAGE_ID_ATTR).is_none() => {
                let id = tag.attribute("src").and_then(|src| resolutions.image(&src.value()));
                (IMAGE_ID_ATTR, id.map(|id| id.0))
            },
            Some(AMP_VIDEO | SOURCE) if tag.attribute(MEDIA_ID_ATTR).is_none() => {
                let id = tag.attribute("src").and_then(|src| resolutions.media(&src.value()));
                (MEDIA_ID_ATTR, id.map(|id| id.0))
            },
            _ => continue,
        };
        if let (Some(id), Some(src)) = (id, tag.attribute("src")) {
            edits.push(Edit { span: src.span.clone(), replacement: format!(r#"{marker}="{id}""#) });
        }
    }
    tracing::debug!(rewritten = edits.len(), "Rewrote remote references");
    apply(html, edits)
}

/// Replace internal ID markers with served `src` URLs.
///
/// Image elements also gain `width`/`height` from the expansion unless they
/// declare their own. Markers without an expansion (the asset is gone, or the
/// ID was never valid) are left in place and logged.
#[instrument(skip_all, fields(html_size = html.len()))]
pub fn expand<'h>(html: &'h str, expansions: &Expansions) -> Cow<'h, str> {
    let mut depth = VideoDepth::default();
    let mut edits = Vec::new();
    for tag in tags(html) {
        let (marker, expansion) = match depth.classify(&tag) {
            Some(AMP_IMG) => match tag.attribute(IMAGE_ID_ATTR) {
                Some(attribute) => {
                    let id = attribute.value().parse::<ImageId>().ok();
                    (attribute, id.and_then(|id| expansions.images.get(&id)))
                },
                None => continue,
            },
            Some(AMP_VIDEO | SOURCE) => match tag.attribute(MEDIA_ID_ATTR) {
                Some(attribute) => {
                    let id = attribute.value().parse::<MediaId>().ok();
                    (attribute, id.and_then(|id| expansions.media.get(&id)))
                },
                None => continue,
            },
            _ => continue,
        };
        let Some(expansion) = expansion else {
            tracing::warn!(element = %tag.name, id = %marker.value(), "No asset for internal media reference");
            continue;
        };

        let src = format!(r#"src="{}""#, escape_attribute(&expansion.src));
        let mut extra = String::new();
        if tag.name == AMP_IMG {
            for (name, value) in [("width", expansion.width), ("height", expansion.height)] {
                if let Some(value) = value
                    && tag.attribute(name).is_none()
                {
                    extra.push_str(&format!(r#" {name}="{value}""#));
                }
            }
        }
        match tag.attribute("src") {
            // A stale src next to the marker is replaced, and the marker dropped.
            Some(stale) => {
                let mut pair = [
                    Edit { span: marker.span.clone(), replacement: String::new() },
                    Edit { span: stale.span.clone(), replacement: src + &extra },
                ];
                pair.sort_by_key(|edit| edit.span.start);
                edits.extend(pair);
            },
            None => edits.push(Edit { span: marker.span.clone(), replacement: src + &extra }),
        }
    }
    apply(html, edits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Reference, scan};
    use rstest::rstest;

    const PAGE_1: &str = r#"<amp-story-page id="page-1">
    <p>Today we went out wagtail spotting</p>
    <amp-img src="https://example.com/pied-wagtail.jpg" alt="A pied wagtail" layout="responsive">
    </amp-img>
    <amp-img data-wagtail-image-id="12" alt="A mountain wagtail"></amp-img>
    <amp-img src='https://example.com/broken.jpg' alt="Gone"></amp-img>
</amp-story-page>"#;

    const PAGE_2: &str = r#"<amp-video poster="https://example.com/wagtail-poster.png" width="600" height="800">
    <source data-wagtail-media-id="3" type="video/webm" />
    <source src="https://example.com/wagtail-in-flight.mp4" type="video/mp4" />
</amp-video>"#;

    fn image_resolutions() -> Resolutions {
        let mut resolutions = Resolutions::default();
        resolutions.insert_image("https://example.com/pied-wagtail.jpg", ImageId(5));
        resolutions
    }

    #[test]
    fn test_rewrite_replaces_only_resolved_src() {
        let rewritten = rewrite(PAGE_1, &image_resolutions());
        let expected = PAGE_1.replace(
            r#"src="https://example.com/pied-wagtail.jpg""#,
            r#"data-wagtail-image-id="5""#,
        );
        assert_eq!(rewritten, expected);
        // The failed reference is byte-identical.
        assert!(rewritten.contains(r#"<amp-img src='https://example.com/broken.jpg' alt="Gone"></amp-img>"#));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let resolutions = image_resolutions();
        let once = rewrite(PAGE_1, &resolutions).into_owned();
        let twice = rewrite(&once, &resolutions);
        assert!(matches!(twice, Cow::Borrowed(_)));
        assert_eq!(twice, once);
        let remaining: Vec<_> = scan(&once).into_iter().filter(|r| r.is_importable()).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url(), Some("https://example.com/broken.jpg"));
    }

    #[test]
    fn test_rewrite_video_source() {
        let mut resolutions = Resolutions::default();
        resolutions.insert_media("https://example.com/wagtail-in-flight.mp4", MediaId(9));
        let rewritten = rewrite(PAGE_2, &resolutions);
        assert!(rewritten.contains(r#"<source data-wagtail-media-id="9" type="video/mp4" />"#));
        assert!(rewritten.contains(r#"poster="https://example.com/wagtail-poster.png""#));
        assert!(scan(&rewritten).iter().all(|r| !r.is_importable()));
    }

    #[test]
    fn test_rewrite_bare_amp_video() {
        let mut resolutions = Resolutions::default();
        resolutions.insert_media("https://example.com/clip.mp4", MediaId(2));
        let html = r#"<amp-video src="https://example.com/clip.mp4" autoplay></amp-video>"#;
        assert_eq!(rewrite(html, &resolutions), r#"<amp-video data-wagtail-media-id="2" autoplay></amp-video>"#);
    }

    #[test]
    fn test_rewrite_matches_decoded_url() {
        let mut resolutions = Resolutions::default();
        resolutions.insert_image("https://example.com/a.jpg?w=1&h=2", ImageId(1));
        let html = r#"<amp-img src=" https://example.com/a.jpg?w=1&amp;h=2 "></amp-img>"#;
        assert_eq!(rewrite(html, &resolutions), r#"<amp-img data-wagtail-image-id="1"></amp-img>"#);
    }

    #[rstest]
    #[case::named_entity(r#"<amp-img src="https://example.com/caf&eacute;.jpg"></amp-img>"#)]
    #[case::numeric_without_semicolon(r#"<amp-img src="https://example.com/a.jpg?w=1&#38h=2"></amp-img>"#)]
    #[case::uppercase_entity(r#"<amp-img src="https://example.com/a.jpg?w=1&AMP;h=2"></amp-img>"#)]
    #[case::legacy_entity_in_query(r#"<amp-img src="https://example.com/a.jpg?w=1&copy=2"></amp-img>"#)]
    #[case::video_source(
        r#"<amp-video><source src="https://example.com/caf&eacute;.mp4"></amp-video>"#
    )]
    fn test_rewrite_uses_scanned_url(#[case] html: &str) {
        // Resolutions are keyed by the URL exactly as the scanner reports it.
        let mut resolutions = Resolutions::default();
        for reference in scan(html) {
            match reference {
                Reference::ImageUrl { url, .. } => resolutions.insert_image(url, ImageId(1)),
                Reference::VideoSourceUrl { url, .. } => resolutions.insert_media(url, MediaId(1)),
                _ => {},
            }
        }
        assert!(!resolutions.is_empty());
        let rewritten = rewrite(html, &resolutions);
        assert!(scan(&rewritten).iter().all(|r| !r.is_importable()), "{rewritten}");
    }

    #[test]
    fn test_rewrite_ignores_commented_and_scripted_markup() {
        let html = r#"<!-- <amp-img src="https://example.com/pied-wagtail.jpg"> --><script>"<amp-img src="https://example.com/pied-wagtail.jpg">"</script>"#;
        assert!(matches!(rewrite(html, &image_resolutions()), Cow::Borrowed(_)));
    }

    #[test]
    fn test_rewrite_preserves_unicode_and_odd_spacing() {
        let html = "<p>Bachstelze 🐦</p><amp-img\n\tsrc = \"https://example.com/pied-wagtail.jpg\"\nalt=\"ü\"></amp-img>";
        let rewritten = rewrite(html, &image_resolutions());
        assert_eq!(rewritten, "<p>Bachstelze 🐦</p><amp-img\n\tdata-wagtail-image-id=\"5\"\nalt=\"ü\"></amp-img>");
    }

    #[test]
    fn test_expand_image_adds_size() {
        let mut expansions = Expansions::default();
        let expansion = Expansion::new("http://media.example.com/media/images/m.original.png").with_size(640, 480);
        expansions.insert_image(ImageId(12), expansion);
        let expanded = expand(PAGE_1, &expansions);
        assert!(expanded.contains(
            r#"<amp-img src="http://media.example.com/media/images/m.original.png" width="640" height="480" alt="A mountain wagtail">"#
        ));
        assert!(!expanded.contains(IMAGE_ID_ATTR));
    }

    #[test]
    fn test_expand_keeps_declared_size() {
        let mut expansions = Expansions::default();
        expansions.insert_image(ImageId(1), Expansion::new("/media/images/a.original.png").with_size(640, 480));
        let html = r#"<amp-img data-wagtail-image-id="1" width="100" height="50"></amp-img>"#;
        assert_eq!(
            expand(html, &expansions),
            r#"<amp-img src="/media/images/a.original.png" width="100" height="50"></amp-img>"#
        );
    }

    #[test]
    fn test_expand_video_source() {
        let mut expansions = Expansions::default();
        expansions.insert_media(MediaId(3), Expansion::new("http://media.example.com/media/media/wagtail-in-flight.webm"));
        let expanded = expand(PAGE_2, &expansions);
        assert!(expanded.contains(
            r#"<source src="http://media.example.com/media/media/wagtail-in-flight.webm" type="video/webm" />"#
        ));
        assert!(!expanded.contains(MEDIA_ID_ATTR));
    }

    #[test]
    fn test_expand_missing_asset_untouched() {
        let html = r#"<amp-img data-wagtail-image-id="404"></amp-img><amp-img data-wagtail-image-id="x"></amp-img>"#;
        assert!(matches!(expand(html, &Expansions::default()), Cow::Borrowed(_)));
    }

    #[test]
    fn test_expand_replaces_stale_src() {
        let mut expansions = Expansions::default();
        expansions.insert_image(ImageId(1), Expansion::new("/media/images/a.original.png?v=1&x=\"2\""));
        let html = r#"<amp-img data-wagtail-image-id="1" src="https://old.example.com/a.png"></amp-img>"#;
        assert_eq!(
            expand(html, &expansions),
            r#"<amp-img  src="/media/images/a.original.png?v=1&amp;x=&quot;2&quot;"></amp-img>"#
        );
    }
}
