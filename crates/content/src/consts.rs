use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

/// Marker attribute holding the ID of an imported image.
pub const IMAGE_ID_ATTR: &str = "data-wagtail-image-id";
/// Marker attribute holding the ID of an imported video.
pub const MEDIA_ID_ATTR: &str = "data-wagtail-media-id";

pub(crate) const AMP_IMG: &str = "amp-img";
pub(crate) const AMP_VIDEO: &str = "amp-video";
pub(crate) const SOURCE: &str = "source";

// Grouped so that matches come back in document order.
selector!(REFERENCE_SELECTOR, "amp-img, amp-video, amp-video source");
selector!(SOURCE_SELECTOR, "source");

/// Elements whose content is raw text; tags inside them are not markup.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] =
    &["iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "textarea", "title", "xmp"];
