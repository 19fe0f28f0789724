use super::{FilterSpec, ImageId, StoryId};
use crate::error::{ErrorKind, Result};
use rslug::slugify;

/// One `<amp-story-page>` block of a story.
///
/// `html` is authored markup; the importer rewrites it in place when remote
/// media gets imported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageFragment {
    pub id: String,
    pub html: String,
}
impl PageFragment {
    pub fn new(id: impl Into<String>, html: impl Into<String>) -> Self {
        Self { id: id.into(), html: html.into() }
    }
}

/// The three poster aspect ratios an AMP story advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosterSlot {
    Portrait,
    Square,
    Landscape,
}
impl PosterSlot {
    pub const ALL: [PosterSlot; 3] = [PosterSlot::Portrait, PosterSlot::Square, PosterSlot::Landscape];

    pub fn filter_spec(&self) -> FilterSpec {
        match self {
            PosterSlot::Portrait => FilterSpec::POSTER_PORTRAIT,
            PosterSlot::Square => FilterSpec::POSTER_SQUARE,
            PosterSlot::Landscape => FilterSpec::POSTER_LANDSCAPE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PosterSlot::Portrait => "portrait",
            PosterSlot::Square => "square",
            PosterSlot::Landscape => "landscape",
        }
    }
}

/// An AMP story: ordered page fragments plus publisher and poster metadata.
///
/// The publisher logo and the poster can each be given either as a local
/// image ID or as remote source URLs that an import turns into a local image.
/// An explicit ID always wins over the URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct StoryPage {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub id: Option<StoryId>,
    pub title: String,
    pub slug: String,
    pub publisher: String,
    pub pages: Vec<PageFragment>,
    pub poster_image: Option<ImageId>,
    pub poster_portrait_src_original: Option<String>,
    pub poster_square_src_original: Option<String>,
    pub poster_landscape_src_original: Option<String>,
    pub publisher_logo: Option<ImageId>,
    pub publisher_logo_src_original: Option<String>,
    pub custom_css: String,
}

impl StoryPage {
    pub fn new(title: impl Into<String>, publisher: impl Into<String>) -> Self {
        let mut story = Self { title: title.into(), publisher: publisher.into(), ..Self::default() };
        story.ensure_slug();
        story
    }

    /// Derive the slug from the title if none was given.
    pub fn ensure_slug(&mut self) {
        if self.slug.trim().is_empty() {
            self.slug = slugify!(self.title.trim());
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidStory("title is empty"));
        }
        if self.slug.is_empty() {
            exn::bail!(ErrorKind::InvalidStory("slug is empty"));
        }
        if !self.slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            exn::bail!(ErrorKind::InvalidStory("slug may only contain letters, digits, '-' and '_'"));
        }
        Ok(())
    }

    /// Recorded remote URL for a poster slot.
    pub fn poster_src_original(&self, slot: PosterSlot) -> Option<&str> {
        let url = match slot {
            PosterSlot::Portrait => &self.poster_portrait_src_original,
            PosterSlot::Square => &self.poster_square_src_original,
            PosterSlot::Landscape => &self.poster_landscape_src_original,
        };
        url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    pub fn publisher_logo_src_original(&self) -> Option<&str> {
        self.publisher_logo_src_original.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// The publisher logo image's title when imported from a URL.
    pub fn publisher_logo_title(&self) -> String {
        format!("{} logo", self.publisher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_title() {
        let story = StoryPage::new("Wagtail spotting", "Torchbox");
        assert_eq!(story.slug, "wagtail-spotting");
        assert_eq!(story.publisher_logo_title(), "Torchbox logo");
        assert!(story.validate().is_ok());
    }

    #[test]
    fn test_explicit_slug_kept() {
        let mut story = StoryPage { title: "Wagtail spotting".into(), slug: "spotting".into(), ..Default::default() };
        story.ensure_slug();
        assert_eq!(story.slug, "spotting");
    }

    #[test]
    fn test_validate() {
        assert!(StoryPage::default().validate().is_err());
        let story = StoryPage { title: "x".into(), slug: "has spaces".into(), ..Default::default() };
        assert!(matches!(&*story.validate().unwrap_err(), ErrorKind::InvalidStory(_)));
    }

    #[test]
    fn test_poster_sources_ignore_blank() {
        let story = StoryPage {
            poster_portrait_src_original: Some(" https://example.com/p.jpg ".into()),
            poster_square_src_original: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(story.poster_src_original(PosterSlot::Portrait), Some("https://example.com/p.jpg"));
        assert_eq!(story.poster_src_original(PosterSlot::Square), None);
        assert_eq!(story.poster_src_original(PosterSlot::Landscape), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_minimal() {
        let story: StoryPage = serde_json::from_str(
            r#"{"title": "Wagtail spotting", "pages": [{"id": "cover", "html": "<amp-story-page id=\"cover\"></amp-story-page>"}]}"#,
        )
        .unwrap();
        assert_eq!(story.pages.len(), 1);
        assert_eq!(story.pages[0].id, "cover");
        assert_eq!(story.poster_image, None);
    }
}
