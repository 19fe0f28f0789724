use crate::error::{Error, ErrorKind, Result};
use ampstory_content::models::{ImageId, PageFragment, StoryId, StoryPage};
use exn::ResultExt;

#[derive(sqlx::FromRow)]
pub(crate) struct StoryRow {
    pub(crate) id: i64,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) publisher: String,
    /// JSON array of [`PageFragment`]s
    pub(crate) pages: String,
    pub(crate) poster_image_id: Option<i64>,
    pub(crate) poster_portrait_src_original: Option<String>,
    pub(crate) poster_square_src_original: Option<String>,
    pub(crate) poster_landscape_src_original: Option<String>,
    pub(crate) publisher_logo_id: Option<i64>,
    pub(crate) publisher_logo_src_original: Option<String>,
    pub(crate) custom_css: String,
}
impl TryFrom<&StoryPage> for StoryRow {
    type Error = Error;
    fn try_from(story: &StoryPage) -> Result<Self> {
        Ok(Self {
            id: story.id.map_or(0, |id| id.0),
            slug: story.slug.clone(),
            title: story.title.clone(),
            publisher: story.publisher.clone(),
            pages: serde_json::to_string(&story.pages).or_raise(|| ErrorKind::InvalidData("pages"))?,
            poster_image_id: story.poster_image.map(|id| id.0),
            poster_portrait_src_original: story.poster_portrait_src_original.clone(),
            poster_square_src_original: story.poster_square_src_original.clone(),
            poster_landscape_src_original: story.poster_landscape_src_original.clone(),
            publisher_logo_id: story.publisher_logo.map(|id| id.0),
            publisher_logo_src_original: story.publisher_logo_src_original.clone(),
            custom_css: story.custom_css.clone(),
        })
    }
}
impl TryFrom<StoryRow> for StoryPage {
    type Error = Error;
    fn try_from(row: StoryRow) -> Result<Self> {
        Ok(Self {
            id: Some(StoryId(row.id)),
            title: row.title,
            slug: row.slug,
            publisher: row.publisher,
            pages: serde_json::from_str::<Vec<PageFragment>>(&row.pages)
                .or_raise(|| ErrorKind::InvalidData("pages"))?,
            poster_image: row.poster_image_id.map(ImageId),
            poster_portrait_src_original: row.poster_portrait_src_original,
            poster_square_src_original: row.poster_square_src_original,
            poster_landscape_src_original: row.poster_landscape_src_original,
            publisher_logo: row.publisher_logo_id.map(ImageId),
            publisher_logo_src_original: row.publisher_logo_src_original,
            custom_css: row.custom_css,
        })
    }
}
