//! Reading and writing catalog rows.
//!
//! Imports are deduplicated by source URL at the database level: the insert
//! queries skip rows whose identity already exists and the repository then
//! returns the row that won instead.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{ImageRow, Inserted, MediaRow, NewImage, NewMedia, NewRendition, RenditionRow, StoryRow};
use ampstory_content::models::{FilterSpec, Image, ImageId, Media, MediaId, Rendition, StoryId, StoryPage};
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Catalogue an image unless one with the same source URL already exists.
    ///
    /// Uploads (no source URL) are always created.
    #[instrument(skip(self, image), fields(file = %image.file.display(), source_url = image.source_url.as_deref()))]
    pub async fn insert_image(&self, image: &NewImage) -> Result<Inserted<Image>> {
        let row = ImageRow::new(image, UtcDateTime::now())?;
        let created: Option<ImageRow> = sqlx::query_as(include_str!("../queries/insert_image.sql"))
            .bind(row.title)
            .bind(row.file)
            .bind(row.width)
            .bind(row.height)
            .bind(row.file_size)
            .bind(row.file_hash)
            .bind(row.source_url)
            .bind(row.created_at)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if let Some(created) = created {
            return Ok(Inserted::Created(created.try_into()?));
        }
        let url = image.source_url.as_deref().ok_or_raise(|| ErrorKind::InvalidData("source url"))?;
        let existing = self.get_image_by_source_url(url).await?;
        tracing::debug!("Image already catalogued");
        Ok(Inserted::Existing(existing.ok_or_raise(|| ErrorKind::Database)?))
    }

    pub async fn get_image(&self, id: ImageId) -> Result<Option<Image>> {
        let row: Option<ImageRow> = sqlx::query_as(include_str!("../queries/get_image.sql"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Image::try_from).transpose()
    }

    pub async fn get_image_by_source_url(&self, url: &str) -> Result<Option<Image>> {
        let row: Option<ImageRow> = sqlx::query_as(include_str!("../queries/get_image_by_source_url.sql"))
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Image::try_from).transpose()
    }

    pub async fn count_images(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_images.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
    }

    // =========================================================================
    // Renditions
    // =========================================================================

    /// Catalogue a rendition unless the image already has one for that filter spec.
    ///
    /// The first rendition written for a spec is kept; later writers get it back
    /// as [`Inserted::Existing`] and should discard their own file.
    #[instrument(skip(self, rendition), fields(image_id = %rendition.image_id, filter_spec = %rendition.filter_spec))]
    pub async fn insert_rendition(&self, rendition: &NewRendition) -> Result<Inserted<Rendition>> {
        let row = RenditionRow::try_from(rendition)?;
        let created: Option<RenditionRow> = sqlx::query_as(include_str!("../queries/insert_rendition.sql"))
            .bind(row.image_id)
            .bind(row.filter_spec)
            .bind(row.file)
            .bind(row.width)
            .bind(row.height)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if let Some(created) = created {
            return Ok(Inserted::Created(created.try_into()?));
        }
        let existing = self.get_rendition(rendition.image_id, rendition.filter_spec).await?;
        Ok(Inserted::Existing(existing.ok_or_raise(|| ErrorKind::Database)?))
    }

    pub async fn get_rendition(&self, image_id: ImageId, filter_spec: FilterSpec) -> Result<Option<Rendition>> {
        let row: Option<RenditionRow> = sqlx::query_as(include_str!("../queries/get_rendition.sql"))
            .bind(image_id.0)
            .bind(filter_spec.to_string())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Rendition::try_from).transpose()
    }

    /// All renditions of an image, oldest first.
    pub async fn list_renditions(&self, image_id: ImageId) -> Result<Vec<Rendition>> {
        let rows: Vec<RenditionRow> = sqlx::query_as(include_str!("../queries/get_renditions_by_image.sql"))
            .bind(image_id.0)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Rendition::try_from).collect()
    }

    // =========================================================================
    // Media
    // =========================================================================

    /// Catalogue a video or audio file unless one with the same source URL already exists.
    #[instrument(skip(self, media), fields(file = %media.file.display(), source_url = media.source_url.as_deref()))]
    pub async fn insert_media(&self, media: &NewMedia) -> Result<Inserted<Media>> {
        let row = MediaRow::new(media, UtcDateTime::now())?;
        let created: Option<MediaRow> = sqlx::query_as(include_str!("../queries/insert_media.sql"))
            .bind(row.title)
            .bind(row.kind)
            .bind(row.file)
            .bind(row.width)
            .bind(row.height)
            .bind(row.duration)
            .bind(row.thumbnail)
            .bind(row.source_url)
            .bind(row.created_at)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if let Some(created) = created {
            return Ok(Inserted::Created(created.try_into()?));
        }
        let url = media.source_url.as_deref().ok_or_raise(|| ErrorKind::InvalidData("source url"))?;
        let existing = self.get_media_by_source_url(url).await?;
        tracing::debug!("Media already catalogued");
        Ok(Inserted::Existing(existing.ok_or_raise(|| ErrorKind::Database)?))
    }

    pub async fn get_media(&self, id: MediaId) -> Result<Option<Media>> {
        let row: Option<MediaRow> = sqlx::query_as(include_str!("../queries/get_media.sql"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Media::try_from).transpose()
    }

    pub async fn get_media_by_source_url(&self, url: &str) -> Result<Option<Media>> {
        let row: Option<MediaRow> = sqlx::query_as(include_str!("../queries/get_media_by_source_url.sql"))
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Media::try_from).transpose()
    }

    pub async fn count_media(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_media.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Insert or replace the story with the same slug, returning its ID.
    #[instrument(skip(self, story), fields(slug = %story.slug))]
    pub async fn save_story(&self, story: &StoryPage) -> Result<StoryId> {
        let row = StoryRow::try_from(story)?;
        let id: i64 = sqlx::query_scalar(include_str!("../queries/upsert_story.sql"))
            .bind(row.slug)
            .bind(row.title)
            .bind(row.publisher)
            .bind(row.pages)
            .bind(row.poster_image_id)
            .bind(row.poster_portrait_src_original)
            .bind(row.poster_square_src_original)
            .bind(row.poster_landscape_src_original)
            .bind(row.publisher_logo_id)
            .bind(row.publisher_logo_src_original)
            .bind(row.custom_css)
            .bind(UtcDateTime::now().unix_timestamp())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(StoryId(id))
    }

    pub async fn get_story_by_slug(&self, slug: &str) -> Result<Option<StoryPage>> {
        let row: Option<StoryRow> = sqlx::query_as(include_str!("../queries/get_story_by_slug.sql"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(StoryPage::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampstory_content::models::{MediaKind, PageFragment};
    use std::path::PathBuf;

    async fn repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    fn new_image(file: &str, source_url: Option<&str>) -> NewImage {
        NewImage {
            title: "Pied wagtail".to_string(),
            file: PathBuf::from(file),
            width: 1200,
            height: 800,
            file_size: 2048,
            file_hash: "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24".to_string(),
            source_url: source_url.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_image() {
        let repo = repo().await;
        let inserted = repo
            .insert_image(&new_image("original_images/pied-wagtail.jpg", Some("https://example.com/pied-wagtail.jpg")))
            .await
            .unwrap();
        assert!(inserted.is_created());
        let image = inserted.into_inner();
        assert_eq!(repo.get_image(image.id).await.unwrap(), Some(image.clone()));
        assert_eq!(repo.get_image_by_source_url("https://example.com/pied-wagtail.jpg").await.unwrap(), Some(image));
        assert_eq!(repo.count_images().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_source_url_returns_existing() {
        let repo = repo().await;
        let url = Some("https://example.com/pied-wagtail.jpg");
        let first = repo.insert_image(&new_image("original_images/pied-wagtail.jpg", url)).await.unwrap();
        let second = repo.insert_image(&new_image("original_images/pied-wagtail_2.jpg", url)).await.unwrap();
        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(first.get().id, second.get().id);
        assert_eq!(second.get().file, PathBuf::from("original_images/pied-wagtail.jpg"));
        assert_eq!(repo.count_images().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_uploads_without_source_url_are_distinct() {
        let repo = repo().await;
        let a = repo.insert_image(&new_image("original_images/a.jpg", None)).await.unwrap();
        let b = repo.insert_image(&new_image("original_images/b.jpg", None)).await.unwrap();
        assert!(a.is_created() && b.is_created());
        assert_ne!(a.get().id, b.get().id);
    }

    #[tokio::test]
    async fn test_missing_image() {
        let repo = repo().await;
        assert_eq!(repo.get_image(ImageId(99)).await.unwrap(), None);
        assert_eq!(repo.get_media(MediaId(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_first_rendition_wins() {
        let repo = repo().await;
        let image = repo.insert_image(&new_image("original_images/logo.png", None)).await.unwrap().into_inner();
        let rendition = |file: &str| NewRendition {
            image_id: image.id,
            filter_spec: FilterSpec::PUBLISHER_LOGO,
            file: PathBuf::from(file),
            width: 96,
            height: 96,
        };
        let first = repo.insert_rendition(&rendition("images/logo.fill-96x96.png")).await.unwrap();
        let second = repo.insert_rendition(&rendition("images/logo.fill-96x96_2.png")).await.unwrap();
        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(second.get().file, PathBuf::from("images/logo.fill-96x96.png"));
        assert_eq!(repo.get_rendition(image.id, FilterSpec::PUBLISHER_LOGO).await.unwrap(), Some(first.into_inner()));
        assert_eq!(repo.get_rendition(image.id, FilterSpec::Original).await.unwrap(), None);
        assert_eq!(repo.list_renditions(image.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rendition_requires_image() {
        let repo = repo().await;
        let result = repo
            .insert_rendition(&NewRendition {
                image_id: ImageId(42),
                filter_spec: FilterSpec::Original,
                file: PathBuf::from("images/missing.original.png"),
                width: 1,
                height: 1,
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_insert_media_dedup() {
        let repo = repo().await;
        let media = NewMedia {
            title: "wagtail-in-flight.mp4".to_string(),
            kind: MediaKind::Video,
            file: PathBuf::from("media/wagtail-in-flight.mp4"),
            width: Some(600),
            height: Some(800),
            duration: 0,
            thumbnail: Some(PathBuf::from("media_thumbnails/wagtail-poster.png")),
            source_url: Some("https://example.com/wagtail-in-flight.mp4".to_string()),
        };
        let first = repo.insert_media(&media).await.unwrap();
        let second = repo.insert_media(&NewMedia { file: PathBuf::from("media/other.mp4"), ..media }).await.unwrap();
        assert!(first.is_created());
        assert_eq!(first.get().id, second.get().id);
        let stored = repo.get_media(first.get().id).await.unwrap().unwrap();
        assert_eq!(stored.thumbnail_filename(), Some("wagtail-poster.png"));
        assert_eq!(stored.width, Some(600));
        assert_eq!(repo.count_media().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_story_upsert_by_slug() {
        let repo = repo().await;
        let mut story = StoryPage::new("Wagtail spotting", "Torchbox");
        story.pages.push(PageFragment::new("page-1", "<amp-story-page id=\"page-1\"></amp-story-page>"));
        story.publisher_logo_src_original = Some("https://example.com/torchbox.png".to_string());
        let id = repo.save_story(&story).await.unwrap();

        story.custom_css = "#page-1 { background-color: #c0ffee; }".to_string();
        assert_eq!(repo.save_story(&story).await.unwrap(), id);

        let stored = repo.get_story_by_slug("wagtail-spotting").await.unwrap().unwrap();
        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.pages, story.pages);
        assert_eq!(stored.custom_css, story.custom_css);
        assert_eq!(repo.get_story_by_slug("owl-spotting").await.unwrap(), None);
    }
}
