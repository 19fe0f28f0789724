//! Import passes over a whole story.
//!
//! References are resolved one at a time in document order. After each
//! fragment its imported references are rewritten to ID markers, so a pass
//! that aborts part-way keeps everything it already rewrote.

use crate::Context;
use crate::error::Result;
use crate::preseed::{import_poster_variants, import_publisher_logo};
use crate::report::{AssetId, ImportReport};
use crate::resolve::{resolve_image, resolve_video};
use ampstory_content::models::{PageFragment, StoryPage};
use ampstory_content::{Reference, Resolutions, rewrite, scan};
use tracing::instrument;

/// Import the publisher logo, the poster variants and every remote image in
/// the story's pages.
#[instrument(skip_all, fields(slug = %story.slug))]
pub async fn import_images(ctx: &Context, story: &mut StoryPage) -> Result<ImportReport> {
    let mut report = import_publisher_logo(ctx, story).await?;
    report.merge(import_poster_variants(ctx, story).await?);
    report.merge(import_page_images(ctx, &mut story.pages).await?);
    tracing::info!(created = report.created(), existing = report.existing(), failed = report.failed.len(), "Imported images");
    Ok(report)
}

/// Import every remote video in the story's pages.
#[instrument(skip_all, fields(slug = %story.slug))]
pub async fn import_videos(ctx: &Context, story: &mut StoryPage) -> Result<ImportReport> {
    let report = import_page_videos(ctx, &mut story.pages).await?;
    tracing::info!(created = report.created(), existing = report.existing(), failed = report.failed.len(), "Imported videos");
    Ok(report)
}

/// [`import_images`] followed by [`import_videos`].
pub async fn import_all(ctx: &Context, story: &mut StoryPage) -> Result<ImportReport> {
    let mut report = import_images(ctx, story).await?;
    report.merge(import_videos(ctx, story).await?);
    Ok(report)
}

async fn import_page_images(ctx: &Context, pages: &mut [PageFragment]) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let mut resolutions = Resolutions::default();
    for page in pages {
        let mut outcome = Ok(());
        for reference in scan(&page.html) {
            let Reference::ImageUrl { url, alt } = reference else {
                continue;
            };
            if resolutions.image(&url).is_some() || report.failed.iter().any(|failed| failed.url == url) {
                continue;
            }
            let result = resolve_image(ctx, &url, alt.as_deref()).await;
            match report.settle(&url, result, |image| AssetId::Image(image.id)) {
                Ok(Some(image)) => resolutions.insert_image(url, image.id),
                Ok(None) => {},
                Err(error) => {
                    outcome = Err(error);
                    break;
                },
            }
        }
        apply(page, &resolutions);
        outcome?;
    }
    Ok(report)
}

async fn import_page_videos(ctx: &Context, pages: &mut [PageFragment]) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let mut resolutions = Resolutions::default();
    for page in pages {
        let mut outcome = Ok(());
        for reference in scan(&page.html) {
            let Reference::VideoSourceUrl { url, poster, width, height } = reference else {
                continue;
            };
            if resolutions.media(&url).is_some() || report.failed.iter().any(|failed| failed.url == url) {
                continue;
            }
            let result = resolve_video(ctx, &url, poster.as_deref(), width, height).await;
            match report.settle(&url, result, |media| AssetId::Media(media.id)) {
                Ok(Some(media)) => resolutions.insert_media(url, media.id),
                Ok(None) => {},
                Err(error) => {
                    outcome = Err(error);
                    break;
                },
            }
        }
        apply(page, &resolutions);
        outcome?;
    }
    Ok(report)
}

fn apply(page: &mut PageFragment, resolutions: &Resolutions) {
    if resolutions.is_empty() {
        return;
    }
    let rewritten = rewrite(&page.html, resolutions);
    if rewritten != page.html.as_str() {
        tracing::debug!(page = %page.id, "Rewrote imported references");
        page.html = rewritten.into_owned();
    }
}
