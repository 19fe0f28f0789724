//! Publisher logo and poster images given as remote URLs.
//!
//! A story can name its poster as up to three differently cropped remote
//! images instead of one local image. The first of them that imports becomes
//! the poster image, and every variant that can be fetched is attached to it
//! as the rendition for its own aspect ratio, so nothing is ever re-cropped.

use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::rendition::insert_raw_rendition;
use crate::report::{AssetId, ImportReport};
use crate::resolve::resolve_image;
use ampstory_content::models::{PosterSlot, StoryPage};
use exn::ResultExt;
use tracing::instrument;

/// Import the publisher logo URL unless the story already has a logo image.
#[instrument(skip_all, fields(slug = %story.slug))]
pub async fn import_publisher_logo(ctx: &Context, story: &mut StoryPage) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    if story.publisher_logo.is_some() {
        return Ok(report);
    }
    let Some(url) = story.publisher_logo_src_original().map(str::to_string) else {
        return Ok(report);
    };
    let title = story.publisher_logo_title();
    let result = resolve_image(ctx, &url, Some(&title)).await;
    if let Some(image) = report.settle(&url, result, |image| AssetId::Image(image.id))? {
        story.publisher_logo = Some(image.id);
    }
    Ok(report)
}

/// Import the poster variant URLs unless the story already has a poster image.
#[instrument(skip_all, fields(slug = %story.slug))]
pub async fn import_poster_variants(ctx: &Context, story: &mut StoryPage) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    if story.poster_image.is_some() {
        return Ok(report);
    }
    let variants: Vec<(PosterSlot, String)> = PosterSlot::ALL
        .into_iter()
        .filter_map(|slot| story.poster_src_original(slot).map(|url| (slot, url.to_string())))
        .collect();

    // Variants before the one that imported have already failed.
    let mut backing = None;
    for (index, (_, url)) in variants.iter().enumerate() {
        let result = resolve_image(ctx, url, Some(&story.title)).await;
        if let Some(image) = report.settle(url, result, |image| AssetId::Image(image.id))? {
            backing = Some((index, image));
            break;
        }
    }
    let Some((index, image)) = backing else {
        return Ok(report);
    };
    story.poster_image = Some(image.id);

    for (slot, url) in &variants[index..] {
        let spec = slot.filter_spec();
        if ctx.catalog().get_rendition(image.id, spec).await.or_raise(|| ErrorKind::Catalog)?.is_some() {
            tracing::debug!(slot = slot.as_str(), "Poster rendition already present");
            continue;
        }
        let data = if image.source_url.as_deref() == Some(url.as_str()) {
            ctx.read(&image.file).await?
        } else {
            match ctx.fetch(url).await {
                Ok(response) => response.body,
                Err(error) => {
                    report.failure(url, error);
                    continue;
                },
            }
        };
        let result = insert_raw_rendition(ctx, &image, spec, &data).await;
        report.settle(url, result, |rendition| AssetId::Rendition { image: rendition.image_id, spec })?;
    }
    Ok(report)
}
