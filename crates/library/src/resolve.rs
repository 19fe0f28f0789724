//! Turning remote URLs into catalogued assets, at most once per URL.
//!
//! Each resolution holds a lock on its URL, so concurrent imports of the same
//! URL fetch it once. Imports running in other processes are caught by the
//! catalog's unique source URL: the loser deletes the file it just stored and
//! returns the winner's asset.

use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::naming;
use crate::rendition::probe;
use ampstory_catalog::{Inserted, NewImage, NewMedia};
use ampstory_content::models::{Image, Media, MediaKind};
use exn::ResultExt;
use tracing::instrument;

fn title_from_url(url: &str) -> String {
    ampstory_fetch::file_name(url).unwrap_or_else(|| url.to_string())
}

/// Find or import the image at `url`.
///
/// An image already catalogued for `url` is returned without touching the
/// network. Otherwise the body is stored verbatim and catalogued with `title`
/// (or the URL's file name) as its title.
#[instrument(skip(ctx))]
pub async fn resolve_image(ctx: &Context, url: &str, title: Option<&str>) -> Result<Inserted<Image>> {
    let _guard = ctx.lock(url).await;
    if let Some(image) = ctx.catalog().get_image_by_source_url(url).await.or_raise(|| ErrorKind::Catalog)? {
        tracing::debug!(image_id = %image.id, "Image already imported");
        return Ok(Inserted::Existing(image));
    }

    let response = ctx.fetch(url).await?;
    let (width, height, format) = probe(&response.body).or_raise(|| ErrorKind::InvalidImage(url.to_string()))?;
    let name = naming::sanitize(
        ampstory_fetch::file_name(url).as_deref(),
        "image",
        Some(format.extensions_str().first().copied().unwrap_or("img")),
    );
    let file = ctx.store(&naming::original_image(&name), &response.body).await?;
    let new = NewImage {
        title: title.map(str::to_string).unwrap_or_else(|| title_from_url(url)),
        file,
        width,
        height,
        file_size: response.body.len() as u64,
        file_hash: blake3::hash(&response.body).to_hex().to_string(),
        source_url: Some(url.to_string()),
    };
    let inserted = match ctx.catalog().insert_image(&new).await {
        Ok(inserted) => inserted,
        Err(err) => {
            ctx.discard(&new.file).await;
            return Err(err).or_raise(|| ErrorKind::Catalog);
        },
    };
    match &inserted {
        Inserted::Created(image) => {
            tracing::info!(image_id = %image.id, file = %image.file.display(), "Imported image");
        },
        Inserted::Existing(image) => {
            tracing::debug!(image_id = %image.id, "Image imported concurrently elsewhere; discarding our copy");
            ctx.discard(&new.file).await;
        },
    }
    Ok(inserted)
}

/// Find or import the video at `url`.
///
/// `poster` is fetched as the video's thumbnail; a poster that cannot be
/// fetched is logged and the video is imported without one. `width` and
/// `height` are recorded as declared, never probed.
#[instrument(skip(ctx))]
pub async fn resolve_video(
    ctx: &Context,
    url: &str,
    poster: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<Inserted<Media>> {
    let _guard = ctx.lock(url).await;
    if let Some(media) = ctx.catalog().get_media_by_source_url(url).await.or_raise(|| ErrorKind::Catalog)? {
        tracing::debug!(media_id = %media.id, "Video already imported");
        return Ok(Inserted::Existing(media));
    }

    let response = ctx.fetch(url).await?;
    let thumbnail = match poster {
        Some(poster) => fetch_thumbnail(ctx, poster).await?,
        None => None,
    };
    let name = naming::sanitize(
        ampstory_fetch::file_name(url).as_deref(),
        "video",
        naming::extension_for(response.content_type.as_deref()),
    );
    let file = match ctx.store(&naming::media(&name), &response.body).await {
        Ok(file) => file,
        Err(err) => {
            if let Some(thumbnail) = &thumbnail {
                ctx.discard(thumbnail).await;
            }
            return Err(err);
        },
    };
    let new = NewMedia {
        title: title_from_url(url),
        kind: MediaKind::Video,
        file,
        width,
        height,
        duration: 0,
        thumbnail,
        source_url: Some(url.to_string()),
    };
    let inserted = ctx.catalog().insert_media(&new).await;
    let keep = matches!(inserted, Ok(Inserted::Created(_)));
    if !keep {
        ctx.discard(&new.file).await;
        if let Some(thumbnail) = &new.thumbnail {
            ctx.discard(thumbnail).await;
        }
    }
    let inserted = inserted.or_raise(|| ErrorKind::Catalog)?;
    match &inserted {
        Inserted::Created(media) => {
            tracing::info!(media_id = %media.id, file = %media.file.display(), "Imported video");
        },
        Inserted::Existing(media) => {
            tracing::debug!(media_id = %media.id, "Video imported concurrently elsewhere; discarded our copy");
        },
    }
    Ok(inserted)
}

/// Store a video poster, or `None` if it could not be fetched.
async fn fetch_thumbnail(ctx: &Context, poster: &str) -> Result<Option<std::path::PathBuf>> {
    let response = match ctx.fetch(poster).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(poster, error = %err, "Could not fetch video poster; importing without a thumbnail");
            return Ok(None);
        },
    };
    let name = naming::sanitize(
        ampstory_fetch::file_name(poster).as_deref(),
        "poster",
        naming::extension_for(response.content_type.as_deref()),
    );
    Ok(Some(ctx.store(&naming::thumbnail(&name), &response.body).await?))
}
