//! Local images and media, created from bytes rather than fetched.
//!
//! These are what explicit `poster_image` and `publisher_logo` IDs point at.
//! They have no source URL, so they never take part in import deduplication.

use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::naming;
use crate::rendition::probe;
use ampstory_catalog::{NewImage, NewMedia};
use ampstory_content::models::{Image, Media, MediaKind};
use exn::ResultExt;
use tracing::instrument;

#[instrument(skip(ctx, data), fields(size = data.len()))]
pub async fn upload_image(ctx: &Context, title: &str, filename: &str, data: &[u8]) -> Result<Image> {
    let (width, height, format) = probe(data).or_raise(|| ErrorKind::InvalidImage(filename.to_string()))?;
    let name = naming::sanitize(Some(filename), "image", format.extensions_str().first().copied());
    let file = ctx.store(&naming::original_image(&name), data).await?;
    let new = NewImage {
        title: title.to_string(),
        file,
        width,
        height,
        file_size: data.len() as u64,
        file_hash: blake3::hash(data).to_hex().to_string(),
        source_url: None,
    };
    match ctx.catalog().insert_image(&new).await {
        Ok(inserted) => Ok(inserted.into_inner()),
        Err(err) => {
            ctx.discard(&new.file).await;
            Err(err).or_raise(|| ErrorKind::Catalog)
        },
    }
}

/// A media file to upload, with what is known about it up front.
#[derive(Debug, Clone)]
pub struct MediaUpload<'a> {
    pub title: &'a str,
    pub kind: MediaKind,
    pub filename: &'a str,
    pub data: &'a [u8],
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: u32,
    /// File name and bytes of a thumbnail image
    pub thumbnail: Option<(&'a str, &'a [u8])>,
}

#[instrument(skip(ctx, upload), fields(title = upload.title, filename = upload.filename, size = upload.data.len()))]
pub async fn upload_media(ctx: &Context, upload: MediaUpload<'_>) -> Result<Media> {
    let thumbnail = match upload.thumbnail {
        Some((filename, data)) => {
            let name = naming::sanitize(Some(filename), "thumbnail", None);
            Some(ctx.store(&naming::thumbnail(&name), data).await?)
        },
        None => None,
    };
    let name = naming::sanitize(Some(upload.filename), upload.kind.as_str(), None);
    let file = ctx.store(&naming::media(&name), upload.data).await?;
    let new = NewMedia {
        title: upload.title.to_string(),
        kind: upload.kind,
        file,
        width: upload.width,
        height: upload.height,
        duration: upload.duration,
        thumbnail,
        source_url: None,
    };
    match ctx.catalog().insert_media(&new).await {
        Ok(inserted) => Ok(inserted.into_inner()),
        Err(err) => {
            ctx.discard(&new.file).await;
            if let Some(thumbnail) = &new.thumbnail {
                ctx.discard(thumbnail).await;
            }
            Err(err).or_raise(|| ErrorKind::Catalog)
        },
    }
}
