//! Renditions: stored derivatives of an image, one per filter spec.
//!
//! A rendition is either derived from the original on first request or
//! inserted verbatim from bytes fetched elsewhere (poster variants). Either
//! way the first one catalogued for a spec is the one that stays.

use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::naming;
use ampstory_catalog::{Inserted, NewRendition};
use ampstory_content::models::{FilterSpec, Image, Rendition};
use exn::ResultExt;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};
use std::io::Cursor;
use tracing::instrument;

/// Dimensions and format of an encoded image, without decoding the pixels.
pub(crate) fn probe(data: &[u8]) -> ImageResult<(u32, u32, ImageFormat)> {
    let format = image::guess_format(data)?;
    let (width, height) = ImageReader::with_format(Cursor::new(data), format).into_dimensions()?;
    Ok((width, height, format))
}

fn extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}

/// Resize `original` for `spec`, encoding the result in the original's format.
fn derive(original: &[u8], spec: FilterSpec) -> ImageResult<(Vec<u8>, u32, u32)> {
    let format = image::guess_format(original)?;
    let source = image::load_from_memory_with_format(original, format)?;
    let (width, height) = spec.target_size(source.width(), source.height());
    let resized = match spec {
        FilterSpec::Original => source,
        FilterSpec::Fill { .. } => source.resize_to_fill(width, height, FilterType::Lanczos3),
        FilterSpec::Max { .. } | FilterSpec::Width(_) | FilterSpec::Height(_) => {
            source.resize_exact(width, height, FilterType::Lanczos3)
        },
    };
    // JPEG has no alpha channel.
    let resized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
        _ => resized,
    };
    let mut buffer = Cursor::new(Vec::new());
    resized.write_to(&mut buffer, format)?;
    Ok((buffer.into_inner(), resized.width(), resized.height()))
}

/// The rendition of `image` for `spec`, deriving and storing it if needed.
///
/// `original` renditions are a verbatim copy of the original file.
#[instrument(skip(ctx, image), fields(image_id = %image.id, filter_spec = %spec))]
pub async fn get_rendition(ctx: &Context, image: &Image, spec: FilterSpec) -> Result<Rendition> {
    if let Some(rendition) = ctx.catalog().get_rendition(image.id, spec).await.or_raise(|| ErrorKind::Catalog)? {
        return Ok(rendition);
    }
    let _guard = ctx.lock(&format!("rendition:{}:{spec}", image.id)).await;
    // Someone may have finished it while we waited.
    if let Some(rendition) = ctx.catalog().get_rendition(image.id, spec).await.or_raise(|| ErrorKind::Catalog)? {
        return Ok(rendition);
    }

    let original = ctx.read(&image.file).await?;
    let ext = naming::extension(&image.file).unwrap_or_else(|| "png".to_string());
    let (data, width, height) = match spec {
        FilterSpec::Original => (original, image.width, image.height),
        _ => derive(&original, spec).or_raise(|| ErrorKind::Rendition(spec.to_string()))?,
    };
    let rendition = store(ctx, image, spec, &data, (width, height), &ext).await?;
    tracing::debug!(file = %rendition.get().file.display(), "Stored rendition");
    Ok(rendition.into_inner())
}

/// Attach pre-built bytes as the rendition of `image` for `spec`.
///
/// The bytes are stored exactly as given, with the extension of their own
/// format. An image that already has a rendition for `spec` keeps it.
#[instrument(skip(ctx, image, data), fields(image_id = %image.id, filter_spec = %spec, size = data.len()))]
pub async fn insert_raw_rendition(
    ctx: &Context,
    image: &Image,
    spec: FilterSpec,
    data: &[u8],
) -> Result<Inserted<Rendition>> {
    let (width, height, format) =
        probe(data).or_raise(|| ErrorKind::InvalidImage(format!("{spec} rendition of image {}", image.id)))?;
    store(ctx, image, spec, data, (width, height), extension(format)).await
}

async fn store(
    ctx: &Context,
    image: &Image,
    spec: FilterSpec,
    data: &[u8],
    (width, height): (u32, u32),
    ext: &str,
) -> Result<Inserted<Rendition>> {
    let file = ctx.store(&naming::rendition(&image.file, spec, ext), data).await?;
    let new = NewRendition { image_id: image.id, filter_spec: spec, file, width, height };
    let inserted = ctx.catalog().insert_rendition(&new).await;
    if !matches!(inserted, Ok(Inserted::Created(_))) {
        ctx.discard(&new.file).await;
    }
    inserted.or_raise(|| ErrorKind::Catalog)
}
