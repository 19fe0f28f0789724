//! The media import pipeline for AMP stories.
//!
//! Story pages reference images and videos by remote URL. Importing fetches
//! each URL once, stores the file, catalogues it and rewrites the page markup
//! to point at the local asset by ID ([`import_all`]). Rendering turns those
//! IDs back into public URLs of the stored files ([`render_story`]).
//!
//! Every operation takes a [`Context`] bundling the storage backend, the
//! catalog, the fetcher and the public media URL.

mod context;
pub mod error;
mod import;
mod locks;
mod naming;
mod preseed;
mod render;
mod rendition;
mod report;
mod resolve;
mod upload;

pub use crate::context::Context;
pub use crate::import::{import_all, import_images, import_videos};
pub use crate::preseed::{import_poster_variants, import_publisher_logo};
pub use crate::render::{
    expand_html, poster_landscape_src, poster_portrait_src, poster_square_src, poster_src, publisher_logo_src,
    render_story,
};
pub use crate::rendition::{get_rendition, insert_raw_rendition};
pub use crate::report::{AssetId, Failed, ImportReport, Imported, Outcome};
pub use crate::resolve::{resolve_image, resolve_video};
pub use crate::upload::{MediaUpload, upload_image, upload_media};

#[cfg(test)]
pub(crate) mod testing {
    use crate::Context;
    use ampstory_catalog::{Database, Repository};
    use ampstory_fetch::MockFetcher;
    use ampstory_storage::backend::MockBackend;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Arc;

    pub(crate) const MEDIA_URL: &str = "http://media.example.com/media/";

    pub(crate) async fn harness() -> (Context, Arc<MockBackend>, Arc<MockFetcher>) {
        let db = Database::connect_in_memory().await.unwrap();
        let backend = Arc::new(MockBackend::default());
        let fetcher = Arc::new(MockFetcher::default());
        let ctx = Context::new(backend.clone(), Repository::from(&db), fetcher.clone(), MEDIA_URL);
        (ctx, backend, fetcher)
    }

    pub(crate) fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([128, 128, 128])));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }
}
