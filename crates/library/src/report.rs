use crate::error::{Error, Result};
use ampstory_catalog::Inserted;
use ampstory_content::models::{FilterSpec, ImageId, MediaId};
use derive_more::Display;

/// What an import produced for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AssetId {
    #[display("image {_0}")]
    Image(ImageId),
    #[display("media {_0}")]
    Media(MediaId),
    #[display("image {image} rendition {spec}")]
    Rendition { image: ImageId, spec: FilterSpec },
}

/// Whether an import stored something new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Outcome {
    /// Fetched and stored by this import.
    #[display("created")]
    Created,
    /// Already there; nothing was fetched.
    #[display("existing")]
    Existing,
}

/// A reference that now points at a catalogued asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imported {
    /// The URL as found in the story.
    pub url: String,
    pub asset: AssetId,
    pub outcome: Outcome,
}

/// A reference that could not be imported and was left as it was.
#[derive(Debug)]
pub struct Failed {
    pub url: String,
    pub error: Error,
}

/// Per-reference results of an import pass.
///
/// Fetch failures and unusable image bodies end up in [`failed`](Self::failed)
/// and do not stop the pass; anything else aborts it with an error instead.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<Imported>,
    pub failed: Vec<Failed>,
}
impl ImportReport {
    /// Number of assets fetched and stored by this pass.
    pub fn created(&self) -> usize {
        self.imported.iter().filter(|i| i.outcome == Outcome::Created).count()
    }

    /// Number of references resolved to assets that were already catalogued.
    pub fn existing(&self) -> usize {
        self.imported.iter().filter(|i| i.outcome == Outcome::Existing).count()
    }

    /// `true` if every importable reference was imported.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Append the results of a later pass, such as videos after images.
    pub fn merge(&mut self, other: ImportReport) {
        self.imported.extend(other.imported);
        self.failed.extend(other.failed);
    }

    pub(crate) fn failure(&mut self, url: &str, error: Error) {
        tracing::warn!(url, error = %error, "Reference not imported");
        self.failed.push(Failed { url: url.to_string(), error });
    }

    /// Record the result of importing `url`.
    ///
    /// Reference failures are recorded and yield `Ok(None)`; every other
    /// error is handed back to abort the pass.
    pub(crate) fn settle<T>(
        &mut self,
        url: &str,
        result: Result<Inserted<T>>,
        asset: impl FnOnce(&T) -> AssetId,
    ) -> Result<Option<T>> {
        match result {
            Ok(inserted) => {
                let outcome = if inserted.is_created() { Outcome::Created } else { Outcome::Existing };
                let value = inserted.into_inner();
                self.imported.push(Imported { url: url.to_string(), asset: asset(&value), outcome });
                Ok(Some(value))
            },
            Err(error) if error.is_reference_failure() => {
                self.failure(url, error);
                Ok(None)
            },
            Err(error) => Err(error),
        }
    }
}
