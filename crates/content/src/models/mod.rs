mod asset;
mod filter;
mod ids;
mod story;

pub use self::asset::{Image, Media, MediaKind, Rendition};
pub use self::filter::FilterSpec;
pub use self::ids::{ImageId, MediaId, StoryId};
pub use self::story::{PageFragment, PosterSlot, StoryPage};
