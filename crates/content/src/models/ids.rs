use derive_more::Display;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
        #[display("{_0}")]
        pub struct $name(pub i64);

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

id_type!(
    /// Catalog ID of an image asset, as written into `data-wagtail-image-id`.
    ImageId
);
id_type!(
    /// Catalog ID of a video or audio asset, as written into `data-wagtail-media-id`.
    MediaId
);
id_type!(StoryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(" 42 ".parse::<ImageId>().unwrap(), ImageId(42));
        assert_eq!(MediaId(7).to_string(), "7");
        assert!("forty-two".parse::<ImageId>().is_err());
        assert!("".parse::<MediaId>().is_err());
    }
}
