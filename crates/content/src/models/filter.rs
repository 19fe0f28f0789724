use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// How a rendition is derived from its original image.
///
/// The textual form (`original`, `fill-640x853`, `max-800x600`, `width-320`,
/// `height-240`) is used both as the catalog key and inside rendition file
/// names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterSpec {
    /// The original pixels, unchanged.
    Original,
    /// Crop to the target aspect ratio, then resize to exactly the target.
    Fill { width: u32, height: u32 },
    /// Resize to fit within the bounds, keeping the aspect ratio.
    Max { width: u32, height: u32 },
    /// Resize to this width, keeping the aspect ratio.
    Width(u32),
    /// Resize to this height, keeping the aspect ratio.
    Height(u32),
}

impl FilterSpec {
    pub const POSTER_PORTRAIT: Self = Self::Fill { width: 640, height: 853 };
    pub const POSTER_SQUARE: Self = Self::Fill { width: 640, height: 640 };
    pub const POSTER_LANDSCAPE: Self = Self::Fill { width: 853, height: 640 };
    pub const PUBLISHER_LOGO: Self = Self::Fill { width: 96, height: 96 };

    /// Output dimensions for a source image of `width` x `height`.
    ///
    /// Renditions never upscale: a fill larger than the source shrinks to
    /// the largest crop of the requested aspect ratio the source can supply.
    ///
    /// ```
    /// use ampstory_content::models::FilterSpec;
    /// assert_eq!(FilterSpec::POSTER_PORTRAIT.target_size(1280, 1706), (640, 853));
    /// assert_eq!(FilterSpec::Max { width: 100, height: 100 }.target_size(400, 200), (100, 50));
    /// assert_eq!(FilterSpec::Width(800).target_size(400, 200), (400, 200));
    /// ```
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |value: u32, factor: f64| ((f64::from(value) * factor).round() as u32).max(1);
        let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
        match *self {
            FilterSpec::Original => (width, height),
            FilterSpec::Fill { width: tw, height: th } => {
                let factor = (w / f64::from(tw)).min(h / f64::from(th)).min(1.0);
                (scale(tw, factor), scale(th, factor))
            },
            FilterSpec::Max { width: mw, height: mh } => {
                let factor = (f64::from(mw) / w).min(f64::from(mh) / h).min(1.0);
                (scale(width, factor), scale(height, factor))
            },
            FilterSpec::Width(target) => {
                let factor = (f64::from(target) / w).min(1.0);
                (scale(width, factor), scale(height, factor))
            },
            FilterSpec::Height(target) => {
                let factor = (f64::from(target) / h).min(1.0);
                (scale(width, factor), scale(height, factor))
            },
        }
    }
}

impl Display for FilterSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FilterSpec::Original => write!(f, "original"),
            FilterSpec::Fill { width, height } => write!(f, "fill-{width}x{height}"),
            FilterSpec::Max { width, height } => write!(f, "max-{width}x{height}"),
            FilterSpec::Width(width) => write!(f, "width-{width}"),
            FilterSpec::Height(height) => write!(f, "height-{height}"),
        }
    }
}

impl FromStr for FilterSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::from(ErrorKind::InvalidFilterSpec(s.to_string()));
        let positive = |value: &str| value.parse::<u32>().ok().filter(|v| *v > 0);
        let pair = |value: &str| {
            let (width, height) = value.split_once('x')?;
            Some((positive(width)?, positive(height)?))
        };
        if s == "original" {
            return Ok(FilterSpec::Original);
        }
        let (operation, argument) = s.split_once('-').ok_or_else(invalid)?;
        let spec = match operation {
            "fill" => pair(argument).map(|(width, height)| FilterSpec::Fill { width, height }),
            "max" => pair(argument).map(|(width, height)| FilterSpec::Max { width, height }),
            "width" => positive(argument).map(FilterSpec::Width),
            "height" => positive(argument).map(FilterSpec::Height),
            _ => None,
        };
        spec.ok_or_else(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("original", FilterSpec::Original)]
    #[case("fill-640x853", FilterSpec::POSTER_PORTRAIT)]
    #[case("fill-853x640", FilterSpec::POSTER_LANDSCAPE)]
    #[case("max-800x600", FilterSpec::Max { width: 800, height: 600 })]
    #[case("width-320", FilterSpec::Width(320))]
    #[case("height-240", FilterSpec::Height(240))]
    fn test_parse(#[case] text: &str, #[case] expected: FilterSpec) {
        assert_eq!(text.parse::<FilterSpec>().unwrap(), expected);
        assert_eq!(expected.to_string(), text);
    }

    #[rstest]
    #[case("")]
    #[case("fill")]
    #[case("fill-640")]
    #[case("fill-0x10")]
    #[case("max-axb")]
    #[case("width--5")]
    #[case("scale-50")]
    #[case("Original")]
    fn test_parse_invalid(#[case] text: &str) {
        let err = text.parse::<FilterSpec>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidFilterSpec(_)));
    }

    #[rstest]
    #[case(FilterSpec::Original, (640, 480), (640, 480))]
    #[case(FilterSpec::POSTER_SQUARE, (640, 480), (480, 480))]
    #[case(FilterSpec::POSTER_SQUARE, (2000, 1000), (640, 640))]
    #[case(FilterSpec::PUBLISHER_LOGO, (64, 64), (64, 64))]
    #[case(FilterSpec::Max { width: 320, height: 320 }, (640, 480), (320, 240))]
    #[case(FilterSpec::Width(320), (640, 480), (320, 240))]
    #[case(FilterSpec::Height(120), (640, 480), (160, 120))]
    fn test_target_size(#[case] spec: FilterSpec, #[case] source: (u32, u32), #[case] expected: (u32, u32)) {
        assert_eq!(spec.target_size(source.0, source.1), expected);
    }
}
