//! Path validation and naming helpers.
//!
//! Every path handed to a backend is relative to the backend root. File names
//! often come straight from a remote URL, so they are never trusted.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path and returns it in normalized form.
///
/// Rejects anything that would escape the storage root (`..` past the root),
/// platform prefixes, null bytes, and paths that normalize to nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ampstory_storage::validate_path;
/// assert!(validate_path("original_images/wagtail.jpg").is_ok());
/// assert!(validate_path("images/../media/clip.mp4").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("./images//./wagtail.original.png/").unwrap(),
///     Path::new("images/wagtail.original.png")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Returns the `n`th alternative name for a path that is already taken.
///
/// The counter goes between the file stem and the extension, so
/// `media/clip.mp4` becomes `media/clip_2.mp4`. A counter of `0` or `1`
/// returns the path unchanged.
///
/// ```
/// use std::path::Path;
/// use ampstory_storage::suffixed_path;
/// assert_eq!(suffixed_path("media/clip.mp4", 2), Path::new("media/clip_2.mp4"));
/// assert_eq!(suffixed_path("images/logo", 3), Path::new("images/logo_3"));
/// assert_eq!(suffixed_path("images/logo.png", 1), Path::new("images/logo.png"));
/// ```
pub fn suffixed(path: impl AsRef<Path>, n: usize) -> PathBuf {
    let path = path.as_ref();
    if n < 2 {
        return path.to_path_buf();
    }
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{n}"),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate(Path::new("images/photo.jpg")).unwrap(), Path::new("images/photo.jpg"));
        assert_eq!(validate(Path::new("a/b/c/file.png")).unwrap(), Path::new("a/b/c/file.png"));
        assert_eq!(validate(Path::new("clip.mp4")).unwrap(), Path::new("clip.mp4"));
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(validate(Path::new("a//b//c")).unwrap(), Path::new("a/b/c"));
        assert_eq!(validate(Path::new("a/./b/./c")).unwrap(), Path::new("a/b/c"));
        assert_eq!(validate(Path::new("/media/clip.mp4")).unwrap(), Path::new("media/clip.mp4"));
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate(Path::new("../etc/passwd")).is_err());
        assert!(validate(Path::new("a/../../b")).is_err());
        assert!(validate(Path::new("..")).is_err());
        assert_eq!(validate(Path::new("a/b/..")).unwrap(), Path::new("a"));
    }

    #[test]
    fn test_invalid_and_empty() {
        assert!(validate(Path::new("a\0b")).is_err());
        assert!(validate(Path::new("")).is_err());
        assert!(validate(Path::new("./")).is_err());
        assert!(validate(Path::new("//")).is_err());
    }

    #[test]
    fn test_suffixed_keeps_directory() {
        assert_eq!(suffixed("original_images/a.b.jpg", 4), Path::new("original_images/a.b_4.jpg"));
        assert_eq!(suffixed("x", 2), Path::new("x_2"));
    }
}
