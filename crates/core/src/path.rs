//! Path handling
//!
//! Logical paths are what callers see; physical keys are what the bucket
//! stores. [`PathPrefixer`] converts between the two by applying the root
//! prefix configured for an adapter. The module also carries the path
//! splitting helpers used by metadata normalization and the `disk/path`
//! syntax used on the command line.

use crate::error::{Error, Result};

/// Delimiter used to project the flat key namespace onto directories
pub const DELIMITER: char = '/';

/// Translates between logical paths and physical object keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    prefix: String,
}

impl PathPrefixer {
    /// Create a prefixer for the given root prefix.
    ///
    /// Empty segments are dropped and a non-empty prefix always ends with a
    /// single delimiter, so `"/uploads//"` and `"uploads"` are equivalent.
    pub fn new(prefix: &str) -> Self {
        let segments: Vec<&str> = prefix.split(DELIMITER).filter(|s| !s.is_empty()).collect();
        let prefix = if segments.is_empty() {
            String::new()
        } else {
            format!("{}{DELIMITER}", segments.join("/"))
        };
        Self { prefix }
    }

    /// The normalized prefix (empty, or ending with the delimiter)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Map a logical path to the key sent to the backend
    pub fn to_physical(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path.trim_start_matches(DELIMITER))
    }

    /// Map a backend key back to a logical path.
    ///
    /// A key outside the prefix is returned unchanged.
    pub fn to_logical(&self, key: &str) -> String {
        key.strip_prefix(self.prefix.as_str())
            .unwrap_or(key)
            .to_string()
    }
}

/// Components of a path, as reported in normalized metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathInfo {
    pub dirname: String,
    pub basename: String,
    pub filename: String,
    pub extension: Option<String>,
}

/// Parent directory of a logical path; empty at the root
pub fn dirname(path: &str) -> String {
    let trimmed = path.trim_end_matches(DELIMITER);
    match trimmed.rfind(DELIMITER) {
        Some(pos) => trimmed[..pos].trim_end_matches(DELIMITER).to_string(),
        None => String::new(),
    }
}

/// Split a path into dirname, basename, filename and extension
pub fn path_info(path: &str) -> PathInfo {
    let trimmed = path.trim_end_matches(DELIMITER);
    let basename = match trimmed.rfind(DELIMITER) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    };

    let (filename, extension) = match basename.rfind('.') {
        Some(pos) if pos > 0 => (&basename[..pos], Some(basename[pos + 1..].to_string())),
        _ => (basename, None),
    };

    PathInfo {
        dirname: dirname(path),
        basename: basename.to_string(),
        filename: filename.to_string(),
        extension,
    }
}

/// A `disk/path` reference given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskPath {
    /// Name of the configured disk
    pub disk: String,
    /// Logical path inside the disk (empty for the disk root)
    pub path: String,
}

impl std::fmt::Display for DiskPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.disk)
        } else {
            write!(f, "{}/{}", self.disk, self.path)
        }
    }
}

/// Parse a `disk[/path]` reference
pub fn parse_disk_path(input: &str) -> Result<DiskPath> {
    if input.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    let (disk, path) = match input.split_once(DELIMITER) {
        Some((disk, path)) => (disk, path),
        None => (input, ""),
    };

    if !is_valid_disk_name(disk) {
        return Err(Error::InvalidPath(format!(
            "'{input}' does not start with a disk name. Use format: disk[/path]"
        )));
    }

    Ok(DiskPath {
        disk: disk.to_string(),
        path: path.trim_start_matches(DELIMITER).to_string(),
    })
}

/// Check if a string is a valid disk name
pub fn is_valid_disk_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixer_normalizes_prefix() {
        assert_eq!(PathPrefixer::new("").prefix(), "");
        assert_eq!(PathPrefixer::new("/").prefix(), "");
        assert_eq!(PathPrefixer::new("uploads").prefix(), "uploads/");
        assert_eq!(PathPrefixer::new("/uploads//").prefix(), "uploads/");
        assert_eq!(PathPrefixer::new("a//b/").prefix(), "a/b/");
    }

    #[test]
    fn test_to_physical() {
        let prefixer = PathPrefixer::new("uploads");
        assert_eq!(prefixer.to_physical("a.txt"), "uploads/a.txt");
        assert_eq!(prefixer.to_physical("/a.txt"), "uploads/a.txt");
        assert_eq!(prefixer.to_physical(""), "uploads/");

        let bare = PathPrefixer::new("");
        assert_eq!(bare.to_physical("dir/a.txt"), "dir/a.txt");
    }

    #[test]
    fn test_to_logical_outside_prefix() {
        let prefixer = PathPrefixer::new("uploads");
        assert_eq!(prefixer.to_logical("uploads/a.txt"), "a.txt");
        assert_eq!(prefixer.to_logical("other/a.txt"), "other/a.txt");
    }

    #[test]
    fn test_round_trip() {
        for prefix in ["", "root", "deep/root/"] {
            let prefixer = PathPrefixer::new(prefix);
            for path in ["", "a.txt", "img.png", "no-delimiter", "unicode-文件"] {
                assert_eq!(prefixer.to_logical(&prefixer.to_physical(path)), path);
            }
        }
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("a/b/c.txt"), "a/b");
        assert_eq!(dirname("a/b/"), "a");
        assert_eq!(dirname("c.txt"), "");
        assert_eq!(dirname(""), "");
    }

    #[test]
    fn test_path_info() {
        let info = path_info("img/photo.large.png");
        assert_eq!(info.dirname, "img");
        assert_eq!(info.basename, "photo.large.png");
        assert_eq!(info.filename, "photo.large");
        assert_eq!(info.extension.as_deref(), Some("png"));

        let info = path_info("a/b/");
        assert_eq!(info.basename, "b");
        assert_eq!(info.dirname, "a");
        assert!(info.extension.is_none());

        let info = path_info(".env");
        assert_eq!(info.filename, ".env");
        assert!(info.extension.is_none());
    }

    #[test]
    fn test_parse_disk_path() {
        let path = parse_disk_path("uploads/img/a.png").unwrap();
        assert_eq!(path.disk, "uploads");
        assert_eq!(path.path, "img/a.png");
        assert_eq!(path.to_string(), "uploads/img/a.png");

        let root = parse_disk_path("uploads").unwrap();
        assert_eq!(root.path, "");
        assert_eq!(root.to_string(), "uploads");
    }

    #[test]
    fn test_parse_disk_path_invalid() {
        assert!(parse_disk_path("").is_err());
        assert!(parse_disk_path("/abs/path").is_err());
        assert!(parse_disk_path("bad.name/x").is_err());
    }
}
