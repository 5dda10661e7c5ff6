//! Field paths for addressing within documents
//!
//! Dotted paths address values inside a form document; [`PathSegment`] is
//! the typed key/index form used by validation errors.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Separator between path segments
pub const PATH_SEPARATOR: char = '.';

/// Split a dotted path into its raw segments
///
/// The empty path has no segments. Segments are taken verbatim: no
/// trimming, and empty segments are kept, so every reader and writer
/// addresses exactly the same keys.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let mut segments = path.split(PATH_SEPARATOR);
    if path.is_empty() {
        segments.next();
    }
    segments
}

/// Typed segments of a dotted path, numeric segments becoming indices
///
/// ```
/// use cx_path::{parse_segments, PathSegment};
///
/// assert_eq!(
///     parse_segments("items.0"),
///     vec![PathSegment::from("items"), PathSegment::Index(0)]
/// );
/// assert!(parse_segments("").is_empty());
/// ```
#[must_use]
pub fn parse_segments(path: &str) -> Vec<PathSegment> {
    split_path(path).map(PathSegment::parse).collect()
}

/// A single typed path segment
///
/// Serializes untagged, so a path renders as `["items", 0, "price"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array position
    Index(usize),
    /// Object key
    Key(String),
}

impl PathSegment {
    /// Classify a raw segment; all-digit segments become indices
    #[must_use]
    pub fn parse(segment: &str) -> Self {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = segment.parse() {
                return Self::Index(index);
            }
        }
        Self::Key(segment.to_owned())
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Join typed segments into a dotted path string
#[must_use]
pub fn join_segments(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Join an optional base path with a child key
#[must_use]
pub fn join_path(base: Option<&str>, key: &str) -> String {
    match base {
        Some(base) if !base.is_empty() => format!("{base}{PATH_SEPARATOR}{key}"),
        _ => key.to_owned(),
    }
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Segment cannot address an array element
    #[error("segment '{segment}' of '{path}' is not an array index")]
    InvalidIndex { path: String, segment: String },

    /// Index lies past the end of the array
    ///
    /// Writes may append one element at most.
    #[error("index {index} of '{path}' is past the end of an array of length {len}")]
    IndexOutOfRange { path: String, index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_path_keeps_segments_verbatim() {
        assert_eq!(split_path("").count(), 0);
        assert_eq!(split_path("a").collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(split_path("a. b..c").collect::<Vec<_>>(), vec!["a", " b", "", "c"]);
    }

    #[test]
    fn parse_segments_types_indices() {
        assert_eq!(
            parse_segments("items.0.price"),
            vec![
                PathSegment::from("items"),
                PathSegment::Index(0),
                PathSegment::from("price")
            ]
        );
        assert_eq!(
            parse_segments("headers.content-type"),
            vec![PathSegment::from("headers"), PathSegment::from("content-type")]
        );
    }

    #[test]
    fn segment_parse_classifies_indices() {
        assert_eq!(PathSegment::parse("3"), PathSegment::Index(3));
        assert_eq!(PathSegment::parse("x3"), PathSegment::Key("x3".into()));
        assert_eq!(PathSegment::parse(""), PathSegment::Key(String::new()));
    }

    #[test]
    fn segments_serialize_untagged() {
        let segments = vec![PathSegment::from("items"), PathSegment::from(0)];
        let json = serde_json::to_string(&segments).unwrap();
        assert_eq!(json, r#"["items",0]"#);
        assert_eq!(join_segments(&segments), "items.0");
    }

    #[test]
    fn join_path_handles_missing_base() {
        assert_eq!(join_path(None, "a"), "a");
        assert_eq!(join_path(Some(""), "a"), "a");
        assert_eq!(join_path(Some("x.y"), "a"), "x.y.a");
    }
}
