//! Attribute paths -- the dotted name sequences that identify variables,
//! scoreboards and generated files throughout the compiler.
//!
//! A path is an ordered, non-empty list of segments. The same path renders
//! two ways: dot-joined for variable/objective names, slash-joined (with a
//! project prefix) for file references inside commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-empty sequence of name segments. Segments never contain the `.` or
/// `/` separators; constructing an empty path is a programming error, so the
/// constructors take at least one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributePath {
    segments: Vec<String>,
}

impl AttributePath {
    /// Single-segment path.
    pub fn new(segment: impl Into<String>) -> Self {
        AttributePath {
            segments: vec![segment.into()],
        }
    }

    /// Build from a list of segments. Panics on an empty list -- callers
    /// always know their segment count statically.
    pub fn from_segments(segments: Vec<String>) -> Self {
        assert!(!segments.is_empty(), "attribute path cannot be empty");
        AttributePath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment -- the bare name.
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .expect("attribute path is never empty")
    }

    /// All segments except the last -- the directory part of a file path.
    pub fn dir_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Dot-joined textual form, used for variable and objective names.
    pub fn to_dotted(&self) -> String {
        self.segments.join(".")
    }

    /// A new path with `prefix` segments prepended.
    pub fn prefixed(&self, prefix: &[String]) -> Self {
        let mut segments = prefix.to_vec();
        segments.extend(self.segments.iter().cloned());
        AttributePath { segments }
    }

    /// A new path with one segment appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        AttributePath { segments }
    }

    /// A new path whose last segment carries an extra suffix.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut segments = self.segments.clone();
        let last = segments.last_mut().expect("attribute path is never empty");
        last.push_str(suffix);
        AttributePath { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl From<&str> for AttributePath {
    fn from(name: &str) -> Self {
        if name.contains('.') {
            AttributePath::from_segments(name.split('.').map(str::to_owned).collect())
        } else {
            AttributePath::new(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_dotted() {
        let p = AttributePath::from_segments(vec!["ns".into(), "x".into()]);
        assert_eq!(p.name(), "x");
        assert_eq!(p.to_dotted(), "ns.x");
        assert_eq!(p.dir_segments(), &["ns".to_string()]);
    }

    #[test]
    fn test_prefixed_and_suffix() {
        let p = AttributePath::new("x");
        let q = p.prefixed(&["main".to_string()]);
        assert_eq!(q.to_dotted(), "main.x");
        assert_eq!(q.with_suffix("--0").to_dotted(), "main.x--0");
        // original path untouched
        assert_eq!(p.to_dotted(), "x");
    }

    #[test]
    fn test_equality_is_segment_equality() {
        let a = AttributePath::from("a.b");
        let b = AttributePath::from_segments(vec!["a".into(), "b".into()]);
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic]
    fn test_empty_path_panics() {
        AttributePath::from_segments(vec![]);
    }
}
