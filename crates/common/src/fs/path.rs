use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol marker accepted (and stripped) at the front of raw paths
pub const PROTOCOL: &str = "box://";

const SEPARATOR: char = '/';

/// A normalized, root-relative path: a sequence of non-empty segments.
///
/// The empty sequence is the configured root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CanonicalPath {
    segments: Vec<String>,
}

impl CanonicalPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from segments that are already known to be clean.
    ///  Empty segments are dropped.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|segment: &String| !segment.is_empty())
                .collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The parent path, `None` for the root
    pub fn parent(&self) -> Option<CanonicalPath> {
        if self.is_root() {
            return None;
        }
        Some(self.prefix(self.segments.len() - 1))
    }

    /// The first `depth` segments of this path
    pub fn prefix(&self, depth: usize) -> CanonicalPath {
        let depth = depth.min(self.segments.len());
        Self {
            segments: self.segments[..depth].to_vec(),
        }
    }

    pub fn join(&self, segment: impl Into<String>) -> CanonicalPath {
        let mut segments = self.segments.clone();
        let segment = segment.into();
        if !segment.is_empty() {
            segments.push(segment);
        }
        Self { segments }
    }

    /// True if `ancestor` is this path or one of its ancestors
    pub fn starts_with(&self, ancestor: &CanonicalPath) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }

    /// True if this path lies strictly below `ancestor`
    pub fn is_inside(&self, ancestor: &CanonicalPath) -> bool {
        self.len() > ancestor.len() && self.starts_with(ancestor)
    }

    /// Swap the leading `old` prefix for `new`, keeping the suffix.
    ///  `None` if this path does not start with `old`.
    pub fn rebase(&self, old: &CanonicalPath, new: &CanonicalPath) -> Option<CanonicalPath> {
        if !self.starts_with(old) {
            return None;
        }
        let mut segments = new.segments.clone();
        segments.extend_from_slice(&self.segments[old.len()..]);
        Some(Self { segments })
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl Serialize for CanonicalPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How child names are compared while walking the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    #[default]
    Exact,
    CaseInsensitive,
}

impl NameMatching {
    pub fn matches(&self, a: &str, b: &str) -> bool {
        match self {
            NameMatching::Exact => a == b,
            NameMatching::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }

    /// Fold a path into the form used for equality under this policy
    pub fn fold(&self, path: &CanonicalPath) -> CanonicalPath {
        match self {
            NameMatching::Exact => path.clone(),
            NameMatching::CaseInsensitive => {
                CanonicalPath::from_segments(path.segments().iter().map(|s| s.to_lowercase()))
            }
        }
    }

    /// True if `path` is `ancestor` or lies below it under this policy
    pub fn within(&self, path: &CanonicalPath, ancestor: &CanonicalPath) -> bool {
        self.fold(path).starts_with(&self.fold(ancestor))
    }

    /// True if `a` and `b` name the same path but are spelled differently
    pub fn is_respelling(&self, a: &CanonicalPath, b: &CanonicalPath) -> bool {
        a != b && self.fold(a) == self.fold(b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path escapes the filesystem root: {0}")]
    EscapesRoot(String),
    #[error("invalid path segment {segment:?} in {path}")]
    InvalidSegment { path: String, segment: String },
}

/// Turns raw user paths into [`CanonicalPath`]s relative to the root
#[derive(Debug, Clone, Default)]
pub struct PathNormalizer {
    root_prefix: CanonicalPath,
    matching: NameMatching,
}

impl PathNormalizer {
    pub fn new(root_prefix: CanonicalPath, matching: NameMatching) -> Self {
        Self {
            root_prefix,
            matching,
        }
    }

    pub fn root_prefix(&self) -> &CanonicalPath {
        &self.root_prefix
    }

    pub fn matching(&self) -> NameMatching {
        self.matching
    }

    /// Normalize a raw path.
    ///
    /// Accepts an optional `box://` marker, `\` or `/` separators, repeated
    ///  and trailing separators, `.` segments, and a leading copy of the
    ///  root prefix. `..` is resolved, but never past the root.
    pub fn normalize(&self, raw: &str) -> Result<CanonicalPath, PathError> {
        let stripped = raw.strip_prefix(PROTOCOL).unwrap_or(raw);
        let unified = stripped.replace('\\', "/");

        let mut parts: Vec<&str> = unified
            .split(SEPARATOR)
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();

        if !self.root_prefix.is_root() && self.has_root_prefix(&parts) {
            parts.drain(..self.root_prefix.len());
        }

        let mut segments: Vec<String> = Vec::with_capacity(parts.len());
        for part in parts {
            if part == ".." {
                if segments.pop().is_none() {
                    return Err(PathError::EscapesRoot(raw.to_string()));
                }
                continue;
            }
            if part.contains('\0') {
                return Err(PathError::InvalidSegment {
                    path: raw.to_string(),
                    segment: part.to_string(),
                });
            }
            segments.push(part.to_string());
        }

        Ok(CanonicalPath { segments })
    }

    /// The path as seen from the store's default root
    pub fn absolute(&self, path: &CanonicalPath) -> CanonicalPath {
        let mut segments = self.root_prefix.segments.clone();
        segments.extend_from_slice(path.segments());
        CanonicalPath { segments }
    }

    fn has_root_prefix(&self, parts: &[&str]) -> bool {
        parts.len() >= self.root_prefix.len()
            && self
                .root_prefix
                .segments()
                .iter()
                .zip(parts)
                .all(|(prefix, part)| self.matching.matches(prefix, part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> CanonicalPath {
        PathNormalizer::default().normalize(s).unwrap()
    }

    #[test]
    fn test_normalize_collapses_separators() {
        let normalizer = PathNormalizer::default();
        let expected = CanonicalPath::from_segments(["Documents", "report.txt"]);

        assert_eq!(normalizer.normalize("Documents/report.txt").unwrap(), expected);
        assert_eq!(normalizer.normalize("/Documents/report.txt").unwrap(), expected);
        assert_eq!(normalizer.normalize("Documents//report.txt/").unwrap(), expected);
        assert_eq!(normalizer.normalize("./Documents/./report.txt").unwrap(), expected);
        assert_eq!(normalizer.normalize("Documents\\report.txt").unwrap(), expected);
        assert_eq!(normalizer.normalize("box://Documents/report.txt").unwrap(), expected);
    }

    #[test]
    fn test_normalize_root() {
        let normalizer = PathNormalizer::default();
        assert!(normalizer.normalize("").unwrap().is_root());
        assert!(normalizer.normalize("/").unwrap().is_root());
        assert!(normalizer.normalize("box://").unwrap().is_root());
        assert!(normalizer.normalize("a/..").unwrap().is_root());
    }

    #[test]
    fn test_normalize_parent_segments() {
        assert_eq!(path("a/b/../c"), CanonicalPath::from_segments(["a", "c"]));
    }

    #[test]
    fn test_normalize_rejects_escape() {
        let normalizer = PathNormalizer::default();
        assert!(matches!(
            normalizer.normalize(".."),
            Err(PathError::EscapesRoot(_))
        ));
        assert!(matches!(
            normalizer.normalize("a/../../b"),
            Err(PathError::EscapesRoot(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_nul() {
        let normalizer = PathNormalizer::default();
        assert!(matches!(
            normalizer.normalize("a/b\0c"),
            Err(PathError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_root_prefix_is_stripped() {
        let prefix = CanonicalPath::from_segments(["All Files", "Work"]);
        let normalizer = PathNormalizer::new(prefix, NameMatching::Exact);

        let stripped = normalizer.normalize("All Files/Work/Documents").unwrap();
        assert_eq!(stripped, CanonicalPath::from_segments(["Documents"]));

        // Paths without the prefix are already root-relative
        let relative = normalizer.normalize("Documents").unwrap();
        assert_eq!(relative, stripped);

        assert!(normalizer.normalize("All Files/Work").unwrap().is_root());
        assert_eq!(normalizer.absolute(&relative).to_string(), "All Files/Work/Documents");

        // ".." may not climb back out through the stripped prefix
        assert!(normalizer.normalize("All Files/Work/..").is_err());
    }

    #[test]
    fn test_root_prefix_case_insensitive() {
        let prefix = CanonicalPath::from_segments(["All Files"]);
        let normalizer = PathNormalizer::new(prefix, NameMatching::CaseInsensitive);
        assert_eq!(
            normalizer.normalize("all files/Docs").unwrap(),
            CanonicalPath::from_segments(["Docs"])
        );
    }

    #[test]
    fn test_path_relations() {
        let a = path("a");
        let ab = path("a/b");
        let abc = path("a/b/c");

        assert!(abc.starts_with(&ab));
        assert!(ab.starts_with(&ab));
        assert!(abc.is_inside(&a));
        assert!(!ab.is_inside(&ab));
        assert!(!path("ab").starts_with(&a));
        assert_eq!(abc.parent(), Some(ab.clone()));
        assert_eq!(CanonicalPath::root().parent(), None);
        assert_eq!(abc.name(), Some("c"));
        assert_eq!(abc.prefix(1), a);
        assert_eq!(
            abc.rebase(&ab, &path("x/y")),
            Some(path("x/y/c"))
        );
        assert_eq!(abc.rebase(&path("z"), &path("x")), None);
        assert_eq!(abc.to_string(), "a/b/c");
    }

    #[test]
    fn test_name_matching() {
        assert!(NameMatching::Exact.matches("Doc", "Doc"));
        assert!(!NameMatching::Exact.matches("Doc", "doc"));
        assert!(NameMatching::CaseInsensitive.matches("Doc", "dOC"));
        assert_eq!(
            NameMatching::CaseInsensitive.fold(&path("A/B")),
            path("a/b")
        );
    }

    #[test]
    fn test_within_and_respelling() {
        let insensitive = NameMatching::CaseInsensitive;
        assert!(insensitive.within(&path("docs/sub/x"), &path("Docs")));
        assert!(!NameMatching::Exact.within(&path("docs/sub/x"), &path("Docs")));

        assert!(insensitive.is_respelling(&path("Docs"), &path("docs")));
        assert!(!insensitive.is_respelling(&path("Docs"), &path("Docs")));
        assert!(!NameMatching::Exact.is_respelling(&path("Docs"), &path("docs")));
    }
}
