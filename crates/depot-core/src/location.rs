//! # Repository Path Resolver
//!
//! Maps HTTP request paths onto [`ArtifactLocation`]s beneath a configured
//! repository root.
//!
//! ## Normalization
//!
//! 1. Percent escapes are decoded first, so `%2e%2e` is treated exactly like
//!    `..` and cannot smuggle a traversal past the segment check.
//! 2. NUL bytes, backslashes and `:` inside a segment are rejected; none of
//!    them can appear in a Maven-style repository path, and each can change
//!    how the platform interprets a joined path.
//! 3. Empty and `.` segments are dropped. `..` removes the previous segment;
//!    a `..` with nothing left to remove is an [`InvalidPath::EscapesRoot`].
//!
//! The mapping is a pure function of `(root, request_path)`. Nothing in this
//! module reads the filesystem.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::error::InvalidPath;

/// File name of the generated per-directory index document.
pub const METADATA_FILE_NAME: &str = "maven-metadata.xml";

/// Decode `%XX` escapes. A `%` not followed by two hex digits is malformed.
fn percent_decode(path: &str) -> Result<String, InvalidPath> {
    let bytes = path.as_bytes();
    let stray = path.match_indices('%').any(|(i, _)| {
        !bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if stray {
        return Err(InvalidPath::malformed(path, "invalid percent escape"));
    }
    percent_decode_str(path)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| InvalidPath::malformed(path, "percent escapes do not decode to UTF-8"))
}

/// Apply `path` on top of `base`, returning the resulting segment list.
fn normalize_onto(base: &[String], path: &str) -> Result<Vec<String>, InvalidPath> {
    let decoded = percent_decode(path)?;
    if decoded.contains('\0') {
        return Err(InvalidPath::malformed(path, "contains a NUL byte"));
    }
    if decoded.contains('\\') {
        return Err(InvalidPath::malformed(path, "contains a backslash"));
    }

    let mut segments = base.to_vec();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(InvalidPath::EscapesRoot(path.to_string()));
                }
            }
            s if s.contains(':') => {
                return Err(InvalidPath::malformed(path, "segment contains ':'"));
            }
            s => segments.push(s.to_string()),
        }
    }
    Ok(segments)
}

/// Whether a directory entry name is hidden (starts with `.`).
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Normalize a slash-separated path into its segments.
///
/// `"/a//b/./c/../d/"` becomes `["a", "b", "d"]`. Used for request paths and
/// for token permission prefixes alike.
pub fn normalize_segments(path: &str) -> Result<Vec<String>, InvalidPath> {
    normalize_onto(&[], path)
}

/// A canonical location inside a repository root.
///
/// Two locations are equal iff they share a root and a segment list; the
/// trailing-slash hint recorded at resolution time does not take part in
/// equality or hashing.
#[derive(Debug, Clone)]
pub struct ArtifactLocation {
    root: PathBuf,
    segments: Vec<String>,
    directory_hint: bool,
}

impl ArtifactLocation {
    /// The repository root this location lives under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalized path segments relative to the root.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this location is the repository root itself.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the request path ended in `/` (or named the root).
    pub fn is_directory_hint(&self) -> bool {
        self.directory_hint
    }

    /// Segments joined with `/`, without a leading slash.
    pub fn relative_path(&self) -> String {
        self.segments.join("/")
    }

    /// Canonical request form: leading slash, no trailing slash, `/` for the root.
    pub fn uri(&self) -> String {
        format!("/{}", self.relative_path())
    }

    /// On-disk path designated by this location.
    pub fn to_path(&self) -> PathBuf {
        let mut path = self.root.clone();
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }

    /// Last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Whether any segment is a dot-file name such as `.depot-upload-x1`.
    ///
    /// Hidden entries are in-flight uploads or local bookkeeping; they are
    /// neither served nor listed.
    pub fn is_hidden(&self) -> bool {
        self.segments.iter().any(|s| is_hidden_name(s))
    }

    /// The enclosing directory, or `None` for the root.
    pub fn parent(&self) -> Option<ArtifactLocation> {
        if self.segments.is_empty() {
            return None;
        }
        Some(ArtifactLocation {
            root: self.root.clone(),
            segments: self.segments[..self.segments.len() - 1].to_vec(),
            directory_hint: true,
        })
    }

    /// Resolve a relative path against this location.
    ///
    /// `..` may climb out of this location but never out of the root.
    pub fn join(&self, relative: &str) -> Result<ArtifactLocation, InvalidPath> {
        let segments = normalize_onto(&self.segments, relative)?;
        Ok(ArtifactLocation {
            root: self.root.clone(),
            segments,
            directory_hint: relative.ends_with('/'),
        })
    }

    /// Whether `prefix` is a leading run of whole segments of this location.
    pub fn starts_with_segments(&self, prefix: &[String]) -> bool {
        self.segments.len() >= prefix.len()
            && self.segments.iter().zip(prefix).all(|(a, b)| a == b)
    }

    /// Whether this location names a generated index document.
    pub fn is_metadata_document(&self) -> bool {
        self.file_name() == Some(METADATA_FILE_NAME)
    }
}

impl PartialEq for ArtifactLocation {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.segments == other.segments
    }
}

impl Eq for ArtifactLocation {}

impl Hash for ArtifactLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        self.segments.hash(state);
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Resolves request paths against one repository root.
#[derive(Debug, Clone)]
pub struct RepositoryResolver {
    root: PathBuf,
}

impl RepositoryResolver {
    /// Create a resolver for the given root. The directory need not exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The configured repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the root directory itself.
    pub fn root_location(&self) -> ArtifactLocation {
        ArtifactLocation {
            root: self.root.clone(),
            segments: Vec::new(),
            directory_hint: true,
        }
    }

    /// Map a request path to a location under the root.
    pub fn resolve(&self, request_path: &str) -> Result<ArtifactLocation, InvalidPath> {
        let segments = normalize_segments(request_path)?;
        let directory_hint = segments.is_empty() || request_path.ends_with('/');
        Ok(ArtifactLocation {
            root: self.root.clone(),
            segments,
            directory_hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> RepositoryResolver {
        RepositoryResolver::new("/srv/repo")
    }

    #[test]
    fn dot_segments_mark_hidden_locations() {
        assert!(resolver().resolve("/g/a/1.0/.depot-upload-x1").unwrap().is_hidden());
        assert!(resolver().resolve("/g/.cache/a.jar").unwrap().is_hidden());
        assert!(!resolver().resolve("/g/a/1.0/a-1.0.jar").unwrap().is_hidden());
        assert!(!resolver().resolve("/g/./a/../a.jar").unwrap().is_hidden());
    }

    #[test]
    fn resolves_plain_artifact_path() {
        let loc = resolver().resolve("/groupA/lib/1.0/lib-1.0.jar").unwrap();
        assert_eq!(loc.segments(), ["groupA", "lib", "1.0", "lib-1.0.jar"]);
        assert_eq!(loc.uri(), "/groupA/lib/1.0/lib-1.0.jar");
        assert_eq!(
            loc.to_path(),
            PathBuf::from("/srv/repo/groupA/lib/1.0/lib-1.0.jar")
        );
        assert!(!loc.is_directory_hint());
    }

    #[test]
    fn collapses_empty_and_dot_segments() {
        let loc = resolver().resolve("//a/./b///c/").unwrap();
        assert_eq!(loc.uri(), "/a/b/c");
        assert!(loc.is_directory_hint());
    }

    #[test]
    fn inner_parent_segments_stay_inside_root() {
        let loc = resolver().resolve("/a/b/../c").unwrap();
        assert_eq!(loc.uri(), "/a/c");
        let loc = resolver().resolve("/a/..").unwrap();
        assert!(loc.is_root());
    }

    #[test]
    fn rejects_escape_above_root() {
        for path in ["/..", "/../etc/passwd", "/a/../../b", "..", "a/b/../../../c"] {
            assert!(
                matches!(resolver().resolve(path), Err(InvalidPath::EscapesRoot(_))),
                "{path} should escape"
            );
        }
    }

    #[test]
    fn rejects_encoded_escape() {
        let err = resolver().resolve("/%2e%2e/secret").unwrap_err();
        assert!(matches!(err, InvalidPath::EscapesRoot(_)));
        let err = resolver().resolve("/a%2F..%2F..%2Fb").unwrap_err();
        assert!(matches!(err, InvalidPath::EscapesRoot(_)));
    }

    #[test]
    fn rejects_malformed_escapes() {
        assert!(matches!(
            resolver().resolve("/a%zz"),
            Err(InvalidPath::Malformed { .. })
        ));
        assert!(matches!(
            resolver().resolve("/a%2"),
            Err(InvalidPath::Malformed { .. })
        ));
        assert!(matches!(
            resolver().resolve("/a%+f"),
            Err(InvalidPath::Malformed { .. })
        ));
        assert!(matches!(
            resolver().resolve("/a%ff%fe"),
            Err(InvalidPath::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_backslash_nul_and_colon() {
        for path in ["/a\\..\\b", "/a%00b", "/C:/windows", "/a/b:c"] {
            assert!(
                matches!(resolver().resolve(path), Err(InvalidPath::Malformed { .. })),
                "{path} should be malformed"
            );
        }
    }

    #[test]
    fn decodes_percent_escapes_in_names() {
        let loc = resolver().resolve("/a/lib%20core-1.0.jar").unwrap();
        assert_eq!(loc.file_name(), Some("lib core-1.0.jar"));
    }

    #[test]
    fn root_resolves_to_root_location() {
        let loc = resolver().resolve("/").unwrap();
        assert!(loc.is_root());
        assert_eq!(loc, resolver().root_location());
        assert_eq!(loc.uri(), "/");
        assert!(loc.parent().is_none());
        assert!(loc.file_name().is_none());
    }

    #[test]
    fn parent_drops_last_segment() {
        let loc = resolver().resolve("/g/a/1.0/a-1.0.jar").unwrap();
        let parent = loc.parent().unwrap();
        assert_eq!(parent.uri(), "/g/a/1.0");
        assert_eq!(parent.parent().unwrap().uri(), "/g/a");
    }

    #[test]
    fn join_resolves_relative_names() {
        let dir = resolver().resolve("/g/a/1.0/").unwrap();
        assert_eq!(dir.join("a-1.0.pom").unwrap().uri(), "/g/a/1.0/a-1.0.pom");
        assert_eq!(dir.join("../2.0/a-2.0.pom").unwrap().uri(), "/g/a/2.0/a-2.0.pom");
        assert!(matches!(
            dir.join("../../../../x"),
            Err(InvalidPath::EscapesRoot(_))
        ));
    }

    #[test]
    fn trailing_slash_does_not_affect_identity() {
        let a = resolver().resolve("/g/a/").unwrap();
        let b = resolver().resolve("/g/a").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn starts_with_segments_respects_boundaries() {
        let loc = resolver().resolve("/team-ab/lib.jar").unwrap();
        assert!(!loc.starts_with_segments(&["team-a".to_string()]));
        assert!(loc.starts_with_segments(&["team-ab".to_string()]));
        assert!(loc.starts_with_segments(&[]));
    }

    #[test]
    fn metadata_document_detection() {
        assert!(resolver()
            .resolve("/g/a/maven-metadata.xml")
            .unwrap()
            .is_metadata_document());
        assert!(!resolver()
            .resolve("/g/a/maven-metadata.xml.sha256")
            .unwrap()
            .is_metadata_document());
    }

    #[test]
    fn different_roots_are_different_locations() {
        let a = RepositoryResolver::new("/one").resolve("/x").unwrap();
        let b = RepositoryResolver::new("/two").resolve("/x").unwrap();
        assert_ne!(a, b);
    }
}
