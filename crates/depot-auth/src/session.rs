//! # Sessions and Permission Prefixes
//!
//! A [`PermissionPrefix`] is stored in normalized segment form, so the check
//! in [`Session::permits`] is a comparison of whole segments. A token scoped
//! to `/team-a` covers `/team-a` and everything below it, and nothing else.

use std::fmt;

use depot_core::{normalize_segments, ArtifactLocation, InvalidPath};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The subtree a token may write under.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PermissionPrefix {
    segments: Vec<String>,
}

impl PermissionPrefix {
    /// Parse and normalize a prefix such as `/team-a` or `team-a/libs/`.
    pub fn parse(raw: &str) -> Result<Self, InvalidPath> {
        Ok(Self {
            segments: normalize_segments(raw)?,
        })
    }

    /// The prefix covering the whole repository.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Whether this prefix covers the whole repository.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Normalized segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether `location` lies at or below this prefix.
    pub fn covers(&self, location: &ArtifactLocation) -> bool {
        location.starts_with_segments(&self.segments)
    }
}

impl fmt::Display for PermissionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl fmt::Debug for PermissionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionPrefix({self})")
    }
}

impl Serialize for PermissionPrefix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PermissionPrefix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Request-scoped write capability derived from an authenticated token.
#[derive(Debug, Clone)]
pub struct Session {
    alias: String,
    prefix: PermissionPrefix,
}

impl Session {
    pub(crate) fn new(alias: String, prefix: PermissionPrefix) -> Self {
        Self { alias, prefix }
    }

    /// Alias of the token this session was derived from.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The token's permission prefix.
    pub fn prefix(&self) -> &PermissionPrefix {
        &self.prefix
    }

    /// May this session write `location`?
    pub fn permits(&self, location: &ArtifactLocation) -> bool {
        self.prefix.covers(location)
    }

    /// May this session write the request path `path`? Unresolvable paths are denied.
    pub fn permits_path(&self, path: &str) -> bool {
        match normalize_segments(path) {
            Ok(segments) => {
                segments.len() >= self.prefix.segments.len()
                    && segments.iter().zip(&self.prefix.segments).all(|(a, b)| a == b)
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::RepositoryResolver;

    fn session(prefix: &str) -> Session {
        Session::new("ci".into(), PermissionPrefix::parse(prefix).unwrap())
    }

    #[test]
    fn prefix_covers_its_subtree() {
        let s = session("/team-a");
        assert!(s.permits_path("/team-a/lib.jar"));
        assert!(s.permits_path("/team-a"));
        assert!(s.permits_path("/team-a/x/y/z-1.0.jar"));
    }

    #[test]
    fn prefix_stops_at_segment_boundaries() {
        let s = session("/team-a");
        assert!(!s.permits_path("/team-ab/lib.jar"));
        assert!(!s.permits_path("/team/lib.jar"));
        assert!(!s.permits_path("/"));
        let s = session("/lib");
        assert!(!s.permits_path("/library/x.jar"));
    }

    #[test]
    fn prefix_is_normalized_before_comparison() {
        let s = session("team-a//libs/");
        assert_eq!(s.prefix().to_string(), "/team-a/libs");
        assert!(s.permits_path("/team-a/libs/x.jar"));
        assert!(!s.permits_path("/team-a/other/x.jar"));
    }

    #[test]
    fn traversal_cannot_sneak_out_of_prefix() {
        let s = session("/team-a");
        assert!(!s.permits_path("/team-a/../team-b/x.jar"));
        assert!(!s.permits_path("/team-a/../../etc"));
    }

    #[test]
    fn root_prefix_covers_everything() {
        let s = session("/");
        assert!(s.prefix().is_root());
        assert!(s.permits_path("/anything/at/all"));
        assert!(s.permits_path("/"));
    }

    #[test]
    fn permits_location_matches_permits_path() {
        let resolver = RepositoryResolver::new("/srv");
        let s = session("/groupA");
        let inside = resolver.resolve("/groupA/lib/1.0/lib-1.0.jar").unwrap();
        let outside = resolver.resolve("/groupAB/lib/1.0/lib-1.0.jar").unwrap();
        assert!(s.permits(&inside));
        assert!(!s.permits(&outside));
    }

    #[test]
    fn prefix_with_escape_is_rejected() {
        assert!(PermissionPrefix::parse("/../x").is_err());
    }

    #[test]
    fn prefix_serializes_as_string() {
        let prefix = PermissionPrefix::parse("/a/b").unwrap();
        let yaml = serde_yaml::to_string(&prefix).unwrap();
        assert_eq!(yaml.trim(), "/a/b");
        let back: PermissionPrefix = serde_yaml::from_str("a/./b/").unwrap();
        assert_eq!(back, prefix);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9-]{1,8}"
    }

    proptest! {
        /// A path is permitted iff the prefix segments are a leading run of its segments.
        #[test]
        fn permits_is_whole_segment_prefix(
            prefix in prop::collection::vec(segment(), 0..4),
            path in prop::collection::vec(segment(), 0..6),
        ) {
            let s = Session::new("p".into(), PermissionPrefix::parse(&prefix.join("/")).unwrap());
            let expected = path.len() >= prefix.len() && path[..prefix.len()] == prefix[..];
            prop_assert_eq!(s.permits_path(&format!("/{}", path.join("/"))), expected);
        }

        /// Appending characters to the last prefix segment never yields a permitted sibling.
        #[test]
        fn sibling_namespaces_are_denied(
            prefix in prop::collection::vec(segment(), 1..4),
            suffix in "[a-z0-9]{1,4}",
            rest in prop::collection::vec(segment(), 0..3),
        ) {
            let s = Session::new("p".into(), PermissionPrefix::parse(&prefix.join("/")).unwrap());
            let mut sibling = prefix.clone();
            if let Some(last) = sibling.last_mut() {
                last.push_str(&suffix);
            }
            sibling.extend(rest);
            let path = format!("/{}", sibling.join("/"));
            prop_assert!(!s.permits_path(&path), "{} permitted under {}", path, s.prefix());
        }
    }
}
