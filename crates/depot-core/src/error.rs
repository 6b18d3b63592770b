//! # Path Errors
//!
//! A request path that cannot be mapped into the repository is always a
//! client mistake. Callers translate [`InvalidPath`] into a 4xx response and
//! never into a server fault.

use thiserror::Error;

/// Failure to map a request path onto an artifact location.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPath {
    /// A `..` segment would climb above the repository root.
    #[error("path escapes the repository root: \"{0}\"")]
    EscapesRoot(String),

    /// The path contains bytes or escapes that cannot name a file.
    #[error("malformed path \"{path}\": {reason}")]
    Malformed {
        /// The path as received.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl InvalidPath {
    pub(crate) fn malformed(path: &str, reason: &'static str) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_root_display_names_the_path() {
        let err = InvalidPath::EscapesRoot("/../etc/passwd".into());
        assert!(err.to_string().contains("/../etc/passwd"));
    }

    #[test]
    fn malformed_display_carries_reason() {
        let err = InvalidPath::malformed("/a%zz", "invalid percent escape");
        let msg = err.to_string();
        assert!(msg.contains("/a%zz"));
        assert!(msg.contains("invalid percent escape"));
    }
}
