//! # Metadata Errors

use thiserror::Error;

/// Errors producing an index document.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The directory is missing or holds nothing a version can be derived from.
    #[error("no versions under {0}")]
    NotFound(String),

    /// Reading the directory listing failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be rendered as XML.
    #[error("XML serialization failed: {0}")]
    Serialize(String),
}
