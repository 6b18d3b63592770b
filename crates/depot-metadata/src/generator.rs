//! # Document Generation
//!
//! [`MetadataGenerator`] is the seam between the cache and whatever derives a
//! document. [`FsGenerator`] derives it from the directory listing:
//!
//! - an immediate subdirectory holding at least one regular file contributes
//!   its name as a version;
//! - a file `{artifactId}-{version}.{ext}` directly in the directory
//!   contributes `{version}`, with a trailing `-sources`, `-javadoc` or
//!   `-tests` classifier removed.
//!
//! Index documents, checksum files, signatures and hidden entries (such as
//! uploads still being written) never contribute.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use depot_core::{is_hidden_name, ArtifactLocation};

use crate::document::MavenMetadata;
use crate::error::MetadataError;
use crate::version::Version;

const IGNORED_EXTENSIONS: &[&str] = &["md5", "sha1", "sha256", "sha512", "asc"];
const CLASSIFIERS: &[&str] = &["-sources", "-javadoc", "-tests"];

/// Produces the index document for a directory.
pub trait MetadataGenerator: Send + Sync + 'static {
    /// Build the document for `directory` from its current state.
    fn generate(&self, directory: &ArtifactLocation) -> Result<MavenMetadata, MetadataError>;
}

/// Scans the filesystem under the repository root.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsGenerator;

impl MetadataGenerator for FsGenerator {
    fn generate(&self, directory: &ArtifactLocation) -> Result<MavenMetadata, MetadataError> {
        let Some(artifact_id) = directory.file_name() else {
            return Err(MetadataError::NotFound(directory.uri()));
        };
        let path = directory.to_path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(MetadataError::NotFound(directory.uri())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MetadataError::NotFound(directory.uri()))
            }
            Err(e) => return Err(e.into()),
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_hidden_name(&name) {
                continue;
            }
            if file_type.is_dir() {
                if holds_a_file(&entry.path())? {
                    versions.push(Version::parse(&name));
                }
            } else if file_type.is_file() {
                if let Some(version) = version_from_file_name(artifact_id, &name) {
                    versions.push(Version::parse(version));
                }
            }
        }
        tracing::debug!(directory = %directory, versions = versions.len(), "scanned directory");
        MavenMetadata::from_listing(directory, versions)
    }
}

fn holds_a_file(dir: &Path) -> Result<bool, MetadataError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_str().map_or(true, is_hidden_name);
        if !hidden && entry.file_type()?.is_file() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn version_from_file_name<'a>(artifact_id: &str, name: &'a str) -> Option<&'a str> {
    if name.contains("maven-metadata") {
        return None;
    }
    let (stem, extension) = name.rsplit_once('.')?;
    if IGNORED_EXTENSIONS.contains(&extension) {
        return None;
    }
    let mut version = stem.strip_prefix(artifact_id)?.strip_prefix('-')?;
    for classifier in CLASSIFIERS {
        if let Some(stripped) = version.strip_suffix(classifier) {
            version = stripped;
            break;
        }
    }
    (!version.is_empty()).then_some(version)
}
