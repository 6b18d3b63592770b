//! Request classification for generated documents and their checksums.

use depot_core::{ArtifactLocation, METADATA_FILE_NAME};
use sha2::{Digest, Sha256, Sha512};

/// Digest algorithms offered next to an index document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Sha256,
    Sha512,
}

impl ChecksumKind {
    /// File-name extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Lowercase hex digest of `bytes`.
    pub fn hex_digest(self, bytes: &[u8]) -> String {
        match self {
            Self::Sha256 => hex(&Sha256::digest(bytes)),
            Self::Sha512 => hex(&Sha512::digest(bytes)),
        }
    }
}

/// What a request for a generated file asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataRequest {
    Document,
    Checksum(ChecksumKind),
}

/// If `location` names `maven-metadata.xml` or one of its checksums, return
/// the directory the document describes and what was asked for.
pub fn classify(location: &ArtifactLocation) -> Option<(ArtifactLocation, MetadataRequest)> {
    let name = location.file_name()?;
    let request = if name == METADATA_FILE_NAME {
        MetadataRequest::Document
    } else {
        let extension = name.strip_prefix(METADATA_FILE_NAME)?.strip_prefix('.')?;
        [ChecksumKind::Sha256, ChecksumKind::Sha512]
            .into_iter()
            .find(|kind| kind.extension() == extension)
            .map(MetadataRequest::Checksum)?
    };
    Some((location.parent()?, request))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::RepositoryResolver;

    fn loc(path: &str) -> ArtifactLocation {
        RepositoryResolver::new("/srv").resolve(path).unwrap()
    }

    #[test]
    fn document_request_targets_the_enclosing_directory() {
        let (dir, request) = classify(&loc("/g/a/maven-metadata.xml")).unwrap();
        assert_eq!(dir.uri(), "/g/a");
        assert_eq!(request, MetadataRequest::Document);
    }

    #[test]
    fn checksum_requests_are_recognized() {
        let (_, request) = classify(&loc("/g/a/maven-metadata.xml.sha256")).unwrap();
        assert_eq!(request, MetadataRequest::Checksum(ChecksumKind::Sha256));
        let (_, request) = classify(&loc("/g/a/maven-metadata.xml.sha512")).unwrap();
        assert_eq!(request, MetadataRequest::Checksum(ChecksumKind::Sha512));
    }

    #[test]
    fn other_files_are_not_metadata() {
        assert!(classify(&loc("/g/a/a-1.0.jar")).is_none());
        assert!(classify(&loc("/g/a/maven-metadata.xml.md5")).is_none());
        assert!(classify(&loc("/g/a/maven-metadata.xmlsha256")).is_none());
        assert!(classify(&loc("/")).is_none());
    }

    #[test]
    fn digests_match_known_vectors() {
        assert_eq!(
            ChecksumKind::Sha256.hex_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(ChecksumKind::Sha512.hex_digest(b"abc").len(), 128);
        assert!(ChecksumKind::Sha512
            .hex_digest(b"abc")
            .starts_with("ddaf35a193617aba"));
    }
}
