//! # maven-metadata.xml
//!
//! For the directory `/com/example/lib` the document reads:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <metadata>
//!   <groupId>com.example</groupId>
//!   <artifactId>lib</artifactId>
//!   <versioning>
//!     <latest>1.1-SNAPSHOT</latest>
//!     <release>1.0</release>
//!     <versions>
//!       <version>1.0</version>
//!       <version>1.1-SNAPSHOT</version>
//!     </versions>
//!   </versioning>
//! </metadata>
//! ```
//!
//! Nothing time-dependent goes into the document, so an unchanged listing
//! always renders to the same bytes.

use depot_core::ArtifactLocation;
use serde::{Deserialize, Serialize};

use crate::error::MetadataError;
use crate::version::Version;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Index document for one artifact directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "metadata")]
pub struct MavenMetadata {
    #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    pub versioning: Versioning,
}

/// The `<versioning>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioning {
    pub latest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    pub versions: Versions,
}

/// The `<versions>` list, ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    #[serde(default)]
    pub version: Vec<String>,
}

impl MavenMetadata {
    /// Build the document for `directory` from the versions found beneath it.
    ///
    /// The last segment is the artifact id, the preceding ones joined with `.`
    /// form the group id. Versions are sorted and deduplicated here.
    pub fn from_listing(
        directory: &ArtifactLocation,
        mut versions: Vec<Version>,
    ) -> Result<Self, MetadataError> {
        let segments = directory.segments();
        let Some((artifact_id, group)) = segments.split_last() else {
            return Err(MetadataError::NotFound(directory.uri()));
        };
        versions.sort();
        versions.dedup();
        let Some(latest) = versions.last() else {
            return Err(MetadataError::NotFound(directory.uri()));
        };
        let release = versions.iter().rev().find(|v| !v.is_snapshot());

        Ok(Self {
            group_id: (!group.is_empty()).then(|| group.join(".")),
            artifact_id: artifact_id.clone(),
            versioning: Versioning {
                latest: latest.to_string(),
                release: release.map(Version::to_string),
                versions: Versions {
                    version: versions.iter().map(Version::to_string).collect(),
                },
            },
        })
    }

    /// Render with an XML declaration and two-space indentation.
    pub fn to_xml(&self) -> Result<String, MetadataError> {
        let mut out = String::from(XML_DECLARATION);
        let mut serializer = quick_xml::se::Serializer::new(&mut out);
        serializer.indent(' ', 2);
        self.serialize(serializer)
            .map_err(|e| MetadataError::Serialize(e.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}
