//! # depot-metadata: Generated Index Documents
//!
//! Every artifact directory has a `maven-metadata.xml` that is derived from
//! the directory listing and never stored by clients.
//!
//! - [`version`]: Maven-style version ordering.
//! - [`document`]: the [`MavenMetadata`] model and its XML rendering.
//! - [`generator`]: the [`MetadataGenerator`] seam and the filesystem scanner.
//! - [`cache`]: [`MetadataCache`], one lock per directory.
//! - [`checksum`]: `.sha256`/`.sha512` companions of a document.
//!
//! ## Consistency
//!
//! A cached document is valid until the next write beneath its directory.
//! Writers call [`MetadataCache::invalidate`] after their files are in place;
//! the next [`MetadataCache::get`] rebuilds from the current listing.

pub mod cache;
pub mod checksum;
pub mod document;
pub mod error;
pub mod generator;
pub mod version;

pub use cache::{MetadataCache, MetadataDocument};
pub use checksum::{classify, ChecksumKind, MetadataRequest};
pub use document::MavenMetadata;
pub use error::MetadataError;
pub use generator::{FsGenerator, MetadataGenerator};
pub use version::Version;
