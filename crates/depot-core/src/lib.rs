#![deny(missing_docs)]

//! # depot-core: Foundational Types for the depot Repository
//!
//! This crate defines the path model every other crate in the workspace builds
//! on. It has no internal crate dependencies and touches no filesystem state:
//! everything here is a pure function of its inputs.
//!
//! ## Design Principles
//!
//! 1. **One normalization routine.** Request paths and token permission
//!    prefixes both flow through [`normalize_segments`], so the resolver and
//!    the authorization layer can never disagree about what a path means.
//!
//! 2. **[`ArtifactLocation`] cannot point outside its root.** The only way to
//!    build one is through [`RepositoryResolver::resolve`] or
//!    [`ArtifactLocation::join`], both of which reject `..` sequences that
//!    would climb above the repository root.
//!
//! 3. **Existence is someone else's problem.** Resolution never stats the
//!    filesystem; callers check existence separately.

pub mod error;
pub mod location;

pub use error::InvalidPath;
pub use location::{
    is_hidden_name, normalize_segments, ArtifactLocation, RepositoryResolver, METADATA_FILE_NAME,
};
