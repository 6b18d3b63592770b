//! # Authorization Errors
//!
//! [`AuthError`] is what a caller sees; it deliberately does not say whether
//! an alias exists. [`TokenStoreError`] is what an operator sees while
//! loading or editing the token file.

use depot_core::InvalidPath;
use thiserror::Error;

/// Failure to turn an inbound credential into a session.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was supplied.
    #[error("missing credential")]
    MissingCredential,

    /// The token is unknown, the secret does not match, or the header is unreadable.
    #[error("invalid credential")]
    InvalidCredential,

    /// The token exists and the secret matches, but the token is deactivated.
    #[error("token is disabled")]
    Disabled,
}

/// Errors loading, saving or editing the token store.
#[derive(Error, Debug)]
pub enum TokenStoreError {
    /// Reading or writing the token file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The token file is not valid YAML for the expected schema.
    #[error("token file is malformed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Two tokens share an alias.
    #[error("token alias already exists: \"{0}\"")]
    DuplicateAlias(String),

    /// No token has this alias.
    #[error("no token with alias \"{0}\"")]
    UnknownAlias(String),

    /// The alias cannot be used in a credential.
    #[error("invalid token alias \"{alias}\": {reason}")]
    InvalidAlias {
        /// The rejected alias.
        alias: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The permission prefix does not normalize to a path inside the repository.
    #[error("invalid permission prefix: {0}")]
    InvalidPrefix(#[from] InvalidPath),
}
