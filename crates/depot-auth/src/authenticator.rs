//! # Authenticator
//!
//! Accepts credentials in the two shapes deploy clients send:
//!
//! ```text
//! Authorization: Basic base64(alias:secret)   (Maven, Gradle, curl -u)
//! Authorization: Bearer alias:secret
//! ```
//!
//! Secret comparison is constant-time. An unknown alias still pays for one
//! hash-and-compare against a decoy, so response timing does not reveal which
//! aliases exist. The authenticator never mutates the store.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::AuthError;
use crate::session::Session;
use crate::store::TokenStore;
use crate::token::SecretHash;

/// An `alias:secret` pair as presented by a caller.
#[derive(Clone)]
pub struct Credential {
    alias: String,
    secret: String,
}

impl Credential {
    /// Build a credential from its parts.
    pub fn new(alias: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            secret: secret.into(),
        }
    }

    /// The alias part.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Parse an `Authorization` header value.
    pub fn from_authorization(header: &str) -> Result<Self, AuthError> {
        let (scheme, value) = header
            .trim()
            .split_once(' ')
            .ok_or(AuthError::InvalidCredential)?;
        let value = value.trim();

        let pair = if scheme.eq_ignore_ascii_case("basic") {
            let decoded = STANDARD
                .decode(value)
                .map_err(|_| AuthError::InvalidCredential)?;
            String::from_utf8(decoded).map_err(|_| AuthError::InvalidCredential)?
        } else if scheme.eq_ignore_ascii_case("bearer") {
            value.to_string()
        } else {
            return Err(AuthError::InvalidCredential);
        };

        match pair.split_once(':') {
            Some((alias, secret)) if !alias.is_empty() && !secret.is_empty() => {
                Ok(Self::new(alias, secret))
            }
            _ => Err(AuthError::InvalidCredential),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("alias", &self.alias)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Verifies credentials against a loaded [`TokenStore`].
#[derive(Debug, Clone)]
pub struct Authenticator {
    store: Arc<TokenStore>,
    decoy: SecretHash,
}

impl Authenticator {
    /// Create an authenticator over a store that will not change while it is in use.
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self {
            store,
            decoy: SecretHash::with_salt([0u8; 16], ""),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Verify a credential and derive a session from its token.
    pub fn authenticate(&self, credential: &Credential) -> Result<Session, AuthError> {
        let Some(token) = self.store.get(&credential.alias) else {
            let _ = self.decoy.verify(&credential.secret);
            tracing::debug!(alias = %credential.alias, "unknown token alias");
            return Err(AuthError::InvalidCredential);
        };
        if !token.secret.verify(&credential.secret) {
            tracing::debug!(alias = %credential.alias, "token secret mismatch");
            return Err(AuthError::InvalidCredential);
        }
        if !token.enabled {
            return Err(AuthError::Disabled);
        }
        Ok(Session::new(token.alias.clone(), token.path.clone()))
    }

    /// Authenticate from an optional `Authorization` header value.
    pub fn authenticate_header(&self, header: Option<&str>) -> Result<Session, AuthError> {
        let header = header.ok_or(AuthError::MissingCredential)?;
        let credential = Credential::from_authorization(header)?;
        self.authenticate(&credential)
    }
}
