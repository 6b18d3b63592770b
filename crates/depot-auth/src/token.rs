//! # Tokens and Secret Hashes
//!
//! A token secret is shown to the operator exactly once, when it is generated.
//! What gets persisted is a [`SecretHash`]: a random 16-byte salt and
//! `SHA-256(salt || secret)`, written as `sha256:<salt-hex>:<digest-hex>`.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::TokenStoreError;
use crate::session::PermissionPrefix;

const HASH_SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;
const SECRET_LEN: usize = 32;
const MAX_ALIAS_LEN: usize = 64;

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode<const N: usize>(s: &str) -> Option<[u8; N]> {
    if s.len() != N * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut out = [0u8; N];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}

/// Generate a fresh random secret, URL-safe base64 without padding.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Salted SHA-256 hash of a token secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretHash {
    salt: [u8; SALT_LEN],
    digest: [u8; 32],
}

impl SecretHash {
    /// Hash `secret` under a freshly generated salt.
    pub fn compute(secret: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::with_salt(salt, secret)
    }

    /// Hash `secret` under a caller-chosen salt.
    pub fn with_salt(salt: [u8; SALT_LEN], secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(secret.as_bytes());
        Self {
            salt,
            digest: hasher.finalize().into(),
        }
    }

    /// Constant-time check of `secret` against this hash.
    pub fn verify(&self, secret: &str) -> bool {
        let candidate = Self::with_salt(self.salt, secret);
        candidate.digest.ct_eq(&self.digest).into()
    }
}

impl fmt::Display for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{HASH_SCHEME}:{}:{}",
            hex_encode(&self.salt),
            hex_encode(&self.digest)
        )
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHash([REDACTED])")
    }
}

impl FromStr for SecretHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(HASH_SCHEME), Some(salt), Some(digest)) => {
                let salt = hex_decode::<SALT_LEN>(salt)
                    .ok_or_else(|| "salt must be 32 hex characters".to_string())?;
                let digest = hex_decode::<32>(digest)
                    .ok_or_else(|| "digest must be 64 hex characters".to_string())?;
                Ok(Self { salt, digest })
            }
            (Some(scheme), Some(_), Some(_)) => Err(format!("unsupported hash scheme: {scheme}")),
            _ => Err("expected sha256:<salt>:<digest>".to_string()),
        }
    }
}

impl Serialize for SecretHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SecretHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn enabled_by_default() -> bool {
    true
}

/// A named credential with a write-permission prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Unique name; the user part of a credential.
    pub alias: String,
    /// Hash of the secret part of a credential.
    pub secret: SecretHash,
    /// Subtree this token may write under.
    pub path: PermissionPrefix,
    /// Disabled tokens authenticate to [`AuthError::Disabled`](crate::AuthError::Disabled).
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// When the token was created or last rotated.
    pub issued_at: DateTime<Utc>,
}

impl Token {
    /// Create an enabled token for `alias`, returning it with its plaintext secret.
    pub fn issue(alias: &str, path: PermissionPrefix) -> Result<(Self, String), TokenStoreError> {
        validate_alias(alias)?;
        let secret = generate_secret();
        let token = Self {
            alias: alias.to_string(),
            secret: SecretHash::compute(&secret),
            path,
            enabled: true,
            issued_at: Utc::now(),
        };
        Ok((token, secret))
    }

    /// Replace the secret, returning the new plaintext.
    pub fn rotate(&mut self) -> String {
        let secret = generate_secret();
        self.secret = SecretHash::compute(&secret);
        self.issued_at = Utc::now();
        secret
    }
}

/// Aliases appear before the `:` in `alias:secret`, so they are restricted
/// to `[A-Za-z0-9._-]`.
pub(crate) fn validate_alias(alias: &str) -> Result<(), TokenStoreError> {
    let reject = |reason| TokenStoreError::InvalidAlias {
        alias: alias.to_string(),
        reason,
    };
    if alias.is_empty() {
        return Err(reject("must not be empty"));
    }
    if alias.len() > MAX_ALIAS_LEN {
        return Err(reject("must not exceed 64 characters"));
    }
    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(reject("may only contain letters, digits, '.', '_' and '-'"));
    }
    Ok(())
}
