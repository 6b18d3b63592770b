//! # Token Store
//!
//! Tokens persist in a YAML file:
//!
//! ```yaml
//! tokens:
//!   - alias: ci
//!     secret: sha256:<salt-hex>:<digest-hex>
//!     path: /com/example
//!     enabled: true
//!     issued_at: 2026-01-01T00:00:00Z
//! ```
//!
//! The server loads the file once at startup and shares the store behind an
//! `Arc` without further locking. Administrative edits happen offline through
//! the CLI, which loads, mutates and saves the file.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TokenStoreError;
use crate::session::PermissionPrefix;
use crate::token::Token;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default)]
    tokens: Vec<Token>,
}

/// Named tokens keyed by alias.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    tokens: BTreeMap<String, Token>,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tokens from a YAML file.
    pub fn load(path: &Path) -> Result<Self, TokenStoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load tokens from a YAML file, treating a missing file as an empty store.
    pub fn load_or_default(path: &Path) -> Result<Self, TokenStoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "token file not found; starting with no tokens");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse a token document.
    pub fn from_yaml(content: &str) -> Result<Self, TokenStoreError> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let file: TokenFile = serde_yaml::from_str(content)?;
        let mut store = Self::new();
        for token in file.tokens {
            store.insert(token)?;
        }
        Ok(store)
    }

    /// Serialize the store, ordered by alias.
    pub fn to_yaml(&self) -> Result<String, TokenStoreError> {
        let file = TokenFile {
            tokens: self.tokens.values().cloned().collect(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Write the store to `path`, replacing the previous file atomically.
    pub fn save(&self, path: &Path) -> Result<(), TokenStoreError> {
        let yaml = self.to_yaml()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Add an existing token. Fails if the alias is taken.
    pub fn insert(&mut self, token: Token) -> Result<(), TokenStoreError> {
        crate::token::validate_alias(&token.alias)?;
        if self.tokens.contains_key(&token.alias) {
            return Err(TokenStoreError::DuplicateAlias(token.alias));
        }
        self.tokens.insert(token.alias.clone(), token);
        Ok(())
    }

    /// Issue a new token, returning its plaintext secret.
    pub fn create(&mut self, alias: &str, path: &str) -> Result<String, TokenStoreError> {
        let prefix = PermissionPrefix::parse(path)?;
        let (token, secret) = Token::issue(alias, prefix)?;
        self.insert(token)?;
        Ok(secret)
    }

    /// Replace a token's secret, returning the new plaintext.
    pub fn rotate(&mut self, alias: &str) -> Result<String, TokenStoreError> {
        let token = self.get_mut(alias)?;
        Ok(token.rotate())
    }

    /// Enable or disable a token.
    pub fn set_enabled(&mut self, alias: &str, enabled: bool) -> Result<(), TokenStoreError> {
        self.get_mut(alias)?.enabled = enabled;
        Ok(())
    }

    /// Delete a token.
    pub fn remove(&mut self, alias: &str) -> Result<Token, TokenStoreError> {
        self.tokens
            .remove(alias)
            .ok_or_else(|| TokenStoreError::UnknownAlias(alias.to_string()))
    }

    /// Look up a token by alias.
    pub fn get(&self, alias: &str) -> Option<&Token> {
        self.tokens.get(alias)
    }

    fn get_mut(&mut self, alias: &str) -> Result<&mut Token, TokenStoreError> {
        self.tokens
            .get_mut(alias)
            .ok_or_else(|| TokenStoreError::UnknownAlias(alias.to_string()))
    }

    /// All tokens, ordered by alias.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the store holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_lookup() {
        let mut store = TokenStore::new();
        let secret = store.create("ci", "/com/example").unwrap();
        let token = store.get("ci").unwrap();
        assert!(token.secret.verify(&secret));
        assert_eq!(token.path.to_string(), "/com/example");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_alias_rejected() {
        let mut store = TokenStore::new();
        store.create("ci", "/").unwrap();
        let err = store.create("ci", "/other").unwrap_err();
        assert!(matches!(err, TokenStoreError::DuplicateAlias(alias) if alias == "ci"));
    }

    #[test]
    fn invalid_prefix_rejected() {
        let mut store = TokenStore::new();
        let err = store.create("ci", "/../up").unwrap_err();
        assert!(matches!(err, TokenStoreError::InvalidPrefix(_)));
    }

    #[test]
    fn unknown_alias_operations_fail() {
        let mut store = TokenStore::new();
        assert!(matches!(
            store.rotate("ghost"),
            Err(TokenStoreError::UnknownAlias(_))
        ));
        assert!(matches!(
            store.set_enabled("ghost", false),
            Err(TokenStoreError::UnknownAlias(_))
        ));
        assert!(matches!(
            store.remove("ghost"),
            Err(TokenStoreError::UnknownAlias(_))
        ));
    }

    #[test]
    fn disable_and_remove() {
        let mut store = TokenStore::new();
        store.create("ci", "/").unwrap();
        store.set_enabled("ci", false).unwrap();
        assert!(!store.get("ci").unwrap().enabled);
        store.remove("ci").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.yaml");

        let mut store = TokenStore::new();
        let secret_a = store.create("alpha", "/a").unwrap();
        store.create("beta", "/b").unwrap();
        store.set_enabled("beta", false).unwrap();
        store.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains(&secret_a));

        let loaded = TokenStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.get("alpha").unwrap().secret.verify(&secret_a));
        assert!(!loaded.get("beta").unwrap().enabled);
        let aliases: Vec<_> = loaded.tokens().map(|t| t.alias.as_str()).collect();
        assert_eq!(aliases, ["alpha", "beta"]);
    }

    #[test]
    fn missing_file_loads_empty_with_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(TokenStore::load_or_default(&path).unwrap().is_empty());
        assert!(matches!(
            TokenStore::load(&path),
            Err(TokenStoreError::Io(_))
        ));
    }

    #[test]
    fn empty_document_is_empty_store() {
        assert!(TokenStore::from_yaml("").unwrap().is_empty());
        assert!(TokenStore::from_yaml("tokens: []").unwrap().is_empty());
    }

    #[test]
    fn duplicate_aliases_in_file_rejected() {
        let mut store = TokenStore::new();
        store.create("ci", "/").unwrap();
        let token = store.get("ci").unwrap().clone();
        let doc = serde_yaml::to_string(&TokenFile {
            tokens: vec![token.clone(), token],
        })
        .unwrap();
        assert!(matches!(
            TokenStore::from_yaml(&doc),
            Err(TokenStoreError::DuplicateAlias(_))
        ));
    }

    #[test]
    fn enabled_defaults_to_true_when_omitted() {
        let doc = format!(
            "tokens:\n  - alias: ci\n    secret: sha256:{}:{}\n    path: /x\n    issued_at: 2026-01-01T00:00:00Z\n",
            "00".repeat(16),
            "11".repeat(32)
        );
        let store = TokenStore::from_yaml(&doc).unwrap();
        assert!(store.get("ci").unwrap().enabled);
    }

    #[test]
    fn malformed_hash_in_file_rejected() {
        let doc = "tokens:\n  - alias: ci\n    secret: hunter2\n    path: /x\n    issued_at: 2026-01-01T00:00:00Z\n";
        assert!(matches!(
            TokenStore::from_yaml(doc),
            Err(TokenStoreError::Yaml(_))
        ));
    }
}
