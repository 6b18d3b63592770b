//! # Server Configuration
//!
//! Loaded from a YAML file, then overridden from the environment:
//!
//! ```yaml
//! hostname: 0.0.0.0
//! port: 8080
//! repository_root: repositories
//! tokens_file: tokens.yaml
//! deploy_enabled: true
//! max_upload_bytes: 536870912
//! fault_history: 16
//! log_format: pretty   # or json
//! ```
//!
//! Every field is optional. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`DepotConfig::port`].
pub const ENV_PORT: &str = "DEPOT_PORT";
/// Environment variable overriding [`DepotConfig::repository_root`].
pub const ENV_REPOSITORY_ROOT: &str = "DEPOT_REPOSITORY_ROOT";
/// Environment variable overriding [`DepotConfig::deploy_enabled`].
pub const ENV_DEPLOY_ENABLED: &str = "DEPOT_DEPLOY_ENABLED";

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value {value:?} for {name}")]
    InvalidOverride { name: &'static str, value: String },
}

/// Log output format for the server binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotConfig {
    /// Interface to bind.
    pub hostname: String,
    /// Port to bind.
    pub port: u16,
    /// Directory holding the artifact tree.
    pub repository_root: PathBuf,
    /// YAML token file, as written by `depot token`.
    pub tokens_file: PathBuf,
    /// When false, every `PUT` is refused.
    pub deploy_enabled: bool,
    /// Upper bound on a single request body.
    pub max_upload_bytes: usize,
    /// Number of recent faults kept for `/-/status`.
    pub fault_history: usize,
    pub log_format: LogFormat,
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            hostname: "0.0.0.0".to_string(),
            port: 8080,
            repository_root: PathBuf::from("repositories"),
            tokens_file: PathBuf::from("tokens.yaml"),
            deploy_enabled: true,
            max_upload_bytes: 512 * 1024 * 1024,
            fault_history: 16,
            log_format: LogFormat::Pretty,
        }
    }
}

impl DepotConfig {
    /// Load `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `DEPOT_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_PORT) {
            self.port = value.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                name: ENV_PORT,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_REPOSITORY_ROOT) {
            self.repository_root = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_DEPLOY_ENABLED) {
            self.deploy_enabled = parse_flag(&value).ok_or(ConfigError::InvalidOverride {
                name: ENV_DEPLOY_ENABLED,
                value,
            })?;
        }
        Ok(())
    }

    /// `hostname:port`, as passed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = DepotConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.deploy_enabled);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_the_rest() {
        let config = DepotConfig::from_yaml("port: 9000\ndeploy_enabled: false\nlog_format: json\n").unwrap();
        assert_eq!(config.port, 9000);
        assert!(!config.deploy_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.tokens_file, PathBuf::from("tokens.yaml"));
    }

    #[test]
    fn empty_and_missing_files_yield_defaults() {
        assert_eq!(DepotConfig::from_yaml("").unwrap(), DepotConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let loaded = DepotConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(loaded, DepotConfig::default());
    }

    #[test]
    fn load_reads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("depot.yaml");
        std::fs::write(&path, "repository_root: /srv/depot\n").unwrap();
        let config = DepotConfig::load(&path).unwrap();
        assert_eq!(config.repository_root, PathBuf::from("/srv/depot"));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(matches!(
            DepotConfig::from_yaml("log_format: xml\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn environment_overrides_win() {
        let mut config = DepotConfig::from_yaml("port: 9000\n").unwrap();
        config
            .apply_overrides(env(&[
                (ENV_PORT, "9100"),
                (ENV_REPOSITORY_ROOT, "/data"),
                (ENV_DEPLOY_ENABLED, "off"),
            ]))
            .unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.repository_root, PathBuf::from("/data"));
        assert!(!config.deploy_enabled);
    }

    #[test]
    fn malformed_overrides_are_errors() {
        let mut config = DepotConfig::default();
        assert!(matches!(
            config.apply_overrides(env(&[(ENV_PORT, "eighty")])),
            Err(ConfigError::InvalidOverride { name: ENV_PORT, .. })
        ));
        assert!(matches!(
            config.apply_overrides(env(&[(ENV_DEPLOY_ENABLED, "maybe")])),
            Err(ConfigError::InvalidOverride { .. })
        ));
    }
}
