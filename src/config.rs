//! Configuration file handling for the maintenance robot.
//!
//! The file is optional JSON. Every field has a default that reproduces the
//! standard cycle, so `{}` is a complete configuration.
//!
//! Precedence when the binary assembles its settings:
//! CLI flag > config file > environment (`USER`) > default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::agent::salt::DEFAULT_SALT_CALL;
use crate::plan::{DEFAULT_DIRECTORIES, DEFAULT_DOC_EXTENSION, DEFAULT_ENTRY_POINT};
use crate::types::{AgentKind, FileMode};

/// Environment variable naming the invoking user.
pub const OWNER_ENV: &str = "USER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RobotConfig {
    /// Directories to ensure, relative to the working directory, in order.
    pub directories: Vec<PathBuf>,
    /// Extension (without dot) of files whose trailing whitespace is pruned.
    pub doc_extension: String,
    /// File whose mode is enforced.
    pub entry_point: PathBuf,
    pub entry_point_mode: FileMode,
    /// Owner for created directories. Falls back to `$USER`.
    pub owner: Option<String>,
    pub agent: AgentKind,
    /// `salt-call` executable used by the salt agent.
    pub salt_call: PathBuf,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            directories: DEFAULT_DIRECTORIES.iter().map(|d| PathBuf::from(*d)).collect(),
            doc_extension: DEFAULT_DOC_EXTENSION.to_string(),
            entry_point: PathBuf::from(DEFAULT_ENTRY_POINT),
            entry_point_mode: FileMode::EXECUTABLE,
            owner: None,
            agent: AgentKind::default(),
            salt_call: PathBuf::from(DEFAULT_SALT_CALL),
        }
    }
}

impl RobotConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.directories.is_empty() {
            anyhow::bail!("At least one directory must be listed");
        }
        for dir in &self.directories {
            validate_relative(dir, "Directory")?;
        }

        if self.doc_extension.is_empty()
            || !self
                .doc_extension
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            anyhow::bail!(
                "Document extension '{}' must be non-empty and contain only letters, digits or '_'",
                self.doc_extension
            );
        }

        validate_relative(&self.entry_point, "Entry point")?;

        if let Some(owner) = &self.owner {
            if owner.trim().is_empty() || owner.contains(char::is_whitespace) {
                anyhow::bail!("Owner '{}' is not a valid user name", owner);
            }
        }

        if self.salt_call.as_os_str().is_empty() {
            anyhow::bail!("salt_call must not be empty");
        }

        Ok(())
    }

    /// Owner from the configuration, or `$USER` when unset or empty.
    pub fn resolve_owner(&self) -> Option<String> {
        self.owner
            .clone()
            .or_else(|| std::env::var(OWNER_ENV).ok())
            .filter(|owner| !owner.is_empty())
    }
}

fn validate_relative(path: &Path, what: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        anyhow::bail!("{} path must not be empty", what);
    }
    if path.is_absolute() {
        anyhow::bail!("{} {:?} must be relative to the repository root", what, path);
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        anyhow::bail!("{} {:?} must not leave the repository root", what, path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RobotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.directories.len(), 4);
        assert_eq!(config.agent, AgentKind::Salt);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: RobotConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RobotConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<RobotConfig>(r#"{"dirs": []}"#).is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: RobotConfig =
            serde_json::from_str(r#"{"agent": "local", "entry_point_mode": "0700"}"#).unwrap();
        assert_eq!(config.agent, AgentKind::Local);
        assert_eq!(config.entry_point_mode.bits(), 0o700);
        assert_eq!(config.doc_extension, "adoc");
    }

    #[test]
    fn test_validate_rejects_absolute_directory() {
        let config = RobotConfig {
            directories: vec![PathBuf::from("/etc")],
            ..RobotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_parent_traversal() {
        let config = RobotConfig {
            directories: vec![PathBuf::from("config/../../outside")],
            ..RobotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shell_in_extension() {
        let config = RobotConfig {
            doc_extension: "adoc' -delete; echo '".to_string(),
            ..RobotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_directory_list() {
        let config = RobotConfig {
            directories: vec![],
            ..RobotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_owner_wins() {
        let config = RobotConfig {
            owner: Some("builder".to_string()),
            ..RobotConfig::default()
        };
        assert_eq!(config.resolve_owner().as_deref(), Some("builder"));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("robot.json");
        let config = RobotConfig {
            agent: AgentKind::Local,
            owner: Some("builder".to_string()),
            ..RobotConfig::default()
        };
        config.save_to_file(&path).unwrap();
        assert_eq!(RobotConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RobotConfig::load_from_file("/nonexistent/robot.json").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read configuration"));
    }
}
