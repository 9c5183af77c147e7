use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default delay between two refreshes of the same working copy
pub const DEFAULT_REFRESH_COOLDOWN_SECS: u64 = 300;

/// Which version-control implementation drives the synchronizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsBackend {
    /// Shell out to the `git` executable
    #[default]
    Command,
    /// Use libgit2 in-process
    Libgit2,
}

impl std::str::FromStr for VcsBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" | "git" => Ok(VcsBackend::Command),
            "libgit2" | "git2" => Ok(VcsBackend::Libgit2),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Settings for fetching and documenting packages, stored as TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Directory holding the working copies (defaults to the system temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    /// Minimum seconds between two refreshes of one working copy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_cooldown_secs: Option<u64>,
    /// VCS backend
    #[serde(default)]
    pub backend: VcsBackend,
}

impl DocsConfig {
    /// Scratch directory with the default applied
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Refresh cooldown with the default applied
    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_secs(
            self.refresh_cooldown_secs
                .unwrap_or(DEFAULT_REFRESH_COOLDOWN_SECS),
        )
    }
}

/// Load a config file, returning `None` when it does not exist
pub fn load_config(path: &Path) -> Result<Option<DocsConfig>, CoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let config: DocsConfig = toml::from_str(&content)?;
    Ok(Some(config))
}

/// Write a config file, creating parent directories
pub fn save_config(path: &Path, config: &DocsConfig) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gopkgdoc.toml");

        let config = DocsConfig {
            scratch_dir: Some(dir.path().join("scratch")),
            refresh_cooldown_secs: Some(60),
            backend: VcsBackend::Libgit2,
        };

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap().unwrap();

        assert_eq!(loaded.scratch_dir, config.scratch_dir);
        assert_eq!(loaded.refresh_cooldown(), Duration::from_secs(60));
        assert_eq!(loaded.backend, VcsBackend::Libgit2);
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml")).unwrap().is_none());
    }

    #[test]
    fn test_defaults() {
        let config: DocsConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend, VcsBackend::Command);
        assert_eq!(config.refresh_cooldown(), Duration::from_secs(300));
        assert_eq!(config.scratch_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("libgit2".parse::<VcsBackend>().unwrap(), VcsBackend::Libgit2);
        assert_eq!("command".parse::<VcsBackend>().unwrap(), VcsBackend::Command);
        assert!("svn".parse::<VcsBackend>().is_err());
    }
}
