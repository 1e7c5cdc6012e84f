//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::Workspace;

/// Server name reported in `initialize` when none is configured
pub const DEFAULT_SERVER_NAME: &str = "SemiProcess MCP";

/// semiproc configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Log filter directive, e.g. "info" or "semiproc=debug"
    pub log_level: Option<String>,

    /// Catalog file replacing the embedded one
    pub catalog: Option<PathBuf>,

    /// Prepend the user-data disclaimer to every report
    pub disclaimer: Option<bool>,

    /// Name reported to MCP clients
    pub server_name: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (accessors below)

        // 2. Global user config (~/.config/semiproc/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Workspace config (.semiproc/config.yaml)
        if let Ok(workspace) = Workspace::discover() {
            if let Some(mut local) = Self::read_file(&workspace.config_path()) {
                // relative catalog paths are relative to the workspace root
                local.catalog = local.catalog.map(|p| {
                    if p.is_relative() {
                        workspace.root().join(p)
                    } else {
                        p
                    }
                });
                config.merge(local);
            } else if workspace.catalog_path().exists() {
                config.catalog = Some(workspace.catalog_path());
            }
        }

        // 4. Environment variables
        config.merge(Self::from_env());

        config
    }

    fn read_file(path: &std::path::Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                None
            }
        }
    }

    fn from_env() -> Config {
        Config {
            log_level: std::env::var("SEMIPROC_LOG_LEVEL").ok(),
            catalog: std::env::var_os("SEMIPROC_CATALOG").map(PathBuf::from),
            disclaimer: std::env::var("SEMIPROC_DISCLAIMER")
                .ok()
                .and_then(|v| parse_bool(&v)),
            server_name: None,
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "semiproc")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }
        if other.disclaimer.is_some() {
            self.disclaimer = other.disclaimer;
        }
        if other.server_name.is_some() {
            self.server_name = other.server_name;
        }
    }

    pub fn disclaimer(&self) -> bool {
        self.disclaimer.unwrap_or(true)
    }

    pub fn server_name(&self) -> &str {
        self.server_name.as_deref().unwrap_or(DEFAULT_SERVER_NAME)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }
}

/// Accepts the usual spellings of a boolean setting
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.disclaimer());
        assert_eq!(config.server_name(), DEFAULT_SERVER_NAME);
        assert!(config.log_level().is_none());
    }

    #[test]
    fn test_merge_prefers_later_layer() {
        let mut base: Config = serde_yml::from_str("log_level: info\ndisclaimer: true\n").unwrap();
        let overlay: Config =
            serde_yml::from_str("disclaimer: false\nserver_name: Fab 7 Assistant\n").unwrap();
        base.merge(overlay);
        assert_eq!(base.log_level(), Some("info"));
        assert!(!base.disclaimer());
        assert_eq!(base.server_name(), "Fab 7 Assistant");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
