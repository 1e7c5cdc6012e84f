//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::Catalog;

const WORKSPACE_DIR: &str = ".semiproc";

/// A directory holding a `.semiproc/` folder with local config and catalog
#[derive(Debug)]
pub struct Workspace {
    /// Parent of .semiproc/
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create `.semiproc/` with a starter config and catalog
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }
        Self::write_files(root)
    }

    /// Initialize even if .semiproc/ exists, overwriting both files
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_files(root)
    }

    fn write_files(root: PathBuf) -> Result<Self, WorkspaceError> {
        let workspace = Self { root };
        std::fs::create_dir_all(workspace.dir())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        std::fs::write(workspace.config_path(), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        let catalog = Catalog::embedded_source()
            .ok_or_else(|| WorkspaceError::IoError("embedded catalog unavailable".to_string()))?;
        std::fs::write(workspace.catalog_path(), catalog)
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(workspace)
    }

    fn default_config() -> &'static str {
        r#"# semiproc workspace configuration
# Values here override ~/.config/semiproc/config.yaml and are overridden by
# SEMIPROC_LOG_LEVEL, SEMIPROC_CATALOG and SEMIPROC_DISCLAIMER.

# Log filter written to stderr (error, warn, info, debug, trace)
# log_level: warn

# Reference catalog (defects, standard recipes, playbooks).
# Relative paths resolve against the workspace root.
catalog: .semiproc/catalog.yaml

# Prepend the user-data disclaimer to every report
# disclaimer: true

# Name reported to MCP clients
# server_name: SemiProcess MCP
"#
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The .semiproc configuration directory
    pub fn dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir().join("config.yaml")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir().join("catalog.yaml")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not a semiproc workspace (searched from {searched_from:?}). Run 'semiproc init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("semiproc workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workspace_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let workspace = Workspace::init(tmp.path()).unwrap();

        assert!(workspace.dir().is_dir());
        assert!(workspace.config_path().exists());
        let catalog = Catalog::from_path(&workspace.catalog_path()).unwrap();
        assert!(catalog.defect("PARTICLE").is_some());
    }

    #[test]
    fn test_workspace_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();

        let err = Workspace::init(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));

        std::fs::write(Workspace::init_force(tmp.path()).unwrap().config_path(), "").unwrap();
        Workspace::init_force(tmp.path()).unwrap();
        let text = std::fs::read_to_string(tmp.path().join(".semiproc/config.yaml")).unwrap();
        assert!(text.contains("catalog:"));
    }

    #[test]
    fn test_workspace_discover_walks_up() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("lots/2024/week10");
        std::fs::create_dir_all(&subdir).unwrap();

        let workspace = Workspace::discover_from(&subdir).unwrap();
        assert_eq!(
            workspace.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_workspace_discover_fails_without_dir() {
        let tmp = tempdir().unwrap();
        let err = Workspace::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }
}
