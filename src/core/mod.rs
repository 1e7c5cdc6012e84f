//! Core module - configuration, workspace and logging

pub mod config;
pub mod logging;
pub mod workspace;

pub use config::Config;
pub use workspace::{Workspace, WorkspaceError};
