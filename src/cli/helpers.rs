//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use std::io::Read;
use std::path::Path;

use crate::catalog::Catalog;
use crate::cli::GlobalOpts;
use crate::core::Config;
use crate::tools::{Registry, ToolContext};

/// Everything a command needs to run tools
pub struct Session {
    pub config: Config,
    pub registry: Registry,
    pub ctx: ToolContext,
}

impl Session {
    /// Load the catalog and tool registry under the effective configuration
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let config = Config::load();
        let catalog = Catalog::load(config.catalog.as_deref())?;
        let registry = Registry::new()?;
        let disclaimer = config.disclaimer() && !global.no_disclaimer;
        Ok(Self {
            ctx: ToolContext::new(catalog, disclaimer),
            registry,
            config,
        })
    }
}

/// Read a whole file, or stdin when the path is `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("Cannot read {}: {}", path.display(), e))
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("µm µm µm µm", 6), "µm ...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_read_input_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("args.json");
        std::fs::write(&path, "{}").unwrap();
        assert_eq!(read_input(&path).unwrap(), "{}");
        assert!(read_input(&tmp.path().join("missing.json")).is_err());
    }
}
