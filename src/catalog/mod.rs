//! Read-only reference data: defect catalog, standard recipes, action playbooks
//!
//! The default catalog is compiled into the binary. A workspace may point at
//! its own file; either way the catalog is loaded once and passed by reference.

mod diagnostics;

pub use diagnostics::CatalogSyntaxError;

use miette::Diagnostic;
use rust_embed::Embed;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::window::{ProcessWindow, WindowBounds};

#[derive(Embed)]
#[folder = "data/"]
struct EmbeddedData;

const CATALOG_FILE: &str = "catalog.yaml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DefectInfo {
    pub description: String,
    #[serde(default)]
    pub likely_causes: Vec<String>,
    /// Process step → impacts
    #[serde(default)]
    pub process_impacts: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

impl DefectInfo {
    /// Impacts for a process step, matched case-insensitively
    pub fn impacts_for(&self, step: &str) -> Option<&[String]> {
        self.process_impacts
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(step.trim()))
            .map(|(_, v)| v.as_slice())
    }
}

/// One standard recipe parameter
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecipeSetting {
    /// Nominal setting as written, e.g. "600 W" or "TEOS"
    pub setting: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl RecipeSetting {
    pub fn has_window(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

type LayerMap = BTreeMap<String, BTreeMap<String, RecipeSetting>>;

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct Catalog {
    #[serde(default)]
    defects: BTreeMap<String, DefectInfo>,
    #[serde(default)]
    recipes: BTreeMap<String, LayerMap>,
    #[serde(default)]
    playbooks: BTreeMap<String, Vec<String>>,
}

/// A resolved standard recipe
#[derive(Debug, Clone, Copy)]
pub struct StandardRecipe<'a> {
    pub process: &'a str,
    pub layer: &'a str,
    pub parameters: &'a BTreeMap<String, RecipeSetting>,
}

impl StandardRecipe<'_> {
    /// Parameters that carry a window, as a process window
    pub fn window(&self) -> ProcessWindow {
        self.parameters
            .iter()
            .filter(|(_, s)| s.has_window())
            .map(|(name, s)| {
                (
                    name.clone(),
                    WindowBounds {
                        min: s.min,
                        max: s.max,
                        unit: s.unit.clone(),
                    },
                )
            })
            .collect()
    }
}

fn find_ci<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<(&'a String, &'a V)> {
    let key = key.trim();
    map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key))
}

impl Catalog {
    /// The catalog compiled into the binary
    pub fn embedded() -> Result<Self, CatalogError> {
        let file = EmbeddedData::get(CATALOG_FILE)
            .ok_or_else(|| CatalogError::Missing(CATALOG_FILE.to_string()))?;
        let text = std::str::from_utf8(&file.data)
            .map_err(|e| CatalogError::Encoding(e.to_string()))?;
        Self::parse(text, CATALOG_FILE)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    pub fn parse(text: &str, name: &str) -> Result<Self, CatalogError> {
        serde_yml::from_str(text)
            .map_err(|e| CatalogError::Syntax(CatalogSyntaxError::from_yaml_error(&e, text, name)))
    }

    /// Catalog override if one is configured, else the embedded catalog
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(p) => {
                tracing::info!(path = %p.display(), "loading catalog override");
                Self::from_path(p)
            }
            None => Self::embedded(),
        }
    }

    /// Text of the embedded catalog, used to seed new workspaces
    pub fn embedded_source() -> Option<String> {
        EmbeddedData::get(CATALOG_FILE)
            .and_then(|f| String::from_utf8(f.data.into_owned()).ok())
    }

    pub fn defect(&self, code: &str) -> Option<(&str, &DefectInfo)> {
        find_ci(&self.defects, code).map(|(k, v)| (k.as_str(), v))
    }

    pub fn defect_codes(&self) -> impl Iterator<Item = &str> {
        self.defects.keys().map(String::as_str)
    }

    pub fn recipe(&self, process: &str, layer: &str) -> Option<StandardRecipe<'_>> {
        let (process, layers) = find_ci(&self.recipes, process)?;
        let (layer, parameters) = find_ci(layers, layer)?;
        Some(StandardRecipe {
            process,
            layer,
            parameters,
        })
    }

    pub fn process_types(&self) -> impl Iterator<Item = &str> {
        self.recipes.keys().map(String::as_str)
    }

    pub fn layers(&self, process: &str) -> Vec<&str> {
        find_ci(&self.recipes, process)
            .map(|(_, layers)| layers.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn playbook(&self, severity: &str) -> Option<&[String]> {
        find_ci(&self.playbooks, severity).map(|(_, v)| v.as_slice())
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("catalog file '{0}' is not embedded")]
    #[diagnostic(code(semiproc::catalog::missing))]
    Missing(String),

    #[error("catalog is not valid UTF-8: {0}")]
    #[diagnostic(code(semiproc::catalog::encoding))]
    Encoding(String),

    #[error("cannot read catalog {path:?}: {message}")]
    #[diagnostic(
        code(semiproc::catalog::io),
        help("check the `catalog` setting with `semiproc config show`")
    )]
    Io { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] CatalogSyntaxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = Catalog::embedded().unwrap();
        assert_eq!(catalog.defect_codes().count(), 5);
        assert!(catalog.playbook("critical").is_some());
        assert!(catalog.process_types().any(|p| p == "etch"));
    }

    #[test]
    fn test_defect_lookup_is_case_insensitive() {
        let catalog = Catalog::embedded().unwrap();
        let (code, info) = catalog.defect("particle").unwrap();
        assert_eq!(code, "PARTICLE");
        assert_eq!(info.likely_causes.len(), 3);
        assert_eq!(info.impacts_for("etch").map(|i| i.len()), Some(2));
        assert!(catalog.defect("VOID").is_none());
    }

    #[test]
    fn test_recipe_lookup_and_window() {
        let catalog = Catalog::embedded().unwrap();
        let recipe = catalog.recipe("Etch", "POLY_SI").unwrap();
        assert_eq!(recipe.process, "etch");
        assert_eq!(recipe.layer, "poly_si");
        assert_eq!(recipe.parameters["rf_power"].setting, "600 W");
        let window = recipe.window();
        assert_eq!(window.len(), 3);
        assert_eq!(window["pressure"], WindowBounds::new(8.0, 12.0).with_unit("mTorr"));
        assert!(catalog.recipe("etch", "oxide").is_none());
        assert_eq!(catalog.layers("cmp"), vec!["copper", "ild"]);
    }

    #[test]
    fn test_override_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("catalog.yaml");
        std::fs::write(
            &path,
            "defects:\n  VOID:\n    description: Voids in fill\nrecipes: {}\n",
        )
        .unwrap();
        let catalog = Catalog::load(Some(&path)).unwrap();
        assert!(catalog.defect("void").is_some());
        assert!(catalog.playbook("critical").is_none());
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = Catalog::parse("defects:\n  VOID: [unclosed\n", "bad.yaml").unwrap_err();
        assert!(matches!(err, CatalogError::Syntax(_)));
        let err = Catalog::parse("defects:\n  VOID:\n    likely_causes: []\n", "bad.yaml").unwrap_err();
        match err {
            CatalogError::Syntax(e) => assert!(e.message().contains("description")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_override_is_io_error() {
        let err = Catalog::load(Some(Path::new("/nonexistent/catalog.yaml"))).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
