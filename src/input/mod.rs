//! Argument adapter layer
//!
//! Tool arguments arrive as loosely shaped JSON. This module validates them
//! against the tool schema and decodes them into the typed inputs the
//! analyzers take; no numeric routine ever sees raw JSON.

pub mod parse;
mod validate;

pub use validate::ArgumentValidator;

use miette::Diagnostic;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::analysis::spc::{ControlLimits, SpecLimits};
use crate::analysis::window::ProcessWindow;

#[derive(Debug, Clone, Error, Diagnostic, PartialEq)]
pub enum InputError {
    #[error("missing required input: {}", .0.join(", "))]
    #[diagnostic(
        code(semiproc::input::missing_fields),
        help("run `semiproc tools schema <tool>` to see the expected arguments")
    )]
    MissingFields(Vec<String>),

    #[error("invalid argument `{field}`: {reason}")]
    #[diagnostic(code(semiproc::input::invalid_arguments))]
    InvalidArguments { field: String, reason: String },

    #[error("tool schema is invalid: {0}")]
    #[diagnostic(code(semiproc::input::schema))]
    Schema(String),
}

/// Borrowed view of a `tools/call` arguments object
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Arguments<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Present and not null
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    pub fn require(&self, key: &str) -> Result<&'a Value, InputError> {
        self.get(key)
            .ok_or_else(|| InputError::MissingFields(vec![key.to_string()]))
    }

    pub fn text(&self, key: &str) -> Result<Option<String>, InputError> {
        self.get(key)
            .map(|v| parse::text(v, key))
            .transpose()
            .map(|s| s.filter(|s| !s.is_empty()))
    }

    pub fn require_text(&self, key: &str) -> Result<String, InputError> {
        self.text(key)?
            .ok_or_else(|| InputError::MissingFields(vec![key.to_string()]))
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>, InputError> {
        parse::optional_number(self.get(key), key)
    }

    pub fn require_number(&self, key: &str) -> Result<f64, InputError> {
        parse::number(self.require(key)?, key)
    }

    pub fn series(&self, key: &str) -> Result<Vec<f64>, InputError> {
        parse::series(self.require(key)?, key)
    }

    pub fn time_series(&self, key: &str) -> Result<Vec<f64>, InputError> {
        parse::time_series(self.require(key)?, key)
    }

    /// Missing optional maps decode as empty
    pub fn number_map(&self, key: &str) -> Result<BTreeMap<String, f64>, InputError> {
        self.get(key)
            .map(|v| parse::number_map(v, key))
            .unwrap_or_else(|| Ok(BTreeMap::new()))
    }

    pub fn require_number_map(&self, key: &str) -> Result<BTreeMap<String, f64>, InputError> {
        parse::number_map(self.require(key)?, key)
    }

    pub fn rating_map(&self, key: &str) -> Result<BTreeMap<String, i64>, InputError> {
        self.get(key)
            .map(|v| parse::rating_map(v, key))
            .unwrap_or_else(|| Ok(BTreeMap::new()))
    }

    pub fn label_map(&self, key: &str) -> Result<BTreeMap<String, String>, InputError> {
        self.get(key)
            .map(|v| parse::label_map(v, key))
            .unwrap_or_else(|| Ok(BTreeMap::new()))
    }

    pub fn string_list(&self, key: &str) -> Result<Vec<String>, InputError> {
        self.get(key)
            .map(|v| parse::string_list(v, key))
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    pub fn string_set(&self, key: &str) -> Result<BTreeSet<String>, InputError> {
        Ok(self.string_list(key)?.into_iter().collect())
    }

    pub fn window(&self, key: &str) -> Result<Option<ProcessWindow>, InputError> {
        self.get(key).map(|v| parse::window(v, key)).transpose()
    }

    pub fn require_window(&self, key: &str) -> Result<ProcessWindow, InputError> {
        parse::window(self.require(key)?, key)
    }

    pub fn spec_limits(&self, key: &str) -> Result<Option<SpecLimits>, InputError> {
        self.get(key).map(|v| parse::spec_limits(v, key)).transpose()
    }

    pub fn control_limits(&self, key: &str) -> Result<Option<ControlLimits>, InputError> {
        self.get(key).map(|v| parse::control_limits(v, key)).transpose()
    }

    pub fn object(&self, key: &str) -> Result<Option<&'a Map<String, Value>>, InputError> {
        self.get(key).map(|v| parse::object(v, key)).transpose()
    }

    pub fn array(&self, key: &str) -> Result<&'a [Value], InputError> {
        match self.get(key) {
            Some(v) => parse::array(v, key),
            None => Ok(&[]),
        }
    }
}
