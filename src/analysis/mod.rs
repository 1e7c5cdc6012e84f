//! Numeric analysis core
//!
//! Every routine here is a pure function of its typed input. Nothing in this
//! module formats text; the `report` module renders the results.

pub mod equipment;
pub mod fmea;
pub mod history;
pub mod metrics;
pub mod optimize;
pub mod recipe;
pub mod shift;
pub mod simulate;
pub mod spc;
pub mod stats;
pub mod trend;
pub mod window;
pub mod yield_impact;

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the analysis routines
///
/// Only caller contract violations end up here. Numeric edge cases such as a
/// zero standard deviation are carried inside the result as [`Metric::NotApplicable`].
#[derive(Debug, Error, Diagnostic, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("insufficient data for {analysis}: {supplied} value(s) supplied, at least {required} required")]
    #[diagnostic(
        code(semiproc::analysis::insufficient_data),
        help("supply more measurements and try again")
    )]
    InsufficientData {
        analysis: &'static str,
        required: usize,
        supplied: usize,
    },

    #[error("invalid spec limits: USL ({usl}) must be greater than LSL ({lsl})")]
    #[diagnostic(code(semiproc::analysis::spec_limits))]
    InvalidSpecLimits { usl: f64, lsl: f64 },

    #[error("non-finite value in '{field}'")]
    #[diagnostic(code(semiproc::analysis::non_finite))]
    NonFinite { field: String },

    #[error("{field} rating for '{parameter}' must be between 1 and 10, got {value}")]
    #[diagnostic(code(semiproc::analysis::rating))]
    InvalidRating {
        parameter: String,
        field: &'static str,
        value: i64,
    },

    #[error("weight for '{metric}' must not be negative, got {value}")]
    #[diagnostic(code(semiproc::analysis::weight))]
    InvalidWeight { metric: String, value: f64 },
}

/// Why a computed quantity has no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotApplicable {
    /// A spec limit the formula needs was not supplied
    MissingSpecLimit,
    /// The standard deviation is zero
    DegenerateSigma,
}

impl NotApplicable {
    pub fn reason(&self) -> &'static str {
        match self {
            NotApplicable::MissingSpecLimit => "spec limit missing",
            NotApplicable::DegenerateSigma => "zero standard deviation",
        }
    }
}

impl std::fmt::Display for NotApplicable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A derived value that may be undefined for the given input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    NotApplicable(NotApplicable),
}

impl Metric {
    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(*v),
            Metric::NotApplicable(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Value(_))
    }
}

/// Reject NaN and infinities before they reach a formula
pub(crate) fn ensure_finite(field: &str, values: &[f64]) -> Result<(), AnalysisError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(AnalysisError::NonFinite {
            field: field.to_string(),
        })
    }
}
