//! Process windows and condition checks against them

use std::collections::{BTreeMap, BTreeSet};

/// Allowed range for one process parameter. A missing bound is open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: Option<String>,
}

impl WindowBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    /// Distance to the nearer bound when both bounds exist and the value is
    /// inside them, else 0
    pub fn margin(&self, value: f64) -> f64 {
        match (self.min, self.max) {
            (Some(min), Some(max)) if self.contains(value) => (value - min).min(max - value),
            _ => 0.0,
        }
    }

    /// Share of the half-range left before the nearer bound, in percent.
    /// Negative outside the window; `None` when a bound is missing or the
    /// range is degenerate.
    pub fn margin_pct(&self, value: f64) -> Option<f64> {
        let (min, max) = (self.min?, self.max?);
        if max == min {
            return None;
        }
        let half_range = (max - min) / 2.0;
        Some((max - value).min(value - min) / half_range * 100.0)
    }
}

/// Parameter name → allowed range, iterated by name
pub type ProcessWindow = BTreeMap<String, WindowBounds>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    Pass,
    Fail,
    NotProvided,
}

impl std::fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowStatus::Pass => write!(f, "PASS"),
            WindowStatus::Fail => write!(f, "FAIL"),
            WindowStatus::NotProvided => write!(f, "NOT PROVIDED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowCheck {
    pub parameter: String,
    pub value: Option<f64>,
    pub bounds: WindowBounds,
    pub status: WindowStatus,
    pub margin: f64,
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowValidation {
    pub checks: Vec<WindowCheck>,
}

impl WindowValidation {
    /// Every window parameter was provided and is in range
    pub fn all_pass(&self) -> bool {
        self.checks.iter().all(|c| c.status == WindowStatus::Pass)
    }

    /// Critical parameters that failed or were not provided
    pub fn critical_alerts(&self) -> impl Iterator<Item = &WindowCheck> {
        self.checks
            .iter()
            .filter(|c| c.critical && c.status != WindowStatus::Pass)
    }

    pub fn failures(&self) -> impl Iterator<Item = &WindowCheck> {
        self.checks.iter().filter(|c| c.status == WindowStatus::Fail)
    }
}

/// Check each window parameter against the supplied conditions
pub fn validate_window(
    window: &ProcessWindow,
    conditions: &BTreeMap<String, f64>,
    critical: &BTreeSet<String>,
) -> WindowValidation {
    let checks = window
        .iter()
        .map(|(parameter, bounds)| {
            let value = conditions.get(parameter).copied();
            let status = match value {
                None => WindowStatus::NotProvided,
                Some(v) if bounds.contains(v) => WindowStatus::Pass,
                Some(_) => WindowStatus::Fail,
            };
            WindowCheck {
                parameter: parameter.clone(),
                value,
                bounds: bounds.clone(),
                status,
                margin: value.map_or(0.0, |v| bounds.margin(v)),
                critical: critical.contains(parameter),
            }
        })
        .collect();
    WindowValidation { checks }
}
