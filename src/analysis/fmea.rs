//! FMEA-style defect risk scoring
//!
//! Each process parameter with a current value and a bounded window gets a
//! severity/occurrence/detection rating, a Risk Priority Number and an Action
//! Priority class. Occurrence is derived from the remaining margin to the
//! nearer window bound unless the caller supplies it.

use std::collections::{BTreeMap, BTreeSet};

use super::window::ProcessWindow;
use super::AnalysisError;

/// Rating used when the caller supplies none
pub const DEFAULT_RATING: u8 = 5;

/// Occurrence used when the window has `min == max`
pub const RANGE_UNDEFINED_OCCURRENCE: u8 = 5;

/// Action Priority class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

impl ActionPriority {
    /// First matching rule wins
    pub fn classify(severity: u8, occurrence: u8, detection: u8) -> Self {
        let rpn = rpn(severity, occurrence, detection);
        if severity >= 9 && occurrence >= 4 {
            ActionPriority::High
        } else if severity >= 5 && occurrence >= 6 {
            ActionPriority::High
        } else if severity >= 5 && occurrence >= 4 && detection >= 6 {
            ActionPriority::Medium
        } else if rpn >= 100 {
            ActionPriority::Medium
        } else {
            ActionPriority::Low
        }
    }
}

impl std::fmt::Display for ActionPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionPriority::High => write!(f, "H"),
            ActionPriority::Medium => write!(f, "M"),
            ActionPriority::Low => write!(f, "L"),
        }
    }
}

/// Overall classification across all scored parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallRisk {
    High,
    Medium,
    Low,
}

impl OverallRisk {
    pub fn label(&self) -> &'static str {
        match self {
            OverallRisk::High => "high risk",
            OverallRisk::Medium => "medium risk",
            OverallRisk::Low => "low risk",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            OverallRisk::High => "immediate action",
            OverallRisk::Medium => "planned action",
            OverallRisk::Low => "monitor",
        }
    }
}

/// Historical defect correlation label attached to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    High,
    Medium,
    Low,
}

impl std::str::FromStr for Correlation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Correlation::High),
            "medium" | "med" | "m" => Ok(Correlation::Medium),
            "low" | "l" => Ok(Correlation::Low),
            other => Err(format!("unknown correlation level '{}'", other)),
        }
    }
}

impl std::fmt::Display for Correlation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Correlation::High => write!(f, "HIGH"),
            Correlation::Medium => write!(f, "MEDIUM"),
            Correlation::Low => write!(f, "LOW"),
        }
    }
}

/// Where an occurrence rating came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OccurrenceBasis {
    UserInput,
    Margin { margin_pct: f64 },
    /// The window has `min == max`
    RangeUndefined,
}

impl std::fmt::Display for OccurrenceBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OccurrenceBasis::UserInput => write!(f, "user input"),
            OccurrenceBasis::Margin { margin_pct } if *margin_pct <= 0.0 => {
                write!(f, "margin {:.1}% (out of range)", margin_pct)
            }
            OccurrenceBasis::Margin { margin_pct } if *margin_pct >= 50.0 => {
                write!(f, "margin {:.1}% (ample margin)", margin_pct)
            }
            OccurrenceBasis::Margin { margin_pct } => write!(f, "margin {:.1}%", margin_pct),
            OccurrenceBasis::RangeUndefined => write!(f, "range undefined"),
        }
    }
}

/// Map a margin percentage to an occurrence rating
pub fn occurrence_from_margin(margin_pct: f64) -> u8 {
    if margin_pct <= 0.0 {
        10
    } else if margin_pct < 10.0 {
        8
    } else if margin_pct < 20.0 {
        6
    } else if margin_pct < 30.0 {
        5
    } else if margin_pct < 50.0 {
        3
    } else {
        2
    }
}

/// S × O × D
pub fn rpn(severity: u8, occurrence: u8, detection: u8) -> u16 {
    u16::from(severity) * u16::from(occurrence) * u16::from(detection)
}

/// Canonical input for [`assess_risk`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskInput {
    pub window: ProcessWindow,
    pub conditions: BTreeMap<String, f64>,
    pub severity: BTreeMap<String, i64>,
    pub occurrence: BTreeMap<String, i64>,
    pub detection: BTreeMap<String, i64>,
    pub critical: BTreeSet<String>,
    pub correlation: BTreeMap<String, Correlation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskFactor {
    pub parameter: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub unit: Option<String>,
    pub severity: u8,
    pub occurrence: u8,
    pub detection: u8,
    pub rpn: u16,
    pub priority: ActionPriority,
    pub basis: OccurrenceBasis,
    pub critical: bool,
    pub correlation: Option<Correlation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingValue,
    MissingBounds,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingValue => write!(f, "no current value"),
            SkipReason::MissingBounds => write!(f, "window bound missing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// Sorted by parameter name
    pub factors: Vec<RiskFactor>,
    pub skipped: Vec<(String, SkipReason)>,
    pub overall: OverallRisk,
}

impl RiskAssessment {
    pub fn max_rpn(&self) -> Option<u16> {
        self.factors.iter().map(|f| f.rpn).max()
    }

    /// Factors sorted by RPN descending, ties by parameter name
    pub fn ranked(&self) -> Vec<&RiskFactor> {
        let mut ranked: Vec<&RiskFactor> = self.factors.iter().collect();
        ranked.sort_by(|a, b| b.rpn.cmp(&a.rpn));
        ranked
    }

    pub fn count(&self, priority: ActionPriority) -> usize {
        self.factors.iter().filter(|f| f.priority == priority).count()
    }
}

fn rating(
    table: &BTreeMap<String, i64>,
    parameter: &str,
    field: &'static str,
) -> Result<Option<u8>, AnalysisError> {
    match table.get(parameter) {
        None => Ok(None),
        Some(&v) if (1..=10).contains(&v) => Ok(Some(v as u8)),
        Some(&v) => Err(AnalysisError::InvalidRating {
            parameter: parameter.to_string(),
            field,
            value: v,
        }),
    }
}

pub fn assess_risk(input: &RiskInput) -> Result<RiskAssessment, AnalysisError> {
    let mut factors = Vec::new();
    let mut skipped = Vec::new();

    for (parameter, bounds) in &input.window {
        let Some(&value) = input.conditions.get(parameter) else {
            skipped.push((parameter.clone(), SkipReason::MissingValue));
            continue;
        };
        let (Some(min), Some(max)) = (bounds.min, bounds.max) else {
            skipped.push((parameter.clone(), SkipReason::MissingBounds));
            continue;
        };
        super::ensure_finite(parameter, &[value, min, max])?;

        let severity = rating(&input.severity, parameter, "severity")?.unwrap_or(DEFAULT_RATING);
        let detection =
            rating(&input.detection, parameter, "detection")?.unwrap_or(DEFAULT_RATING);
        let (occurrence, basis) = match rating(&input.occurrence, parameter, "occurrence")? {
            Some(o) => (o, OccurrenceBasis::UserInput),
            None => match bounds.margin_pct(value) {
                Some(margin_pct) => (
                    occurrence_from_margin(margin_pct),
                    OccurrenceBasis::Margin { margin_pct },
                ),
                None => (RANGE_UNDEFINED_OCCURRENCE, OccurrenceBasis::RangeUndefined),
            },
        };

        factors.push(RiskFactor {
            parameter: parameter.clone(),
            value,
            min,
            max,
            unit: bounds.unit.clone(),
            severity,
            occurrence,
            detection,
            rpn: rpn(severity, occurrence, detection),
            priority: ActionPriority::classify(severity, occurrence, detection),
            basis,
            critical: input.critical.contains(parameter),
            correlation: input.correlation.get(parameter).copied(),
        });
    }

    let any_high = factors.iter().any(|f| f.priority == ActionPriority::High);
    let max_rpn = factors.iter().map(|f| f.rpn).max().unwrap_or(0);
    let overall = if any_high || max_rpn >= 200 {
        OverallRisk::High
    } else if max_rpn >= 100 {
        OverallRisk::Medium
    } else {
        OverallRisk::Low
    };
    tracing::debug!(scored = factors.len(), skipped = skipped.len(), max_rpn, "fmea scoring");

    Ok(RiskAssessment {
        factors,
        skipped,
        overall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::window::WindowBounds;

    fn single(value: f64, bounds: WindowBounds) -> RiskInput {
        let mut input = RiskInput::default();
        input.window.insert("pressure".into(), bounds);
        input.conditions.insert("pressure".into(), value);
        input
    }

    #[test]
    fn test_occurrence_bands() {
        assert_eq!(occurrence_from_margin(-5.0), 10);
        assert_eq!(occurrence_from_margin(0.0), 10);
        assert_eq!(occurrence_from_margin(5.0), 8);
        assert_eq!(occurrence_from_margin(10.0), 6);
        assert_eq!(occurrence_from_margin(25.0), 5);
        assert_eq!(occurrence_from_margin(30.0), 3);
        assert_eq!(occurrence_from_margin(49.9), 3);
        assert_eq!(occurrence_from_margin(50.0), 2);
    }

    #[test]
    fn test_midpoint_has_ample_margin() {
        let a = assess_risk(&single(10.0, WindowBounds::new(8.0, 12.0))).unwrap();
        let f = &a.factors[0];
        assert_eq!(f.basis, OccurrenceBasis::Margin { margin_pct: 100.0 });
        assert_eq!(f.occurrence, 2);
        assert_eq!(f.rpn, 50);
        assert_eq!(f.priority, ActionPriority::Low);
        assert_eq!(a.overall, OverallRisk::Low);
    }

    #[test]
    fn test_value_at_bound_is_out_of_range() {
        let a = assess_risk(&single(12.0, WindowBounds::new(8.0, 12.0))).unwrap();
        let f = &a.factors[0];
        assert_eq!(f.basis, OccurrenceBasis::Margin { margin_pct: 0.0 });
        assert_eq!(f.occurrence, 10);
        // S=5, O=10 hits the second H rule
        assert_eq!(f.priority, ActionPriority::High);
        assert_eq!(a.overall, OverallRisk::High);
    }

    #[test]
    fn test_degenerate_range() {
        let a = assess_risk(&single(5.0, WindowBounds::new(5.0, 5.0))).unwrap();
        let f = &a.factors[0];
        assert_eq!(f.basis, OccurrenceBasis::RangeUndefined);
        assert_eq!(f.occurrence, RANGE_UNDEFINED_OCCURRENCE);
    }

    #[test]
    fn test_user_ratings() {
        let mut input = single(10.0, WindowBounds::new(8.0, 12.0));
        input.severity.insert("pressure".into(), 9);
        input.occurrence.insert("pressure".into(), 4);
        input.detection.insert("pressure".into(), 2);
        let a = assess_risk(&input).unwrap();
        let f = &a.factors[0];
        assert_eq!(f.basis, OccurrenceBasis::UserInput);
        assert_eq!(f.rpn, 72);
        assert_eq!(f.priority, ActionPriority::High);
    }

    #[test]
    fn test_rating_out_of_scale_rejected() {
        let mut input = single(10.0, WindowBounds::new(8.0, 12.0));
        input.detection.insert("pressure".into(), 11);
        let err = assess_risk(&input).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidRating {
                parameter: "pressure".into(),
                field: "detection",
                value: 11
            }
        );
    }

    #[test]
    fn test_action_priority_rules_in_order() {
        assert_eq!(ActionPriority::classify(9, 4, 1), ActionPriority::High);
        assert_eq!(ActionPriority::classify(5, 6, 1), ActionPriority::High);
        assert_eq!(ActionPriority::classify(5, 4, 6), ActionPriority::Medium);
        assert_eq!(ActionPriority::classify(4, 5, 5), ActionPriority::Medium);
        assert_eq!(ActionPriority::classify(4, 3, 3), ActionPriority::Low);
        assert_eq!(ActionPriority::classify(9, 3, 3), ActionPriority::Low);
    }

    #[test]
    fn test_overall_medium_from_rpn() {
        let mut input = single(10.0, WindowBounds::new(8.0, 12.0));
        input.severity.insert("pressure".into(), 4);
        input.occurrence.insert("pressure".into(), 5);
        input.detection.insert("pressure".into(), 5);
        let a = assess_risk(&input).unwrap();
        assert_eq!(a.max_rpn(), Some(100));
        assert_eq!(a.overall, OverallRisk::Medium);
    }

    #[test]
    fn test_skips_and_annotations() {
        let mut input = single(10.5, WindowBounds::new(8.0, 12.0));
        input.window.insert("gas_flow".into(), WindowBounds::new(40.0, 60.0));
        input.window.insert(
            "temperature".into(),
            WindowBounds {
                min: Some(20.0),
                max: None,
                unit: None,
            },
        );
        input.conditions.insert("temperature".into(), 25.0);
        input.critical.insert("pressure".into());
        input.correlation.insert("pressure".into(), Correlation::High);

        let a = assess_risk(&input).unwrap();
        assert_eq!(a.factors.len(), 1);
        assert_eq!(
            a.skipped,
            vec![
                ("gas_flow".to_string(), SkipReason::MissingValue),
                ("temperature".to_string(), SkipReason::MissingBounds),
            ]
        );
        let f = &a.factors[0];
        assert!(f.critical);
        assert_eq!(f.correlation, Some(Correlation::High));
        // annotations leave severity at its default
        assert_eq!(f.severity, DEFAULT_RATING);
    }

    #[test]
    fn test_ranked_sorts_by_rpn() {
        let mut input = single(10.0, WindowBounds::new(8.0, 12.0));
        input.window.insert("rf_power".into(), WindowBounds::new(500.0, 700.0));
        input.conditions.insert("rf_power".into(), 695.0);
        let a = assess_risk(&input).unwrap();
        let ranked = a.ranked();
        assert_eq!(ranked[0].parameter, "rf_power");
        assert_eq!(a.count(ActionPriority::High), 1);
    }

    #[test]
    fn test_factors_follow_parameter_name() {
        let mut input = RiskInput::default();
        for (name, value) in [("temp", 60.0), ("bias", 100.0), ("pressure", 10.0)] {
            input.window.insert(name.into(), WindowBounds::new(value - 5.0, value + 5.0));
            input.conditions.insert(name.into(), value);
        }
        let a = assess_risk(&input).unwrap();
        let names: Vec<&str> = a.factors.iter().map(|f| f.parameter.as_str()).collect();
        assert_eq!(names, vec!["bias", "pressure", "temp"]);
        let ranked: Vec<&str> = a.ranked().iter().map(|f| f.parameter.as_str()).collect();
        assert_eq!(ranked, names);
    }

    #[test]
    fn test_correlation_parse() {
        assert_eq!("High".parse::<Correlation>(), Ok(Correlation::High));
        assert_eq!(" medium ".parse::<Correlation>(), Ok(Correlation::Medium));
        assert!("severe".parse::<Correlation>().is_err());
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn rpn_is_product_within_scale(s in 1u8..=10, o in 1u8..=10, d in 1u8..=10) {
                let r = rpn(s, o, d);
                prop_assert_eq!(r, u16::from(s) * u16::from(o) * u16::from(d));
                prop_assert!((1..=1000).contains(&r));
            }

            #[test]
            fn derived_occurrence_stays_on_scale(margin in -500.0f64..500.0) {
                let o = occurrence_from_margin(margin);
                prop_assert!((2..=10).contains(&o));
            }
        }
    }
}
