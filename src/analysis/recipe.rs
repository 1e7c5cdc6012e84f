//! Recipe comparisons: current vs. a baseline, and recipe vs. recipe

use std::collections::{BTreeMap, BTreeSet};

/// One baseline parameter: reference value and optional allowed range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineParam {
    pub value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineStatus {
    InRange,
    BelowMin,
    AboveMax,
    Missing,
}

impl std::fmt::Display for BaselineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineStatus::InRange => write!(f, "in range"),
            BaselineStatus::BelowMin => write!(f, "below min"),
            BaselineStatus::AboveMax => write!(f, "above max"),
            BaselineStatus::Missing => write!(f, "not provided"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineRow {
    pub parameter: String,
    pub baseline: BaselineParam,
    pub current: Option<f64>,
    /// current − baseline value
    pub deviation: Option<f64>,
    pub status: BaselineStatus,
}

/// Compare the current recipe with every baseline parameter
pub fn compare_to_baseline(
    baseline: &BTreeMap<String, BaselineParam>,
    current: &BTreeMap<String, f64>,
) -> Vec<BaselineRow> {
    baseline
        .iter()
        .map(|(parameter, param)| {
            let value = current.get(parameter).copied();
            let status = match value {
                None => BaselineStatus::Missing,
                Some(v) if param.min.is_some_and(|min| v < min) => BaselineStatus::BelowMin,
                Some(v) if param.max.is_some_and(|max| v > max) => BaselineStatus::AboveMax,
                Some(_) => BaselineStatus::InRange,
            };
            BaselineRow {
                parameter: parameter.clone(),
                baseline: param.clone(),
                current: value,
                deviation: value.zip(param.value).map(|(c, b)| c - b),
                status,
            }
        })
        .collect()
}

/// Parameters in the current recipe that the baseline does not define
pub fn extra_parameters<'a>(
    baseline: &BTreeMap<String, BaselineParam>,
    current: &'a BTreeMap<String, f64>,
) -> Vec<&'a str> {
    current
        .keys()
        .filter(|k| !baseline.contains_key(*k))
        .map(String::as_str)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeDiffStatus {
    /// Within tolerance, or no tolerance given
    Ok,
    Exceeds,
    /// Present in only one recipe
    Incomplete,
}

impl std::fmt::Display for RecipeDiffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipeDiffStatus::Ok => write!(f, "OK"),
            RecipeDiffStatus::Exceeds => write!(f, "exceeds tolerance"),
            RecipeDiffStatus::Incomplete => write!(f, "incomplete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDiff {
    pub parameter: String,
    pub a: Option<f64>,
    pub b: Option<f64>,
    /// b − a
    pub diff: Option<f64>,
    /// (b − a) / a × 100, 0 when a is 0
    pub pct: Option<f64>,
    pub tolerance_pct: Option<f64>,
    pub status: RecipeDiffStatus,
}

/// Percent change from `from` to `to`; 0 when `from` is 0
pub fn pct_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

/// Compare two recipes over the union of their parameters, sorted by name
pub fn compare_recipes(
    a: &BTreeMap<String, f64>,
    b: &BTreeMap<String, f64>,
    tolerance: &BTreeMap<String, f64>,
) -> Vec<RecipeDiff> {
    let params: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    params
        .into_iter()
        .map(|p| {
            let (av, bv) = (a.get(p).copied(), b.get(p).copied());
            let tolerance_pct = tolerance.get(p).copied();
            match (av, bv) {
                (Some(x), Some(y)) => {
                    let pct = pct_change(x, y);
                    let exceeds = tolerance_pct.is_some_and(|t| pct.abs() > t);
                    RecipeDiff {
                        parameter: p.clone(),
                        a: av,
                        b: bv,
                        diff: Some(y - x),
                        pct: Some(pct),
                        tolerance_pct,
                        status: if exceeds {
                            RecipeDiffStatus::Exceeds
                        } else {
                            RecipeDiffStatus::Ok
                        },
                    }
                }
                _ => RecipeDiff {
                    parameter: p.clone(),
                    a: av,
                    b: bv,
                    diff: None,
                    pct: None,
                    tolerance_pct,
                    status: RecipeDiffStatus::Incomplete,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_compare_to_baseline() {
        let mut baseline = BTreeMap::new();
        baseline.insert(
            "rf_power".to_string(),
            BaselineParam {
                value: Some(600.0),
                min: Some(550.0),
                max: Some(650.0),
                unit: Some("W".into()),
            },
        );
        baseline.insert(
            "pressure".to_string(),
            BaselineParam {
                value: Some(10.0),
                min: Some(8.0),
                max: Some(12.0),
                unit: None,
            },
        );
        baseline.insert("gas_flow".to_string(), BaselineParam::default());

        let current = map(&[("rf_power", 660.0), ("pressure", 9.5), ("bias", 100.0)]);
        let rows = compare_to_baseline(&baseline, &current);
        let by: BTreeMap<_, _> = rows.iter().map(|r| (r.parameter.as_str(), r)).collect();
        assert_eq!(by["rf_power"].status, BaselineStatus::AboveMax);
        assert_eq!(by["rf_power"].deviation, Some(60.0));
        assert_eq!(by["pressure"].status, BaselineStatus::InRange);
        assert_eq!(by["pressure"].deviation, Some(-0.5));
        assert_eq!(by["gas_flow"].status, BaselineStatus::Missing);
        assert_eq!(by["gas_flow"].deviation, None);
        assert_eq!(extra_parameters(&baseline, &current), vec!["bias"]);
    }

    #[test]
    fn test_compare_recipes() {
        let a = map(&[("rf_power", 600.0), ("pressure", 10.0), ("zero", 0.0)]);
        let b = map(&[("rf_power", 660.0), ("pressure", 10.2), ("zero", 5.0), ("bias", 1.0)]);
        let tol = map(&[("rf_power", 5.0), ("pressure", 5.0)]);
        let rows = compare_recipes(&a, &b, &tol);
        let names: Vec<&str> = rows.iter().map(|r| r.parameter.as_str()).collect();
        assert_eq!(names, vec!["bias", "pressure", "rf_power", "zero"]);

        assert_eq!(rows[0].status, RecipeDiffStatus::Incomplete);
        assert_eq!(rows[1].status, RecipeDiffStatus::Ok);
        assert_eq!(rows[2].status, RecipeDiffStatus::Exceeds);
        assert!((rows[2].pct.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(rows[3].pct, Some(0.0));
        assert_eq!(rows[3].status, RecipeDiffStatus::Ok);
    }

    #[test]
    fn test_pct_change() {
        assert_eq!(pct_change(0.0, 10.0), 0.0);
        assert!((pct_change(200.0, 150.0) + 25.0).abs() < 1e-12);
    }
}
