//! Multi-criteria equipment comparison
//!
//! Metrics are min-max normalized across equipment (direction aware),
//! weighted, and summed into a 0-100 composite score.

use std::collections::{BTreeMap, BTreeSet};

use super::{ensure_finite, AnalysisError};

/// Tolerance on Σweights before renormalizing
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Weight of an observed metric left out of supplied weights
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Score given to every unit when a metric has no spread
pub const NO_SIGNAL_SCORE: f64 = 0.5;

/// Whole-word tokens that mark a lower-is-better metric
const LOWER_IS_BETTER_TOKENS: &[&str] = &[
    "defect", "defects", "dpm", "dpmo", "ppm", "mttr", "downtime", "scrap", "rework", "particle",
    "particles", "alarm", "alarms", "error", "errors", "cost", "variation", "excursion",
    "excursions", "rejects", "loss",
];

/// Multi-word phrases that mark a lower-is-better metric
const LOWER_IS_BETTER_PHRASES: &[&str] = &[
    "defect_rate",
    "failure_rate",
    "mean_time_to_repair",
    "cycle_time",
    "repair_time",
    "down_time",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDirection {
    HigherIsBetter,
    LowerIsBetter,
}

impl MetricDirection {
    /// Classify a metric by name. Unrecognized names are higher-is-better.
    pub fn of(metric: &str) -> Self {
        let normalized: String = metric
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let token_hit = normalized
            .split('_')
            .any(|t| LOWER_IS_BETTER_TOKENS.contains(&t));
        let phrase_hit = LOWER_IS_BETTER_PHRASES
            .iter()
            .any(|p| normalized.contains(p));
        if token_hit || phrase_hit {
            MetricDirection::LowerIsBetter
        } else {
            MetricDirection::HigherIsBetter
        }
    }

    /// True when `value` is at least as good as `target`
    pub fn meets(&self, value: f64, target: f64) -> bool {
        match self {
            MetricDirection::HigherIsBetter => value >= target,
            MetricDirection::LowerIsBetter => value <= target,
        }
    }
}

impl std::fmt::Display for MetricDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricDirection::HigherIsBetter => write!(f, "higher is better"),
            MetricDirection::LowerIsBetter => write!(f, "lower is better"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentRecord {
    pub equipment_id: String,
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonInput {
    /// In input order; ties in the ranking keep it
    pub equipment: Vec<EquipmentRecord>,
    pub weights: Option<BTreeMap<String, f64>>,
    pub benchmark: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub name: String,
    pub direction: MetricDirection,
    pub weight: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentScore {
    pub rank: usize,
    pub equipment_id: String,
    /// 0-100
    pub score: f64,
    pub normalized: BTreeMap<String, f64>,
    /// Metrics this unit did not report; they contribute nothing
    pub missing: Vec<String>,
}

/// How the weights used for scoring were arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightSource {
    /// No weights supplied; every metric weighs the same
    Equal,
    /// Supplied weights summed to 1 within tolerance
    Supplied,
    /// Supplied weights were divided by their sum
    Renormalized,
    /// Every observed metric was weighted zero; equal weights used instead
    FallbackEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkOutcome {
    Pass,
    Fail,
    Unknown,
}

impl std::fmt::Display for BenchmarkOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkOutcome::Pass => write!(f, "PASS"),
            BenchmarkOutcome::Fail => write!(f, "FAIL"),
            BenchmarkOutcome::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkCheck {
    pub equipment_id: String,
    pub metric: String,
    pub value: Option<f64>,
    pub target: f64,
    pub outcome: BenchmarkOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub metrics: Vec<MetricSummary>,
    /// Best first
    pub ranking: Vec<EquipmentScore>,
    pub weight_source: WeightSource,
    /// Weights given for metrics no unit reported
    pub unused_weights: Vec<String>,
    pub benchmark: Vec<BenchmarkCheck>,
}

pub fn compare_equipment(input: &ComparisonInput) -> Result<ComparisonResult, AnalysisError> {
    if input.equipment.is_empty() {
        return Err(AnalysisError::InsufficientData {
            analysis: "equipment comparison",
            required: 1,
            supplied: 0,
        });
    }
    for record in &input.equipment {
        let values: Vec<f64> = record.metrics.values().copied().collect();
        ensure_finite(&record.equipment_id, &values)?;
    }

    let names: BTreeSet<&String> = input
        .equipment
        .iter()
        .flat_map(|r| r.metrics.keys())
        .collect();
    let (weights, weight_source) = resolve_weights(&names, input.weights.as_ref())?;
    let unused_weights = input
        .weights
        .as_ref()
        .map(|w| {
            w.keys()
                .filter(|k| !names.contains(k))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let metrics: Vec<MetricSummary> = names
        .iter()
        .map(|&name| {
            let values = input.equipment.iter().filter_map(|r| r.metrics.get(name));
            let min = values.clone().copied().reduce(f64::min);
            let max = values.copied().reduce(f64::max);
            MetricSummary {
                name: name.clone(),
                direction: MetricDirection::of(name),
                weight: weights.get(name).copied().unwrap_or(0.0),
                min,
                max,
            }
        })
        .collect();

    let mut ranking: Vec<EquipmentScore> = input
        .equipment
        .iter()
        .map(|record| score_record(record, &metrics))
        .collect();
    // stable: ties keep input order
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
    for (i, entry) in ranking.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    let benchmark = input
        .benchmark
        .as_ref()
        .map(|targets| benchmark_checks(&input.equipment, targets))
        .unwrap_or_default();

    tracing::debug!(
        equipment = input.equipment.len(),
        metrics = metrics.len(),
        ?weight_source,
        "equipment comparison"
    );

    Ok(ComparisonResult {
        metrics,
        ranking,
        weight_source,
        unused_weights,
        benchmark,
    })
}

fn resolve_weights(
    names: &BTreeSet<&String>,
    supplied: Option<&BTreeMap<String, f64>>,
) -> Result<(BTreeMap<String, f64>, WeightSource), AnalysisError> {
    let equal = || {
        let w = 1.0 / names.len().max(1) as f64;
        names.iter().map(|&n| (n.clone(), w)).collect::<BTreeMap<_, _>>()
    };
    let Some(supplied) = supplied.filter(|w| !w.is_empty()) else {
        return Ok((equal(), WeightSource::Equal));
    };
    for (metric, &value) in supplied {
        if !value.is_finite() {
            return Err(AnalysisError::NonFinite {
                field: format!("weights.{}", metric),
            });
        }
        if value < 0.0 {
            return Err(AnalysisError::InvalidWeight {
                metric: metric.clone(),
                value,
            });
        }
    }

    // observed metrics without a supplied weight count as 1 before renormalizing
    let applicable: BTreeMap<String, f64> = names
        .iter()
        .map(|&n| (n.clone(), supplied.get(n).copied().unwrap_or(DEFAULT_WEIGHT)))
        .collect();
    let sum: f64 = applicable.values().sum();
    if sum <= 0.0 {
        return Ok((equal(), WeightSource::FallbackEqual));
    }
    if (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
        return Ok((applicable, WeightSource::Supplied));
    }
    let renormalized = applicable
        .into_iter()
        .map(|(k, v)| (k, v / sum))
        .collect();
    Ok((renormalized, WeightSource::Renormalized))
}

fn score_record(record: &EquipmentRecord, metrics: &[MetricSummary]) -> EquipmentScore {
    let mut normalized = BTreeMap::new();
    let mut missing = Vec::new();
    let mut total = 0.0;

    for metric in metrics {
        let (Some(&value), Some(min), Some(max)) =
            (record.metrics.get(&metric.name), metric.min, metric.max)
        else {
            missing.push(metric.name.clone());
            continue;
        };
        let n = if max == min {
            NO_SIGNAL_SCORE
        } else {
            match metric.direction {
                MetricDirection::HigherIsBetter => (value - min) / (max - min),
                MetricDirection::LowerIsBetter => (max - value) / (max - min),
            }
        };
        total += n * metric.weight;
        normalized.insert(metric.name.clone(), n);
    }

    EquipmentScore {
        rank: 0,
        equipment_id: record.equipment_id.clone(),
        score: 100.0 * total,
        normalized,
        missing,
    }
}

fn benchmark_checks(
    equipment: &[EquipmentRecord],
    targets: &BTreeMap<String, f64>,
) -> Vec<BenchmarkCheck> {
    let mut checks = Vec::new();
    for record in equipment {
        for (metric, &target) in targets {
            let value = record.metrics.get(metric).copied();
            let outcome = match value {
                None => BenchmarkOutcome::Unknown,
                Some(v) if MetricDirection::of(metric).meets(v, target) => BenchmarkOutcome::Pass,
                Some(_) => BenchmarkOutcome::Fail,
            };
            checks.push(BenchmarkCheck {
                equipment_id: record.equipment_id.clone(),
                metric: metric.clone(),
                value,
                target,
                outcome,
            });
        }
    }
    checks
}
