//! Trend analysis for a chronological series
//!
//! Two independent trend signals (OLS slope t-test and the Mann-Kendall
//! test) feed one combined conclusion. Mean-shift detection and the linear
//! forecast are reported alongside.

use super::spc::SpecLimits;
use super::{ensure_finite, stats, AnalysisError};

/// Fewest points accepted by [`analyze_trend`]
pub const MIN_TREND_POINTS: usize = 5;

/// Longest forecast produced; larger requests are cut to this length
pub const MAX_FORECAST_POINTS: usize = 1000;

/// |Z| above which Mann-Kendall reports a trend (95% two-tailed)
pub const MANN_KENDALL_Z_CRITICAL: f64 = 1.96;

/// Shift sizes in sample standard deviations
pub const SIGNIFICANT_SHIFT: f64 = 1.5;
pub const SUSPECTED_SHIFT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendOptions {
    pub detect_shift: bool,
    pub detect_trend: bool,
    pub forecast_points: usize,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            detect_shift: true,
            detect_trend: true,
            forecast_points: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendInput {
    pub values: Vec<f64>,
    pub spec: Option<SpecLimits>,
    pub options: TrendOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Falling,
    NoTrend,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Rising => write!(f, "rising"),
            TrendDirection::Falling => write!(f, "falling"),
            TrendDirection::NoTrend => write!(f, "no trend"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionTrend {
    pub fit: stats::LinearFit,
    pub t_statistic: f64,
    pub critical_t: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannKendall {
    pub s: i64,
    pub variance: f64,
    pub z: f64,
    pub significant: bool,
}

impl MannKendall {
    pub fn direction(&self) -> TrendDirection {
        if !self.significant {
            TrendDirection::NoTrend
        } else if self.z > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftClass {
    Significant,
    Suspected,
    NoShift,
}

impl std::fmt::Display for ShiftClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftClass::Significant => write!(f, "significant shift"),
            ShiftClass::Suspected => write!(f, "suspected shift"),
            ShiftClass::NoShift => write!(f, "no shift"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanShift {
    pub first_mean: Option<f64>,
    pub second_mean: Option<f64>,
    /// (second − first) / sample σ; absent when σ is zero
    pub size: Option<f64>,
    pub class: ShiftClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendConclusion {
    Strong,
    Suspected,
    NoSignificantTrend,
    /// Trend detection was switched off
    NotEvaluated,
}

impl TrendConclusion {
    pub fn label(&self) -> &'static str {
        match self {
            TrendConclusion::Strong => "strong trend signal",
            TrendConclusion::Suspected => "suspected trend",
            TrendConclusion::NoSignificantTrend => "no significant trend",
            TrendConclusion::NotEvaluated => "trend not evaluated",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            TrendConclusion::Strong => "investigate",
            TrendConclusion::Suspected => "monitor",
            TrendConclusion::NoSignificantTrend | TrendConclusion::NotEvaluated => "maintain",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendResult {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub regression: Option<RegressionTrend>,
    pub mann_kendall: Option<MannKendall>,
    pub shift: Option<MeanShift>,
    /// (index, value) pairs starting at index n
    pub forecast: Vec<(usize, f64)>,
    pub conclusion: TrendConclusion,
    /// Values outside the spec limits, when limits were supplied
    pub spec_violations: Option<usize>,
}

pub fn analyze_trend(input: &TrendInput) -> Result<TrendResult, AnalysisError> {
    let values = &input.values;
    let n = values.len();
    if n < MIN_TREND_POINTS {
        return Err(AnalysisError::InsufficientData {
            analysis: "trend analysis",
            required: MIN_TREND_POINTS,
            supplied: n,
        });
    }
    ensure_finite("time_series_data", values)?;
    if let Some(spec) = &input.spec {
        spec.validate()?;
    }

    let fit = stats::linear_fit_by_index(values).ok_or(AnalysisError::InsufficientData {
        analysis: "trend regression",
        required: 3,
        supplied: n,
    })?;

    let (regression, mann_kendall) = if input.options.detect_trend {
        (Some(regression_trend(fit)), Some(mann_kendall(values)))
    } else {
        (None, None)
    };
    let shift = input.options.detect_shift.then(|| mean_shift(values));

    let forecast = (n..n + input.options.forecast_points.min(MAX_FORECAST_POINTS))
        .map(|i| (i, fit.predict(i as f64)))
        .collect();

    let conclusion = match (regression, mann_kendall) {
        (Some(r), Some(mk)) => match (r.significant, mk.significant) {
            (true, true) => TrendConclusion::Strong,
            (true, false) | (false, true) => TrendConclusion::Suspected,
            (false, false) => TrendConclusion::NoSignificantTrend,
        },
        _ => TrendConclusion::NotEvaluated,
    };
    tracing::debug!(n, slope = fit.slope, conclusion = conclusion.label(), "trend analysis");

    let spec_violations = input
        .spec
        .map(|spec| values.iter().filter(|&&v| spec.is_violated_by(v)).count());

    Ok(TrendResult {
        n,
        mean: stats::mean(values).unwrap_or_default(),
        std_dev: stats::sample_std_dev(values).unwrap_or_default(),
        min: stats::min(values).unwrap_or_default(),
        max: stats::max(values).unwrap_or_default(),
        regression,
        mann_kendall,
        shift,
        forecast,
        conclusion,
        spec_violations,
    })
}

/// t-test on the OLS slope. Critical t is 2.0 above 30 points, 2.3 otherwise.
pub fn regression_trend(fit: stats::LinearFit) -> RegressionTrend {
    let critical_t = if fit.n > 30 { 2.0 } else { 2.3 };
    let t_statistic = fit.t_statistic();
    RegressionTrend {
        fit,
        t_statistic,
        critical_t,
        significant: t_statistic.abs() > critical_t,
    }
}

/// Mann-Kendall test without tie correction.
///
/// S = Σ_{i<j} sign(y_j − y_i), Var(S) = n(n−1)(2n+5)/18 and a
/// continuity-corrected Z (Mann 1945; Kendall 1975).
pub fn mann_kendall(values: &[f64]) -> MannKendall {
    let n = values.len();
    let mut s: i64 = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = values[j] - values[i];
            if d > 0.0 {
                s += 1;
            } else if d < 0.0 {
                s -= 1;
            }
        }
    }
    let nf = n as f64;
    let variance = nf * (nf - 1.0) * (2.0 * nf + 5.0) / 18.0;
    let z = if variance <= 0.0 {
        0.0
    } else if s > 0 {
        (s - 1) as f64 / variance.sqrt()
    } else if s < 0 {
        (s + 1) as f64 / variance.sqrt()
    } else {
        0.0
    };
    MannKendall {
        s,
        variance,
        z,
        significant: z.abs() > MANN_KENDALL_Z_CRITICAL,
    }
}

/// Compare the mean of the first n/2 points with the rest
pub fn mean_shift(values: &[f64]) -> MeanShift {
    let (first, second) = values.split_at(values.len() / 2);
    let first_mean = stats::mean(first);
    let second_mean = stats::mean(second);
    let sigma = stats::sample_std_dev(values).unwrap_or(0.0);

    let size = match (first_mean, second_mean) {
        (Some(a), Some(b)) if sigma > 0.0 => Some((b - a) / sigma),
        _ => None,
    };
    let class = match size.map(f64::abs) {
        Some(s) if s > SIGNIFICANT_SHIFT => ShiftClass::Significant,
        Some(s) if s > SUSPECTED_SHIFT => ShiftClass::Suspected,
        _ => ShiftClass::NoShift,
    };
    MeanShift {
        first_mean,
        second_mean,
        size,
        class,
    }
}
