//! SPC capability analysis
//!
//! Estimates control limits (moving range for individuals, X-bar/R for
//! subgroups), computes Cp/Cpk/Pp/Ppk, lists control-limit violations and
//! runs an advisory normality check.
//!
//! Control chart constants are from Montgomery, *Introduction to Statistical
//! Quality Control*, Appendix VI.

use super::{ensure_finite, stats, AnalysisError, Metric, NotApplicable};

/// Sample count below which capability estimates are flagged as unreliable
pub const RECOMMENDED_MIN_SAMPLES: usize = 25;

/// Length of a monotonic run reported as a trend signal
pub const TREND_RUN_LENGTH: usize = 7;

/// Control chart constants for subgroup sizes 2..=10
#[derive(Debug, Clone, PartialEq)]
pub struct SpcConstants {
    a2: [f64; 9],
    d2: [f64; 9],
    /// A2 used outside the tabulated range
    pub default_a2: f64,
    /// d2 used outside the tabulated range
    pub default_d2: f64,
    /// d2 for a moving range of span 2
    pub moving_range_d2: f64,
}

impl Default for SpcConstants {
    fn default() -> Self {
        Self {
            a2: [1.880, 1.023, 0.729, 0.577, 0.483, 0.419, 0.373, 0.337, 0.308],
            d2: [1.128, 1.693, 2.059, 2.326, 2.534, 2.704, 2.847, 2.970, 3.078],
            default_a2: 0.577,
            default_d2: 2.326,
            moving_range_d2: 1.128,
        }
    }
}

impl SpcConstants {
    pub fn a2(&self, subgroup_size: usize) -> f64 {
        match subgroup_size {
            2..=10 => self.a2[subgroup_size - 2],
            _ => self.default_a2,
        }
    }

    pub fn d2(&self, subgroup_size: usize) -> f64 {
        match subgroup_size {
            2..=10 => self.d2[subgroup_size - 2],
            _ => self.default_d2,
        }
    }
}

/// Upper/lower specification limits with an optional target
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpecLimits {
    pub usl: Option<f64>,
    pub lsl: Option<f64>,
    pub target: Option<f64>,
}

impl SpecLimits {
    pub fn new(usl: Option<f64>, lsl: Option<f64>) -> Self {
        Self {
            usl,
            lsl,
            target: None,
        }
    }

    /// USL must exceed LSL when both are present
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let present: Vec<f64> = [self.usl, self.lsl, self.target]
            .into_iter()
            .flatten()
            .collect();
        ensure_finite("spec_limits", &present)?;
        if let (Some(usl), Some(lsl)) = (self.usl, self.lsl) {
            if usl <= lsl {
                return Err(AnalysisError::InvalidSpecLimits { usl, lsl });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.usl.is_none() && self.lsl.is_none()
    }

    /// True when `value` lies outside whichever bounds are present
    pub fn is_violated_by(&self, value: f64) -> bool {
        self.usl.is_some_and(|usl| value > usl) || self.lsl.is_some_and(|lsl| value < lsl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlLimits {
    pub ucl: f64,
    pub cl: f64,
    pub lcl: f64,
}

/// How the control limits were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitsSource {
    Supplied,
    MovingRange,
    XbarR { subgroups: usize },
}

impl std::fmt::Display for LimitsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitsSource::Supplied => write!(f, "user supplied"),
            LimitsSource::MovingRange => write!(f, "moving range (I-MR)"),
            LimitsSource::XbarR { subgroups } => write!(f, "X-bar/R ({} subgroups)", subgroups),
        }
    }
}

/// Canonical input for [`SpcAnalyzer::analyze`]
#[derive(Debug, Clone, PartialEq)]
pub struct SpcInput {
    pub data: Vec<f64>,
    pub spec: SpecLimits,
    pub control_limits: Option<ControlLimits>,
    pub subgroup_size: usize,
}

impl SpcInput {
    pub fn new(data: Vec<f64>, spec: SpecLimits) -> Self {
        Self {
            data,
            spec,
            control_limits: None,
            subgroup_size: 1,
        }
    }
}

/// A sample outside the control limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Violation {
    /// 1-based sample position
    pub position: usize,
    pub value: f64,
    pub above: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normality {
    pub skewness: Option<f64>,
    pub excess_kurtosis: Option<f64>,
}

impl Normality {
    /// |skewness| ≥ 1 or |excess kurtosis| ≥ 2, using whichever was computable
    pub fn concern(&self) -> bool {
        self.skewness.is_some_and(|s| s.abs() >= 1.0)
            || self.excess_kurtosis.is_some_and(|k| k.abs() >= 2.0)
    }

    pub fn checked(&self) -> bool {
        self.skewness.is_some() || self.excess_kurtosis.is_some()
    }
}

/// Non-blocking notes attached to an SPC result
#[derive(Debug, Clone, PartialEq)]
pub enum SpcAdvisory {
    SmallSample { n: usize },
    NormalityConcern,
    MonotonicRun { length: usize },
    /// Samples past the last complete subgroup were not used for limits
    IncompleteSubgroup { discarded: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpcResult {
    pub n: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub sigma_overall: f64,
    pub sigma_within: f64,
    pub limits: ControlLimits,
    pub limits_source: LimitsSource,
    pub cp: Metric,
    pub cpk: Metric,
    pub pp: Metric,
    pub ppk: Metric,
    pub violations: Vec<Violation>,
    pub normality: Normality,
    pub longest_run: usize,
    pub advisories: Vec<SpcAdvisory>,
}

/// Capability analyzer bound to a read-only constants table
#[derive(Debug, Clone, Default)]
pub struct SpcAnalyzer {
    constants: SpcConstants,
}

impl SpcAnalyzer {
    pub fn new(constants: SpcConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &SpcConstants {
        &self.constants
    }

    pub fn analyze(&self, input: &SpcInput) -> Result<SpcResult, AnalysisError> {
        let data = &input.data;
        if data.is_empty() {
            return Err(AnalysisError::InsufficientData {
                analysis: "SPC analysis",
                required: 1,
                supplied: 0,
            });
        }
        ensure_finite("data_points", data)?;
        input.spec.validate()?;

        let n = data.len();
        let mean = stats::mean(data).unwrap_or_default();
        let sigma_overall = stats::population_std_dev(data).unwrap_or_default();
        let mut advisories = Vec::new();

        let (limits, limits_source, sigma_within) = match input.control_limits {
            Some(limits) => {
                ensure_finite("control_limits", &[limits.ucl, limits.cl, limits.lcl])?;
                (limits, LimitsSource::Supplied, sigma_overall)
            }
            None if input.subgroup_size <= 1 => self.moving_range_limits(data, mean),
            None => {
                let size = input.subgroup_size;
                let subgroups = n / size;
                if subgroups == 0 {
                    return Err(AnalysisError::InsufficientData {
                        analysis: "X-bar/R control limits",
                        required: size,
                        supplied: n,
                    });
                }
                let discarded = n % size;
                if discarded > 0 {
                    advisories.push(SpcAdvisory::IncompleteSubgroup { discarded });
                }
                self.xbar_r_limits(&data[..subgroups * size], size)
            }
        };
        tracing::debug!(n, mean, sigma_overall, sigma_within, %limits_source, "spc limits");

        let cp = potential_capability(&input.spec, sigma_within);
        let cpk = actual_capability(&input.spec, mean, sigma_within);
        let pp = potential_capability(&input.spec, sigma_overall);
        let ppk = actual_capability(&input.spec, mean, sigma_overall);

        let violations = data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v > limits.ucl || v < limits.lcl)
            .map(|(i, &v)| Violation {
                position: i + 1,
                value: v,
                above: v > limits.ucl,
            })
            .collect();

        let normality = Normality {
            skewness: stats::skewness(data),
            excess_kurtosis: stats::excess_kurtosis(data),
        };
        if normality.concern() {
            advisories.push(SpcAdvisory::NormalityConcern);
        }
        if n < RECOMMENDED_MIN_SAMPLES {
            advisories.push(SpcAdvisory::SmallSample { n });
        }
        let longest_run = longest_monotonic_run(data);
        if longest_run >= TREND_RUN_LENGTH {
            advisories.push(SpcAdvisory::MonotonicRun {
                length: longest_run,
            });
        }

        Ok(SpcResult {
            n,
            mean,
            min: stats::min(data).unwrap_or(mean),
            max: stats::max(data).unwrap_or(mean),
            sigma_overall,
            sigma_within,
            limits,
            limits_source,
            cp,
            cpk,
            pp,
            ppk,
            violations,
            normality,
            longest_run,
            advisories,
        })
    }

    fn moving_range_limits(&self, data: &[f64], mean: f64) -> (ControlLimits, LimitsSource, f64) {
        let ranges = stats::moving_ranges(data);
        let mr_bar = stats::mean(&ranges).unwrap_or(0.0);
        let sigma_within = mr_bar / self.constants.moving_range_d2;
        let limits = ControlLimits {
            ucl: mean + 3.0 * sigma_within,
            cl: mean,
            lcl: mean - 3.0 * sigma_within,
        };
        (limits, LimitsSource::MovingRange, sigma_within)
    }

    fn xbar_r_limits(&self, data: &[f64], size: usize) -> (ControlLimits, LimitsSource, f64) {
        let (means, ranges): (Vec<f64>, Vec<f64>) = data
            .chunks_exact(size)
            .map(|g| {
                (
                    stats::mean(g).unwrap_or_default(),
                    stats::range(g).unwrap_or_default(),
                )
            })
            .unzip();
        let grand_mean = stats::mean(&means).unwrap_or_default();
        let r_bar = stats::mean(&ranges).unwrap_or_default();
        let a2 = self.constants.a2(size);
        let limits = ControlLimits {
            ucl: grand_mean + a2 * r_bar,
            cl: grand_mean,
            lcl: grand_mean - a2 * r_bar,
        };
        let sigma_within = r_bar / self.constants.d2(size);
        (
            limits,
            LimitsSource::XbarR {
                subgroups: means.len(),
            },
            sigma_within,
        )
    }
}

/// (USL − LSL) / 6σ
fn potential_capability(spec: &SpecLimits, sigma: f64) -> Metric {
    let (Some(usl), Some(lsl)) = (spec.usl, spec.lsl) else {
        return Metric::NotApplicable(NotApplicable::MissingSpecLimit);
    };
    if sigma <= 0.0 {
        return Metric::NotApplicable(NotApplicable::DegenerateSigma);
    }
    Metric::Value((usl - lsl) / (6.0 * sigma))
}

/// min over the present bounds of the distance to the limit in 3σ units
fn actual_capability(spec: &SpecLimits, mean: f64, sigma: f64) -> Metric {
    if spec.is_empty() {
        return Metric::NotApplicable(NotApplicable::MissingSpecLimit);
    }
    if sigma <= 0.0 {
        return Metric::NotApplicable(NotApplicable::DegenerateSigma);
    }
    let upper = spec.usl.map(|usl| (usl - mean) / (3.0 * sigma));
    let lower = spec.lsl.map(|lsl| (mean - lsl) / (3.0 * sigma));
    let index = match (upper, lower) {
        (Some(u), Some(l)) => u.min(l),
        (Some(u), None) => u,
        (None, Some(l)) => l,
        (None, None) => return Metric::NotApplicable(NotApplicable::MissingSpecLimit),
    };
    Metric::Value(index)
}

/// Number of points in the longest strictly increasing or decreasing run
pub fn longest_monotonic_run(data: &[f64]) -> usize {
    if data.is_empty() {
        return 0;
    }
    let mut best = 1;
    let mut up = 1;
    let mut down = 1;
    for w in data.windows(2) {
        if w[1] > w[0] {
            up += 1;
            down = 1;
        } else if w[1] < w[0] {
            down += 1;
            up = 1;
        } else {
            up = 1;
            down = 1;
        }
        best = best.max(up).max(down);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [f64; 8] = [45.2, 45.8, 44.9, 46.1, 45.5, 45.3, 45.7, 46.0];

    fn analyze(data: &[f64], usl: Option<f64>, lsl: Option<f64>) -> SpcResult {
        SpcAnalyzer::default()
            .analyze(&SpcInput::new(data.to_vec(), SpecLimits::new(usl, lsl)))
            .unwrap()
    }

    #[test]
    fn test_constants_lookup() {
        let c = SpcConstants::default();
        assert_eq!(c.a2(2), 1.880);
        assert_eq!(c.a2(5), 0.577);
        assert_eq!(c.a2(10), 0.308);
        assert_eq!(c.a2(1), 0.577);
        assert_eq!(c.a2(25), 0.577);
        assert_eq!(c.d2(4), 2.059);
    }

    #[test]
    fn test_reference_scenario() {
        let r = analyze(&SAMPLE, Some(50.0), Some(40.0));
        assert_eq!(r.n, 8);
        assert!((r.mean - 45.5625).abs() < 1e-10);
        assert!((r.sigma_overall - 0.3871).abs() < 1e-3);
        // mean moving range 0.6 / 1.128
        assert!((r.sigma_within - 0.6 / 1.128).abs() < 1e-9);
        assert_eq!(r.limits_source, LimitsSource::MovingRange);

        let pp = r.pp.value().unwrap();
        assert!((pp - 10.0 / (6.0 * r.sigma_overall)).abs() < 1e-9);
        let cp = r.cp.value().unwrap();
        let cpk = r.cpk.value().unwrap();
        assert!(cpk <= cp);
        assert!(r.ppk.value().unwrap() <= pp);
        assert!(r.violations.is_empty());
        assert!(r
            .advisories
            .contains(&SpcAdvisory::SmallSample { n: 8 }));
    }

    #[test]
    fn test_single_value_has_no_capability() {
        let r = analyze(&[10.0], Some(12.0), Some(8.0));
        assert_eq!(r.sigma_overall, 0.0);
        assert_eq!(r.sigma_within, 0.0);
        for m in [r.cp, r.cpk, r.pp, r.ppk] {
            assert_eq!(m, Metric::NotApplicable(NotApplicable::DegenerateSigma));
        }
    }

    #[test]
    fn test_constant_series_reports_not_applicable() {
        let r = analyze(&[3.0; 10], Some(5.0), Some(1.0));
        assert!(!r.cp.is_defined());
        assert!(!r.cpk.is_defined());
        assert!(!r.pp.is_defined());
        assert!(!r.ppk.is_defined());
        assert_eq!(r.normality.skewness, None);
    }

    #[test]
    fn test_one_sided_spec() {
        let r = analyze(&SAMPLE, Some(50.0), None);
        assert_eq!(r.cp, Metric::NotApplicable(NotApplicable::MissingSpecLimit));
        let cpk = r.cpk.value().unwrap();
        assert!((cpk - (50.0 - r.mean) / (3.0 * r.sigma_within)).abs() < 1e-9);
    }

    #[test]
    fn test_no_spec_limits() {
        let r = analyze(&SAMPLE, None, None);
        assert_eq!(r.cpk, Metric::NotApplicable(NotApplicable::MissingSpecLimit));
        assert_eq!(r.ppk, Metric::NotApplicable(NotApplicable::MissingSpecLimit));
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        let err = SpcAnalyzer::default()
            .analyze(&SpcInput::new(vec![], SpecLimits::default()))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { supplied: 0, .. }));
    }

    #[test]
    fn test_inverted_spec_limits_rejected() {
        let err = SpcAnalyzer::default()
            .analyze(&SpcInput::new(SAMPLE.to_vec(), SpecLimits::new(Some(40.0), Some(50.0))))
            .unwrap_err();
        assert_eq!(err, AnalysisError::InvalidSpecLimits { usl: 40.0, lsl: 50.0 });
    }

    #[test]
    fn test_supplied_control_limits() {
        let mut input = SpcInput::new(SAMPLE.to_vec(), SpecLimits::new(Some(50.0), Some(40.0)));
        input.control_limits = Some(ControlLimits {
            ucl: 46.0,
            cl: 45.5,
            lcl: 45.0,
        });
        let r = SpcAnalyzer::default().analyze(&input).unwrap();
        assert_eq!(r.limits_source, LimitsSource::Supplied);
        assert_eq!(r.sigma_within, r.sigma_overall);
        assert_eq!(r.cp, r.pp);
        // 44.9 below, 46.1 above; 46.0 equals the UCL and is not a violation
        assert_eq!(r.violations.len(), 2);
        assert_eq!(r.violations[0].position, 3);
        assert!(!r.violations[0].above);
        assert_eq!(r.violations[1].position, 4);
        assert!(r.violations[1].above);
    }

    #[test]
    fn test_xbar_r_limits() {
        let data = [10.0, 12.0, 11.0, 13.0, 9.0, 11.0, 12.0];
        let mut input = SpcInput::new(data.to_vec(), SpecLimits::new(Some(20.0), Some(0.0)));
        input.subgroup_size = 2;
        let r = SpcAnalyzer::default().analyze(&input).unwrap();
        // subgroups (10,12) (11,13) (9,11); 12.0 trails
        assert_eq!(r.limits_source, LimitsSource::XbarR { subgroups: 3 });
        assert!((r.limits.cl - 11.0).abs() < 1e-10);
        assert!((r.limits.ucl - (11.0 + 1.880 * 2.0)).abs() < 1e-10);
        assert!((r.sigma_within - 2.0 / 1.128).abs() < 1e-10);
        assert!(r
            .advisories
            .contains(&SpcAdvisory::IncompleteSubgroup { discarded: 1 }));
    }

    #[test]
    fn test_subgroup_larger_than_series() {
        let mut input = SpcInput::new(vec![1.0, 2.0, 3.0], SpecLimits::default());
        input.subgroup_size = 5;
        let err = SpcAnalyzer::default().analyze(&input).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                required: 5,
                supplied: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_normality_concern_on_outlier() {
        let mut data = vec![10.0; 29];
        data.push(30.0);
        data[0] = 10.1;
        let r = analyze(&data, Some(40.0), Some(0.0));
        assert!(r.normality.concern());
        assert!(r.advisories.contains(&SpcAdvisory::NormalityConcern));
        assert!(!r.advisories.iter().any(|a| matches!(a, SpcAdvisory::SmallSample { .. })));
    }

    #[test]
    fn test_monotonic_run() {
        assert_eq!(longest_monotonic_run(&[]), 0);
        assert_eq!(longest_monotonic_run(&[1.0, 1.0]), 1);
        assert_eq!(longest_monotonic_run(&[5.0, 1.0, 2.0, 3.0, 4.0, 2.0]), 4);
        let rising: Vec<f64> = (0..8).map(f64::from).collect();
        let r = analyze(&rising, None, None);
        assert!(r.advisories.contains(&SpcAdvisory::MonotonicRun { length: 8 }));
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn cpk_never_exceeds_cp(
                data in proptest::collection::vec(0.0f64..100.0, 2..60),
                lsl in -50.0f64..0.0,
                width in 101.0f64..300.0,
            ) {
                let input = SpcInput::new(data, SpecLimits::new(Some(lsl + width), Some(lsl)));
                let r = SpcAnalyzer::default().analyze(&input).unwrap();
                if let (Some(cp), Some(cpk)) = (r.cp.value(), r.cpk.value()) {
                    prop_assert!(cpk <= cp * (1.0 + 1e-9) + 1e-9);
                }
                if let (Some(pp), Some(ppk)) = (r.pp.value(), r.ppk.value()) {
                    prop_assert!(ppk <= pp * (1.0 + 1e-9) + 1e-9);
                }
            }

            #[test]
            fn identical_values_never_divide_by_zero(v in -1e6f64..1e6, n in 2usize..40) {
                let input = SpcInput::new(vec![v; n], SpecLimits::new(Some(v + 1.0), Some(v - 1.0)));
                let r = SpcAnalyzer::default().analyze(&input).unwrap();
                prop_assert!(!r.cp.is_defined());
                prop_assert!(!r.cpk.is_defined());
                prop_assert!(!r.pp.is_defined());
                prop_assert!(!r.ppk.is_defined());
            }
        }
    }
}
