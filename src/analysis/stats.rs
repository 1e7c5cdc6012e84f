//! Descriptive statistics and least-squares primitives
//!
//! Functions return `None` when the input cannot support the statistic
//! (empty slice, too few points, zero variance where a ratio is needed).

/// Arithmetic mean.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation (n denominator). A single value gives 0.
pub fn population_std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    if is_constant(data) {
        return Some(0.0);
    }
    let ss: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / data.len() as f64).sqrt())
}

/// Sample standard deviation (n - 1 denominator). Needs two values.
pub fn sample_std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    if is_constant(data) {
        return Some(0.0);
    }
    let ss: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (data.len() - 1) as f64).sqrt())
}

/// Every value equal to the first. Summation rounding would otherwise leave
/// a tiny non-zero spread for a constant series.
pub fn is_constant(data: &[f64]) -> bool {
    data.windows(2).all(|w| w[0] == w[1])
}

pub fn min(data: &[f64]) -> Option<f64> {
    data.iter().copied().reduce(f64::min)
}

pub fn max(data: &[f64]) -> Option<f64> {
    data.iter().copied().reduce(f64::max)
}

/// max - min
pub fn range(data: &[f64]) -> Option<f64> {
    Some(max(data)? - min(data)?)
}

/// |x_i - x_{i-1}| for consecutive pairs.
pub fn moving_ranges(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

/// Moment skewness Σ(x−x̄)³ / (n·σ³) using the population σ.
///
/// Needs more than two values and a non-zero σ.
pub fn skewness(data: &[f64]) -> Option<f64> {
    if data.len() <= 2 {
        return None;
    }
    let m = mean(data)?;
    let sigma = population_std_dev(data)?;
    if sigma == 0.0 {
        return None;
    }
    let n = data.len() as f64;
    let m3: f64 = data.iter().map(|x| (x - m).powi(3)).sum();
    Some(m3 / (n * sigma.powi(3)))
}

/// Excess kurtosis Σ(x−x̄)⁴ / (n·σ⁴) − 3 using the population σ.
///
/// Needs more than three values and a non-zero σ.
pub fn excess_kurtosis(data: &[f64]) -> Option<f64> {
    if data.len() <= 3 {
        return None;
    }
    let m = mean(data)?;
    let sigma = population_std_dev(data)?;
    if sigma == 0.0 {
        return None;
    }
    let n = data.len() as f64;
    let m4: f64 = data.iter().map(|x| (x - m).powi(4)).sum();
    Some(m4 / (n * sigma.powi(4)) - 3.0)
}

/// Ordinary least-squares fit of `y` against its index `0..n`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination. A constant series has nothing to
    /// explain and reports 0.
    pub r_squared: f64,
    /// Standard error of the slope from the residual mean square
    pub slope_std_error: f64,
    pub n: usize,
}

impl LinearFit {
    /// Fitted value at index `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// slope / SE. A perfect fit with a non-zero slope is infinitely
    /// significant; a flat perfect fit has no signal.
    pub fn t_statistic(&self) -> f64 {
        if self.slope_std_error > 0.0 {
            self.slope / self.slope_std_error
        } else if self.slope == 0.0 {
            0.0
        } else {
            f64::INFINITY.copysign(self.slope)
        }
    }
}

/// Fit `y = intercept + slope·i`. Needs at least three points so that the
/// residual mean square has a positive degree of freedom.
pub fn linear_fit_by_index(y: &[f64]) -> Option<LinearFit> {
    let n = y.len();
    if n < 3 {
        return None;
    }
    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = mean(y)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (yi - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, &yi) in y.iter().enumerate() {
        let fitted = intercept + slope * i as f64;
        ss_res += (yi - fitted).powi(2);
        ss_tot += (yi - y_mean).powi(2);
    }
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    };
    let mse = ss_res / (nf - 2.0);
    let slope_std_error = (mse / sxx).sqrt();

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        slope_std_error,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [f64; 8] = [45.2, 45.8, 44.9, 46.1, 45.5, 45.3, 45.7, 46.0];

    #[test]
    fn test_mean() {
        assert!((mean(&SAMPLE).unwrap() - 45.5625).abs() < 1e-10);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_population_std_dev() {
        let sd = population_std_dev(&SAMPLE).unwrap();
        assert!((sd - 0.3871).abs() < 1e-3, "sd = {sd}");
        assert_eq!(population_std_dev(&[3.0]), Some(0.0));
    }

    #[test]
    fn test_sample_std_dev() {
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138089935).abs() < 1e-6);
        assert_eq!(sample_std_dev(&[1.0]), None);
    }

    #[test]
    fn test_range_and_moving_ranges() {
        assert_eq!(range(&[3.0, 1.0, 4.0]), Some(3.0));
        assert_eq!(moving_ranges(&[3.0, 1.0, 4.0]), vec![2.0, 3.0]);
        assert!(moving_ranges(&[1.0]).is_empty());
    }

    #[test]
    fn test_skewness_requires_three_points() {
        assert_eq!(skewness(&[1.0, 2.0]), None);
        let symmetric = skewness(&[1.0, 2.0, 3.0]).unwrap();
        assert!(symmetric.abs() < 1e-12);
    }

    #[test]
    fn test_skewness_right_tail_positive() {
        let s = skewness(&[1.0, 1.0, 1.0, 1.0, 10.0]).unwrap();
        assert!(s > 1.0);
    }

    #[test]
    fn test_kurtosis_requires_four_points() {
        assert_eq!(excess_kurtosis(&[1.0, 2.0, 3.0]), None);
        // Two-point symmetric distribution has excess kurtosis of -2
        let k = excess_kurtosis(&[0.0, 1.0, 0.0, 1.0]).unwrap();
        assert!((k + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_has_no_shape_statistics() {
        let flat = [5.0; 6];
        assert_eq!(skewness(&flat), None);
        assert_eq!(excess_kurtosis(&flat), None);
    }

    #[test]
    fn test_linear_fit_perfect_line() {
        let fit = linear_fit_by_index(&[1.0, 3.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-10);
        assert!((fit.intercept - 1.0).abs() < 1e-10);
        assert!((fit.r_squared - 1.0).abs() < 1e-10);
        assert!(fit.t_statistic().is_infinite());
        assert!((fit.predict(5.0) - 11.0).abs() < 1e-10);
    }

    #[test]
    fn test_linear_fit_flat_series() {
        let fit = linear_fit_by_index(&[4.0; 5]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
        assert_eq!(fit.t_statistic(), 0.0);
    }

    #[test]
    fn test_linear_fit_noisy_series() {
        let fit = linear_fit_by_index(&[1.0, 2.5, 2.0, 4.0, 4.5, 6.5]).unwrap();
        assert!(fit.slope > 0.0);
        assert!(fit.r_squared > 0.8 && fit.r_squared < 1.0);
        assert!(fit.slope_std_error > 0.0);
    }

    #[test]
    fn test_linear_fit_needs_three_points() {
        assert!(linear_fit_by_index(&[1.0, 2.0]).is_none());
    }

    mod proptests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn arithmetic_series_fits_exactly(
                start in -1000.0f64..1000.0,
                step in 0.01f64..50.0,
                n in 3usize..60,
            ) {
                let y: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
                let fit = linear_fit_by_index(&y).unwrap();
                prop_assert!(fit.slope > 0.0);
                prop_assert!((fit.r_squared - 1.0).abs() < 1e-9);
            }

            #[test]
            fn population_sd_never_exceeds_sample_sd(
                data in proptest::collection::vec(-100.0f64..100.0, 2..50),
            ) {
                let p = population_std_dev(&data).unwrap();
                let s = sample_std_dev(&data).unwrap();
                prop_assert!(p <= s + 1e-12);
            }
        }
    }
}
