//! Statistical helpers shared by the scoring and evaluation stages.

/// Minimum threshold for a dispersion estimate to be treated as non-zero.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Consistency constant that scales MAD to the standard deviation of a normal
/// distribution.
pub const MAD_SCALE: f64 = 1.4826;

/// Which dispersion estimate a robust z-score ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispersion {
    /// Scaled median absolute deviation.
    Mad,
    /// Sample standard deviation, used when MAD collapses to zero.
    StdDev,
    /// No dispersion at all; every z-score is zero.
    Degenerate,
}

/// Robust z-score standardization result.
#[derive(Debug, Clone, Copy)]
pub struct RobustResult {
    /// Median of the finite inputs.
    pub median: f64,
    /// Scale the deviations were divided by.
    pub scale: f64,
    /// Dispersion estimate used.
    pub dispersion: Dispersion,
}

/// Median of the finite values, NaN when there are none.
pub fn median(values: &[f64]) -> f64 {
    let mut finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        (finite[mid - 1] + finite[mid]) / 2.0
    } else {
        finite[mid]
    }
}

/// Median absolute deviation from the median (unscaled).
pub fn median_abs_deviation(values: &[f64]) -> f64 {
    let center = median(values);
    let deviations: Vec<f64> = values
        .iter()
        .filter(|x| x.is_finite())
        .map(|x| (x - center).abs())
        .collect();
    median(&deviations)
}

/// Sample standard deviation (N-1 denominator) of the finite values.
pub fn sample_std(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    let n = finite.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = finite.iter().sum::<f64>() / n as f64;
    let variance = finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Robust z-scores: `(x - median) / (1.4826 * MAD)`.
///
/// When the MAD is zero (more than half of the values coincide) the sample
/// standard deviation is used instead; when that is zero too, all scores are
/// zero. Non-finite inputs produce NaN.
///
/// # Examples
///
/// ```
/// use moat_types::stats::{robust_zscores, Dispersion};
///
/// let (z, result) = robust_zscores(&[1.0, 2.0, 3.0, 4.0, 100.0]);
/// assert_eq!(result.dispersion, Dispersion::Mad);
/// assert!(z[2].abs() < 1e-12);
/// ```
pub fn robust_zscores(values: &[f64]) -> (Vec<f64>, RobustResult) {
    let center = median(values);
    if !center.is_finite() {
        return (
            vec![f64::NAN; values.len()],
            RobustResult {
                median: f64::NAN,
                scale: f64::NAN,
                dispersion: Dispersion::Degenerate,
            },
        );
    }

    let mad = MAD_SCALE * median_abs_deviation(values);
    let (scale, dispersion) = if mad > MIN_STD_THRESHOLD {
        (mad, Dispersion::Mad)
    } else {
        let std = sample_std(values);
        if std > MIN_STD_THRESHOLD {
            (std, Dispersion::StdDev)
        } else {
            (0.0, Dispersion::Degenerate)
        }
    };

    let z = values
        .iter()
        .map(|x| {
            if !x.is_finite() {
                f64::NAN
            } else if dispersion == Dispersion::Degenerate {
                0.0
            } else {
                (x - center) / scale
            }
        })
        .collect();

    (
        z,
        RobustResult {
            median: center,
            scale,
            dispersion,
        },
    )
}
