//! Rank correlation between strategy and analyst scores.
//!
//! Spearman's rho is the Pearson correlation of average ranks. Its two-sided
//! p-value uses the Student-t approximation with `n - 2` degrees of freedom.

use statrs::distribution::{ContinuousCDF, StudentsT};

/// Spearman correlation with its significance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpearmanTest {
    /// Rank correlation, `None` when undefined (fewer than two pairs or a
    /// constant input).
    pub rho: Option<f64>,
    /// Two-sided p-value, `None` when it cannot be computed.
    pub p_value: Option<f64>,
}

/// Spearman correlation and two-sided p-value of paired samples.
///
/// Pairs with a non-finite member are dropped first.
pub fn spearman_test(x: &[f64], y: &[f64]) -> SpearmanTest {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();

    let n = pairs.len();
    if n < 2 {
        return SpearmanTest {
            rho: None,
            p_value: None,
        };
    }

    let ranks_x = compute_ranks(&pairs.iter().map(|(a, _)| *a).collect::<Vec<_>>());
    let ranks_y = compute_ranks(&pairs.iter().map(|(_, b)| *b).collect::<Vec<_>>());
    let rho = pearson(&ranks_x, &ranks_y);

    SpearmanTest {
        rho,
        p_value: rho.and_then(|r| t_test_p_value(r, n)),
    }
}

/// Two-sided p-value for a correlation `r` over `n` pairs.
fn t_test_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 {
        return None;
    }
    let dof = (n - 2) as f64;
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Some(0.0);
    }
    let t = r * (dof / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, dof).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Compute ranks of values (handling ties with average rank).
fn compute_ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j < n && (indexed[j].1 - indexed[i].1).abs() < f64::EPSILON {
            j += 1;
        }
        let avg_rank = (i + j - 1) as f64 / 2.0;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank;
        }
        i = j;
    }
    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
