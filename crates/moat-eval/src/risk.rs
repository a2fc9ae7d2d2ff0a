//! Return-series risk statistics.

use moat_types::{PerformanceMetrics, ReturnSeries};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Computes Sharpe ratio, drawdown, beta and information ratio.
///
/// Statistics that need at least two observations, or a non-zero dispersion,
/// are NaN when those are missing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskCalculator {
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
    /// Periods per year used for annualization.
    pub annualization_factor: usize,
}

impl Default for RiskCalculator {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            annualization_factor: 252,
        }
    }
}

impl RiskCalculator {
    /// Create a calculator.
    pub const fn new(risk_free_rate: f64, annualization_factor: usize) -> Self {
        Self {
            risk_free_rate,
            annualization_factor,
        }
    }

    /// All performance metrics for a portfolio against its benchmark.
    ///
    /// Sharpe, drawdown and cumulative return use the whole portfolio series;
    /// beta and information ratio use the dates both series share.
    pub fn performance(&self, portfolio: &ReturnSeries, benchmark: &ReturnSeries) -> PerformanceMetrics {
        let (port, bench) = portfolio.align(benchmark);
        PerformanceMetrics {
            sharpe_ratio: self.sharpe_ratio(portfolio.values()),
            max_drawdown: max_drawdown(portfolio.values()),
            beta: beta(&port, &bench),
            information_ratio: self.information_ratio(&port, &bench),
            cumulative_return: cumulative_return(portfolio.values()),
        }
    }

    /// Annualized Sharpe ratio of periodic returns.
    pub fn sharpe_ratio(&self, returns: &[f64]) -> f64 {
        let periodic_rf = self.risk_free_rate / self.annualization_factor as f64;
        let excess: Array1<f64> = finite(returns).mapv(|r| r - periodic_rf);
        self.annualized_ratio(&excess)
    }

    /// Annualized mean active return over tracking error.
    pub fn information_ratio(&self, portfolio: &[f64], benchmark: &[f64]) -> f64 {
        let active: Array1<f64> = portfolio
            .iter()
            .zip(benchmark)
            .map(|(p, b)| p - b)
            .filter(|x| x.is_finite())
            .collect();
        self.annualized_ratio(&active)
    }

    fn annualized_ratio(&self, values: &Array1<f64>) -> f64 {
        if values.len() < 2 {
            return f64::NAN;
        }
        let mean = values.mean().unwrap_or(f64::NAN);
        let std = values.std(1.0);
        if std == 0.0 {
            f64::NAN
        } else {
            mean / std * (self.annualization_factor as f64).sqrt()
        }
    }
}

/// Compounded return: `Π(1 + r) - 1`.
pub fn cumulative_return(returns: &[f64]) -> f64 {
    finite(returns).iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Largest peak-to-trough decline of the compounded wealth curve.
///
/// Reported as a positive fraction; 0.0 for a series that never falls.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut max_dd: f64 = 0.0;
    let mut wealth = 1.0;
    let mut peak = 1.0;

    for r in finite(returns).iter() {
        wealth *= 1.0 + r;
        if wealth > peak {
            peak = wealth;
        }
        max_dd = max_dd.max((peak - wealth) / peak);
    }
    max_dd
}

/// Covariance of portfolio with benchmark over benchmark variance.
pub fn beta(portfolio: &[f64], benchmark: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = portfolio
        .iter()
        .zip(benchmark)
        .filter(|(p, b)| p.is_finite() && b.is_finite())
        .map(|(&p, &b)| (p, b))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let p: Array1<f64> = pairs.iter().map(|(p, _)| *p).collect();
    let b: Array1<f64> = pairs.iter().map(|(_, b)| *b).collect();
    let n = pairs.len() as f64;
    let p_mean = p.mean().unwrap_or(0.0);
    let b_mean = b.mean().unwrap_or(0.0);

    let covariance = ((&p - p_mean) * (&b - b_mean)).sum() / (n - 1.0);
    let variance = b.var(1.0);
    if variance == 0.0 {
        f64::NAN
    } else {
        covariance / variance
    }
}

fn finite(values: &[f64]) -> Array1<f64> {
    values.iter().copied().filter(|x| x.is_finite()).collect()
}
