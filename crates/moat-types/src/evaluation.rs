//! Evaluation records produced for a constructed portfolio.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Date;

/// External analyst assessment of a ticker, keyed by source name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalystScore {
    /// Sub-scores by source, e.g. `{"source_a": 0.7, "source_b": 0.6}`.
    pub scores: BTreeMap<String, f64>,
}

impl AnalystScore {
    /// Create from named sub-scores.
    pub fn new<I, K>(scores: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            scores: scores.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Mean of the finite sub-scores, `None` when there are none.
    pub fn mean(&self) -> Option<f64> {
        let finite: Vec<f64> = self.scores.values().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        }
    }
}

/// Risk and return statistics of a realized return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Annualized Sharpe ratio.
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough loss, as a positive fraction.
    pub max_drawdown: f64,
    /// Beta against the benchmark.
    pub beta: f64,
    /// Annualized information ratio against the benchmark.
    pub information_ratio: f64,
    /// Compounded return over the series.
    pub cumulative_return: f64,
}

/// Rank agreement between strategy scores and analyst scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalystCorrelation {
    /// Spearman rank correlation, `None` below two pairs.
    pub spearman_correlation: Option<f64>,
    /// Number of paired observations.
    pub sample_size: usize,
    /// Two-sided p-value of the correlation.
    pub p_value: Option<f64>,
    /// Overlap of the top-quintile sets.
    pub hit_rate: Option<f64>,
}

/// How much of the portfolio is explained by scored claims.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransparencyMetrics {
    /// Mean claim count of covered holdings.
    pub mean_claim_count: f64,
    /// Mean structural weight of covered holdings.
    pub mean_structural_weight: f64,
    /// Fraction of holdings with a matching score.
    pub coverage_rate: f64,
}

/// Full evaluation of one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Minimum aggregate score the portfolio was built with.
    pub threshold: f64,
    /// Number of holdings.
    pub portfolio_size: usize,
    /// Return-based statistics.
    pub performance: PerformanceMetrics,
    /// Agreement with external analysts.
    pub analyst_correlation: AnalystCorrelation,
    /// Claim coverage statistics.
    pub transparency: TransparencyMetrics,
    /// Date of the last benchmark observation.
    pub as_of_date: Date,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyst_score_mean() {
        let score = AnalystScore::new([("kc", 0.8), ("ag", 0.6)]);
        assert!((score.mean().unwrap() - 0.7).abs() < 1e-12);

        let partial = AnalystScore::new([("kc", f64::NAN), ("ag", 0.4)]);
        assert_eq!(partial.mean(), Some(0.4));

        assert_eq!(AnalystScore::default().mean(), None);
    }

    #[test]
    fn test_correlation_serializes_nulls() {
        let corr = AnalystCorrelation::default();
        let json = serde_json::to_string(&corr).unwrap();
        assert!(json.contains("\"spearman_correlation\":null"));
        assert!(json.contains("\"hit_rate\":null"));
    }
}
