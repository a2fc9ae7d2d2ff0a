//! Portfolio evaluation along performance, analyst and transparency axes.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use moat_types::{
    AnalystCorrelation, AnalystScore, EvaluationResult, PerformanceMetrics, PortfolioResult,
    ReturnSeries, StockScore, Ticker, TransparencyMetrics,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{correlation::spearman_test, risk::RiskCalculator};

/// Configuration for strategy evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Annual risk-free rate for the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Periods per year used for annualization.
    pub annualization_factor: usize,
    /// Sample size below which the analyst correlation is flagged as unreliable.
    pub min_correlation_sample: usize,
    /// Fraction of paired tickers forming the "top" set for the hit rate.
    pub hit_rate_fraction: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            annualization_factor: 252,
            min_correlation_sample: 30,
            hit_rate_fraction: 0.20,
        }
    }
}

/// Evaluates a constructed portfolio.
///
/// The three axes are independent:
/// - performance of the realized return series against the benchmark;
/// - Spearman agreement between strategy scores and external analyst scores;
/// - transparency, i.e. how well the holdings are backed by scored claims.
#[derive(Debug, Clone, Default)]
pub struct StrategyEvaluator {
    config: EvaluatorConfig,
}

impl StrategyEvaluator {
    /// Create an evaluator with the given configuration.
    pub const fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Risk calculator configured from this evaluator.
    pub const fn risk_calculator(&self) -> RiskCalculator {
        RiskCalculator::new(self.config.risk_free_rate, self.config.annualization_factor)
    }

    /// Evaluate `portfolio` built at `threshold`.
    ///
    /// The result date is the last benchmark observation, or today when the
    /// benchmark series is empty.
    pub fn evaluate(
        &self,
        portfolio: &PortfolioResult,
        portfolio_returns: &ReturnSeries,
        benchmark_returns: &ReturnSeries,
        analyst_scores: &HashMap<Ticker, AnalystScore>,
        stock_scores: &HashMap<Ticker, StockScore>,
        threshold: f64,
    ) -> EvaluationResult {
        let as_of_date = benchmark_returns
            .last_date()
            .unwrap_or_else(|| Utc::now().date_naive());

        let result = EvaluationResult {
            threshold,
            portfolio_size: portfolio.len(),
            performance: self.performance(portfolio_returns, benchmark_returns),
            analyst_correlation: self.analyst_correlation(portfolio, analyst_scores),
            transparency: self.transparency(portfolio, stock_scores),
            as_of_date,
        };

        debug!(
            threshold,
            portfolio_size = result.portfolio_size,
            sharpe = result.performance.sharpe_ratio,
            coverage = result.transparency.coverage_rate,
            "evaluated portfolio"
        );
        result
    }

    /// Return-based metrics.
    pub fn performance(&self, portfolio: &ReturnSeries, benchmark: &ReturnSeries) -> PerformanceMetrics {
        self.risk_calculator().performance(portfolio, benchmark)
    }

    /// Rank agreement between holding scores and mean analyst scores.
    ///
    /// Only holdings with at least one finite analyst sub-score take part.
    pub fn analyst_correlation(
        &self,
        portfolio: &PortfolioResult,
        analyst_scores: &HashMap<Ticker, AnalystScore>,
    ) -> AnalystCorrelation {
        let pairs: Vec<(&Ticker, f64, f64)> = portfolio
            .holdings()
            .iter()
            .filter_map(|h| {
                let analyst = analyst_scores.get(h.ticker())?.mean()?;
                Some((h.ticker(), h.score(), analyst))
            })
            .collect();

        let sample_size = pairs.len();
        if sample_size < 2 {
            return AnalystCorrelation {
                sample_size,
                ..AnalystCorrelation::default()
            };
        }
        if sample_size < self.config.min_correlation_sample {
            warn!(
                sample_size,
                recommended = self.config.min_correlation_sample,
                "analyst correlation sample is small; treat the result as indicative"
            );
        }

        let strategy: Vec<f64> = pairs.iter().map(|(_, s, _)| *s).collect();
        let analyst: Vec<f64> = pairs.iter().map(|(_, _, a)| *a).collect();
        let test = spearman_test(&strategy, &analyst);

        AnalystCorrelation {
            spearman_correlation: test.rho,
            sample_size,
            p_value: test.p_value,
            hit_rate: Some(self.hit_rate(&pairs)),
        }
    }

    /// Claim coverage of the holdings.
    ///
    /// Means are taken over holdings with a matching score; an empty portfolio
    /// or one with no matches yields zeros.
    pub fn transparency(
        &self,
        portfolio: &PortfolioResult,
        stock_scores: &HashMap<Ticker, StockScore>,
    ) -> TransparencyMetrics {
        if portfolio.is_empty() {
            return TransparencyMetrics::default();
        }

        let matched: Vec<&StockScore> = portfolio
            .holdings()
            .iter()
            .filter_map(|h| stock_scores.get(h.ticker()))
            .collect();
        if matched.is_empty() {
            return TransparencyMetrics::default();
        }

        let n = matched.len() as f64;
        TransparencyMetrics {
            mean_claim_count: matched.iter().map(|s| s.claim_count() as f64).sum::<f64>() / n,
            mean_structural_weight: matched.iter().map(|s| s.structural_weight()).sum::<f64>() / n,
            coverage_rate: n / portfolio.len() as f64,
        }
    }

    /// Overlap between the top strategy and top analyst sets.
    fn hit_rate(&self, pairs: &[(&Ticker, f64, f64)]) -> f64 {
        let top_n = ((pairs.len() as f64 * self.config.hit_rate_fraction).round() as usize).max(1);
        let by_strategy = top_tickers(pairs, top_n, |p| p.1);
        let by_analyst = top_tickers(pairs, top_n, |p| p.2);
        by_strategy.intersection(&by_analyst).count() as f64 / top_n as f64
    }
}

/// The `n` tickers with the highest key; ties resolved by ticker.
fn top_tickers<'a>(
    pairs: &[(&'a Ticker, f64, f64)],
    n: usize,
    key: impl Fn(&(&'a Ticker, f64, f64)) -> f64,
) -> HashSet<&'a Ticker> {
    let mut sorted: Vec<&(&Ticker, f64, f64)> = pairs.iter().collect();
    sorted.sort_by(|a, b| key(*b).total_cmp(&key(*a)).then_with(|| a.0.cmp(b.0)));
    sorted.into_iter().take(n).map(|p| p.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use moat_types::{Date, PortfolioHolding};

    fn date(day: u32) -> Date {
        Date::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn portfolio(entries: &[(&str, f64)]) -> PortfolioResult {
        let weight = 1.0 / entries.len().max(1) as f64;
        let holdings = entries
            .iter()
            .map(|(t, score)| PortfolioHolding::new(ticker(t), weight, "Tech", *score, "").unwrap())
            .collect();
        PortfolioResult::new(holdings, Vec::new(), date(1))
    }

    fn analysts(entries: &[(&str, f64)]) -> HashMap<Ticker, AnalystScore> {
        entries
            .iter()
            .map(|(t, s)| (ticker(t), AnalystScore::new([("kc", *s), ("ag", *s)])))
            .collect()
    }

    #[test]
    fn test_correlation_needs_two_pairs() {
        let evaluator = StrategyEvaluator::default();
        let p = portfolio(&[("A", 0.9), ("B", 0.5)]);

        let none = evaluator.analyst_correlation(&p, &HashMap::new());
        assert_eq!(none.sample_size, 0);
        assert_eq!(none.spearman_correlation, None);
        assert_eq!(none.p_value, None);
        assert_eq!(none.hit_rate, None);

        let one = evaluator.analyst_correlation(&p, &analysts(&[("A", 0.7)]));
        assert_eq!(one.sample_size, 1);
        assert_eq!(one.spearman_correlation, None);
        assert_eq!(one.p_value, None);
        assert_eq!(one.hit_rate, None);
    }

    #[test]
    fn test_correlation_and_hit_rate() {
        let evaluator = StrategyEvaluator::default();
        let names = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"];
        let entries: Vec<(&str, f64)> = names
            .iter()
            .enumerate()
            .map(|(i, t)| (*t, 0.95 - 0.05 * i as f64))
            .collect();
        let p = portfolio(&entries);
        let a = analysts(&entries);

        let corr = evaluator.analyst_correlation(&p, &a);
        assert_eq!(corr.sample_size, 10);
        assert_relative_eq!(corr.spearman_correlation.unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(corr.hit_rate, Some(1.0));
    }

    #[test]
    fn test_hit_rate_partial_overlap() {
        let evaluator = StrategyEvaluator::default();
        // Top 20% of 10 = 2. Strategy top: A, B. Analyst top: A, C.
        let p = portfolio(&[
            ("A", 0.9),
            ("B", 0.85),
            ("C", 0.8),
            ("D", 0.7),
            ("E", 0.6),
            ("F", 0.5),
            ("G", 0.4),
            ("H", 0.3),
            ("I", 0.2),
            ("J", 0.1),
        ]);
        let a = analysts(&[
            ("A", 0.9),
            ("B", 0.1),
            ("C", 0.8),
            ("D", 0.5),
            ("E", 0.4),
            ("F", 0.3),
            ("G", 0.2),
            ("H", 0.15),
            ("I", 0.12),
            ("J", 0.11),
        ]);
        let corr = evaluator.analyst_correlation(&p, &a);
        assert_eq!(corr.hit_rate, Some(0.5));
    }

    #[test]
    fn test_hit_rate_minimum_one() {
        let evaluator = StrategyEvaluator::default();
        let p = portfolio(&[("A", 0.9), ("B", 0.2)]);
        let a = analysts(&[("A", 0.1), ("B", 0.8)]);
        let corr = evaluator.analyst_correlation(&p, &a);
        assert_eq!(corr.hit_rate, Some(0.0));
        assert_relative_eq!(corr.spearman_correlation.unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transparency_empty_portfolio() {
        let evaluator = StrategyEvaluator::default();
        let metrics = evaluator.transparency(&PortfolioResult::empty(date(1)), &HashMap::new());
        assert_eq!(
            metrics,
            TransparencyMetrics {
                mean_claim_count: 0.0,
                mean_structural_weight: 0.0,
                coverage_rate: 0.0,
            }
        );
    }

    #[test]
    fn test_transparency_partial_coverage() {
        let evaluator = StrategyEvaluator::default();
        let p = portfolio(&[("A", 0.9), ("B", 0.5), ("C", 0.4), ("D", 0.3)]);
        let mut scores = HashMap::new();
        scores.insert(ticker("A"), StockScore::new(ticker("A"), 0.9, 4, 0.5).unwrap());
        scores.insert(ticker("B"), StockScore::new(ticker("B"), 0.5, 2, 0.0).unwrap());

        let metrics = evaluator.transparency(&p, &scores);
        assert_relative_eq!(metrics.mean_claim_count, 3.0);
        assert_relative_eq!(metrics.mean_structural_weight, 0.25);
        assert_relative_eq!(metrics.coverage_rate, 0.5);
    }

    #[test]
    fn test_evaluate_uses_last_benchmark_date() {
        let evaluator = StrategyEvaluator::default();
        let p = portfolio(&[("A", 0.9), ("B", 0.5)]);
        let port = ReturnSeries::new([(date(1), 0.01), (date(2), -0.004), (date(3), 0.006)]);
        let bench = ReturnSeries::new([(date(1), 0.008), (date(2), -0.002), (date(3), 0.003)]);

        let result = evaluator.evaluate(&p, &port, &bench, &HashMap::new(), &HashMap::new(), 0.5);
        assert_eq!(result.as_of_date, date(3));
        assert_eq!(result.portfolio_size, 2);
        assert_eq!(result.threshold, 0.5);
        assert!(result.performance.sharpe_ratio.is_finite());
    }

    #[test]
    fn test_evaluate_empty_benchmark_uses_today() {
        let evaluator = StrategyEvaluator::default();
        let p = PortfolioResult::empty(date(1));
        let empty = ReturnSeries::default();
        let result = evaluator.evaluate(&p, &empty, &empty, &HashMap::new(), &HashMap::new(), 0.0);
        assert_eq!(result.as_of_date, Utc::now().date_naive());
        assert_eq!(result.performance.cumulative_return, 0.0);
        assert!(result.performance.sharpe_ratio.is_nan());
    }
}
