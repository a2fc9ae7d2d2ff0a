//! End-to-end orchestration of the strategy stages.

use std::{collections::HashMap, fs, path::Path};

use moat_eval::{EvaluatorConfig, StrategyEvaluator, portfolio_returns};
use moat_output::OutputBundle;
use moat_portfolio::{PortfolioBuilder, PortfolioConfig};
use moat_score::{AggregatorConfig, NeutralizedScores, NeutralizerConfig, ScoreAggregator, SectorNeutralizer};
use moat_types::{
    AnalystScore, BenchmarkWeight, Date, EvaluationResult, PortfolioResult, ReturnSeries,
    ScoredClaim, StockScore, Ticker, UniverseConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{PipelineError, Result};

/// Configuration for every stage. Missing sections take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Claim aggregation settings.
    pub aggregator: AggregatorConfig,
    /// Sector neutralization settings.
    pub neutralizer: NeutralizerConfig,
    /// Portfolio construction settings.
    pub portfolio: PortfolioConfig,
    /// Evaluation settings.
    pub evaluator: EvaluatorConfig,
}

impl PipelineConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

/// Realized returns and analyst opinions used for evaluation.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    /// Periodic returns per ticker.
    pub stock_returns: HashMap<Ticker, ReturnSeries>,
    /// Periodic benchmark returns.
    pub benchmark_returns: ReturnSeries,
    /// External analyst scores per ticker.
    pub analyst_scores: HashMap<Ticker, AnalystScore>,
}

/// Everything one pipeline run consumes.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    /// Date the portfolio is constructed for.
    pub as_of_date: Date,
    /// Scored claims per ticker.
    pub scored_claims: HashMap<Ticker, Vec<ScoredClaim>>,
    /// Ticker to GICS sector map.
    pub universe: UniverseConfig,
    /// Benchmark sector weights.
    pub benchmark: Vec<BenchmarkWeight>,
    /// Market data; evaluation is skipped without it.
    pub market: Option<MarketData>,
}

/// Outputs of every stage of one run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Aggregate score per ticker with claims.
    pub stock_scores: HashMap<Ticker, StockScore>,
    /// Sector-neutralized scores.
    pub neutralized: NeutralizedScores,
    /// Constructed portfolio.
    pub portfolio: PortfolioResult,
    /// Evaluation, present when market data was supplied.
    pub evaluation: Option<EvaluationResult>,
}

impl PipelineRun {
    /// Borrow this run as a report bundle.
    pub fn bundle<'a>(&'a self, inputs: &'a PipelineInputs) -> OutputBundle<'a> {
        OutputBundle {
            portfolio: &self.portfolio,
            stock_scores: &self.stock_scores,
            scored_claims: &inputs.scored_claims,
            evaluation: self.evaluation.as_ref(),
        }
    }
}

/// Runs aggregation, neutralization, construction and evaluation in order.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    aggregator: ScoreAggregator,
    neutralizer: SectorNeutralizer,
    builder: PortfolioBuilder,
    evaluator: StrategyEvaluator,
}

impl Pipeline {
    /// Create a pipeline from stage configurations.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            aggregator: ScoreAggregator::new(config.aggregator),
            neutralizer: SectorNeutralizer::new(config.neutralizer),
            builder: PortfolioBuilder::new(config.portfolio),
            evaluator: StrategyEvaluator::new(config.evaluator),
        }
    }

    /// Run every stage once for `inputs.as_of_date`.
    ///
    /// The evaluation records a threshold of 0.0, i.e. no score filter.
    pub fn run(&self, inputs: &PipelineInputs) -> Result<PipelineRun> {
        info!(tickers = inputs.scored_claims.len(), "aggregating claims");
        let stock_scores = self.aggregator.aggregate(&inputs.scored_claims);

        info!(scores = stock_scores.len(), "neutralizing scores by sector");
        let neutralized =
            self.neutralizer
                .neutralize_snapshot(inputs.as_of_date, &stock_scores, &inputs.universe);

        info!(candidates = neutralized.len(), "constructing portfolio");
        let portfolio = self
            .builder
            .build(neutralized.rows(), &inputs.benchmark, inputs.as_of_date)?;

        let evaluation = inputs.market.as_ref().map(|market| {
            info!(holdings = portfolio.len(), "evaluating portfolio");
            self.evaluate(&portfolio, market, &stock_scores, 0.0)
        });

        Ok(PipelineRun {
            stock_scores,
            neutralized,
            portfolio,
            evaluation,
        })
    }

    /// Evaluate one portfolio per minimum aggregate-score threshold.
    ///
    /// Scores below a threshold are removed before neutralization, so each
    /// threshold yields its own sector statistics and portfolio.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingMarketData`] when `inputs.market` is `None`,
    /// [`PipelineError::InvalidThreshold`] for a non-finite threshold.
    pub fn sweep(&self, inputs: &PipelineInputs, thresholds: &[f64]) -> Result<Vec<EvaluationResult>> {
        let market = inputs.market.as_ref().ok_or(PipelineError::MissingMarketData)?;
        if let Some(bad) = thresholds.iter().find(|t| !t.is_finite()) {
            return Err(PipelineError::InvalidThreshold(*bad));
        }

        let stock_scores = self.aggregator.aggregate(&inputs.scored_claims);
        info!(thresholds = thresholds.len(), scores = stock_scores.len(), "sweeping score thresholds");

        thresholds
            .iter()
            .map(|&threshold| {
                let filtered: HashMap<Ticker, StockScore> = stock_scores
                    .iter()
                    .filter(|(_, score)| score.aggregate_score() >= threshold)
                    .map(|(ticker, score)| (ticker.clone(), score.clone()))
                    .collect();
                let neutralized =
                    self.neutralizer
                        .neutralize_snapshot(inputs.as_of_date, &filtered, &inputs.universe);
                let portfolio =
                    self.builder
                        .build(neutralized.rows(), &inputs.benchmark, inputs.as_of_date)?;
                debug!(threshold, eligible = filtered.len(), holdings = portfolio.len(), "threshold portfolio");
                Ok(self.evaluate(&portfolio, market, &stock_scores, threshold))
            })
            .collect()
    }

    fn evaluate(
        &self,
        portfolio: &PortfolioResult,
        market: &MarketData,
        stock_scores: &HashMap<Ticker, StockScore>,
        threshold: f64,
    ) -> EvaluationResult {
        let returns = portfolio_returns(portfolio, &market.stock_returns);
        self.evaluator.evaluate(
            portfolio,
            &returns,
            &market.benchmark_returns,
            &market.analyst_scores,
            stock_scores,
            threshold,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_sections() {
        let config = PipelineConfig::from_json_str(r#"{"portfolio": {"target_size": 10}}"#).unwrap();
        assert_eq!(config.portfolio.target_size, 10);
        assert_eq!(config.neutralizer.min_samples, 5);
        assert_eq!(config.aggregator.cagr_boost_threshold, 0.7);
        assert_eq!(config.evaluator.min_correlation_sample, 30);
    }

    #[test]
    fn test_config_empty_object() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.portfolio.target_size, 30);
    }

    #[test]
    fn test_config_rejects_bad_json() {
        let err = PipelineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_config_missing_file() {
        let err = PipelineConfig::from_json_file("/nonexistent/moat.json").unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }

    #[test]
    fn test_sweep_requires_market_data() {
        let inputs = PipelineInputs {
            as_of_date: Date::from_ymd_opt(2024, 1, 31).unwrap(),
            scored_claims: HashMap::new(),
            universe: UniverseConfig::default(),
            benchmark: Vec::new(),
            market: None,
        };
        let err = Pipeline::default().sweep(&inputs, &[0.5]).unwrap_err();
        assert!(matches!(err, PipelineError::MissingMarketData));
    }
}
