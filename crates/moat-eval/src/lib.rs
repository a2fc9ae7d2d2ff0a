//! Strategy evaluation for moat portfolios.
//!
//! This crate scores a constructed portfolio along three axes:
//! - Performance: Sharpe ratio, max drawdown, beta, information ratio and
//!   cumulative return of the realized returns against a benchmark
//! - Analyst agreement: Spearman rank correlation and top-quintile hit rate
//!   against external analyst scores
//! - Transparency: how many claims and how much structural support back the
//!   holdings
//!
//! # Example
//!
//! ```rust,ignore
//! use moat_eval::{EvaluatorConfig, StrategyEvaluator};
//!
//! let evaluator = StrategyEvaluator::new(EvaluatorConfig::default());
//! let result = evaluator.evaluate(
//!     &portfolio,
//!     &portfolio_returns,
//!     &benchmark_returns,
//!     &analyst_scores,
//!     &stock_scores,
//!     0.5,
//! );
//! ```

pub mod correlation;
pub mod evaluator;
pub mod returns;
pub mod risk;

pub use correlation::{SpearmanTest, spearman_test};
pub use evaluator::{EvaluatorConfig, StrategyEvaluator};
pub use returns::portfolio_returns;
pub use risk::{RiskCalculator, beta, cumulative_return, max_drawdown};
