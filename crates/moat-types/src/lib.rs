#![doc(issue_tracker_base_url = "https://github.com/factordynamics/moat/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Shared data contracts for the moat competitive-advantage strategy.
//!
//! Every stage of the pipeline (aggregation, sector neutralization, portfolio
//! construction, evaluation) exchanges the immutable value objects defined
//! here. Constructors validate their inputs, so malformed claims, confidences,
//! weights and tickers are rejected at the boundary rather than downstream.

/// The version of the moat-types crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod claim;
pub mod error;
pub mod evaluation;
pub mod portfolio;
pub mod score;
pub mod series;
pub mod stats;
pub mod ticker;
pub mod universe;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

pub use claim::{Adjustment, AppliedRule, Claim, ClaimType, RuleEvaluation, ScoredClaim, StructuralRule};
pub use error::{MoatError, Result};
pub use evaluation::{
    AnalystCorrelation, AnalystScore, EvaluationResult, PerformanceMetrics, TransparencyMetrics,
};
pub use portfolio::{
    BenchmarkWeight, PortfolioHolding, PortfolioResult, SectorAllocation, benchmark_total,
    normalize_benchmark,
};
pub use score::{DatedScore, RankedStock, StockScore};
pub use series::ReturnSeries;
pub use ticker::Ticker;
pub use universe::UniverseConfig;
