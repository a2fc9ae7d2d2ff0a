#![doc(issue_tracker_base_url = "https://github.com/factordynamics/moat/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # moat
//!
//! Competitive-advantage equity strategy.
//!
//! moat is an umbrella crate that re-exports all moat sub-crates and adds the
//! [`Pipeline`] that chains them. Claims extracted from earnings-call
//! transcripts, already scored for confidence, go in; a sector-neutral
//! long-only portfolio and its evaluation come out.
//!
//! ## Quick Start
//!
//! ```ignore
//! use moat::{Pipeline, PipelineConfig, PipelineInputs};
//! use moat::output::OutputGenerator;
//!
//! # fn main() -> moat::Result<()> {
//! let config = PipelineConfig::from_json_file("moat.json")?;
//! let pipeline = Pipeline::new(config);
//!
//! let run = pipeline.run(&inputs)?;
//! OutputGenerator::new("reports/2024-09-30").write(&run.bundle(&inputs))?;
//!
//! // Sensitivity of the evaluation to the score filter
//! let sweep = pipeline.sweep(&inputs, &[0.0, 0.4, 0.5, 0.6])?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`types`] - Shared value objects (claims, scores, portfolios, evaluations)
//! - [`score`] - Claim aggregation and sector neutralization
//! - [`portfolio`] - Benchmark-relative portfolio construction
//! - [`eval`] - Performance, analyst-agreement and transparency evaluation
//! - [`output`] - JSON, CSV and Markdown reports
//!
//! ## Architecture
//!
//! 1. **ScoreAggregator** reduces each ticker's claims to one score, weighting
//!    structurally corroborated claims more heavily
//! 2. **SectorNeutralizer** turns scores into within-sector z-scores and ranks
//! 3. **PortfolioBuilder** allocates holdings to sectors in proportion to the
//!    benchmark and weights them by score
//! 4. **StrategyEvaluator** measures the result against returns and analysts

/// Version information for the moat crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod error;
mod pipeline;

pub use error::{PipelineError, Result};
pub use pipeline::{MarketData, Pipeline, PipelineConfig, PipelineInputs, PipelineRun};

/// Shared value objects.
///
/// Every constructor validates its input, so a value that exists is valid.
pub mod types {
    pub use moat_types::*;
}

// Re-export the most used types at top level
pub use moat_types::{
    BenchmarkWeight, Date, EvaluationResult, MoatError, PortfolioResult, ScoredClaim, StockScore,
    Ticker, UniverseConfig,
};

/// Claim aggregation and sector neutralization.
///
/// ## Aggregation
///
/// ```text
/// score = clamp(sum(adjusted_i * w_i) / sum(w_i), 0, 1)
/// ```
///
/// `w_i` is 1.0, raised to 1.5 by rule 6 and 2.0 by rule 11 (the larger wins).
/// CAGR-connection claims are scaled up 10% at confidence 0.7 or above and
/// down 10% below it.
///
/// ## Neutralization
///
/// ```text
/// z = (x - median) / (1.4826 * MAD)
/// ```
///
/// computed per `(date, sector)`; sectors with fewer than `min_samples`
/// members get NaN.
pub mod score {
    pub use moat_score::*;
}

/// Portfolio construction.
///
/// Sector seat counts follow the benchmark via the largest-remainder method;
/// weights within a sector are proportional to score.
pub mod portfolio {
    pub use moat_portfolio::*;
}

/// Strategy evaluation.
pub mod eval {
    pub use moat_eval::*;
}

/// Report output.
pub mod output {
    pub use moat_output::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
