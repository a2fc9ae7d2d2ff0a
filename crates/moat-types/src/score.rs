//! Per-ticker aggregate scores and their sector-ranked form.

use serde::{Deserialize, Serialize};

use crate::{Date, MoatError, Result, Ticker, error::ensure_unit};

/// Aggregate competitive-advantage score for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StockScoreRecord")]
pub struct StockScore {
    ticker: Ticker,
    aggregate_score: f64,
    claim_count: usize,
    structural_weight: f64,
}

#[derive(Deserialize)]
struct StockScoreRecord {
    ticker: Ticker,
    aggregate_score: f64,
    claim_count: usize,
    structural_weight: f64,
}

impl TryFrom<StockScoreRecord> for StockScore {
    type Error = MoatError;

    fn try_from(r: StockScoreRecord) -> Result<Self> {
        Self::new(r.ticker, r.aggregate_score, r.claim_count, r.structural_weight)
    }
}

impl StockScore {
    /// Create a score; `aggregate_score` and `structural_weight` must lie in `[0, 1]`.
    pub fn new(
        ticker: Ticker,
        aggregate_score: f64,
        claim_count: usize,
        structural_weight: f64,
    ) -> Result<Self> {
        Ok(Self {
            ticker,
            aggregate_score: ensure_unit("aggregate_score", aggregate_score)?,
            claim_count,
            structural_weight: ensure_unit("structural_weight", structural_weight)?,
        })
    }

    /// The scored ticker.
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Weighted mean confidence, clamped to `[0, 1]`.
    pub const fn aggregate_score(&self) -> f64 {
        self.aggregate_score
    }

    /// Number of claims that contributed.
    pub const fn claim_count(&self) -> usize {
        self.claim_count
    }

    /// Fraction of total weight coming from structural rules.
    pub const fn structural_weight(&self) -> f64 {
        self.structural_weight
    }
}

/// A [`StockScore`] observed on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedScore {
    /// Observation date.
    pub as_of_date: Date,
    /// The score.
    pub score: StockScore,
}

impl DatedScore {
    /// Pair a score with its date.
    pub const fn new(as_of_date: Date, score: StockScore) -> Self {
        Self { as_of_date, score }
    }
}

/// A score placed within its sector for one date.
///
/// Produced by sector neutralization and consumed by portfolio construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStock {
    /// Ticker.
    pub ticker: Ticker,
    /// Date of the cross-section.
    pub as_of_date: Date,
    /// Raw aggregate score.
    pub aggregate_score: f64,
    /// GICS sector from the universe mapping.
    pub gics_sector: String,
    /// Robust z-score within the sector, NaN when the group is too small.
    pub sector_zscore: f64,
    /// Rank within the sector, 1 being the highest score.
    pub sector_rank: u32,
    /// Number of contributing claims.
    pub claim_count: usize,
    /// Structural share of the aggregation weight.
    pub structural_weight: f64,
}
