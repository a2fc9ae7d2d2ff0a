//! Portfolio construction inputs and outputs.

use serde::{Deserialize, Serialize};

use crate::{Date, MoatError, Result, Ticker, error::ensure_unit};

/// Target weight of one sector in the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BenchmarkWeightRecord")]
pub struct BenchmarkWeight {
    sector: String,
    weight: f64,
}

#[derive(Deserialize)]
struct BenchmarkWeightRecord {
    sector: String,
    weight: f64,
}

impl TryFrom<BenchmarkWeightRecord> for BenchmarkWeight {
    type Error = MoatError;

    fn try_from(r: BenchmarkWeightRecord) -> Result<Self> {
        Self::new(r.sector, r.weight)
    }
}

impl BenchmarkWeight {
    /// Create a sector weight; `weight` must lie in `[0, 1]`.
    pub fn new(sector: impl Into<String>, weight: f64) -> Result<Self> {
        let sector = sector.into();
        if sector.trim().is_empty() {
            return Err(MoatError::EmptyField("sector"));
        }
        Ok(Self {
            sector,
            weight: ensure_unit("benchmark weight", weight)?,
        })
    }

    /// Sector name.
    pub fn sector(&self) -> &str {
        &self.sector
    }

    /// Benchmark weight.
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

/// Sum of benchmark weights.
pub fn benchmark_total(weights: &[BenchmarkWeight]) -> f64 {
    weights.iter().map(BenchmarkWeight::weight).sum()
}

/// Rescale benchmark weights to sum to 1.0.
///
/// Returns the input unchanged when the total is zero.
pub fn normalize_benchmark(weights: &[BenchmarkWeight]) -> Vec<BenchmarkWeight> {
    let total = benchmark_total(weights);
    if total <= 0.0 {
        return weights.to_vec();
    }
    weights
        .iter()
        .map(|w| BenchmarkWeight {
            sector: w.sector.clone(),
            weight: w.weight / total,
        })
        .collect()
}

/// A single position in a constructed portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioHolding {
    ticker: Ticker,
    weight: f64,
    sector: String,
    score: f64,
    rationale_summary: String,
}

impl PortfolioHolding {
    /// Create a holding; `weight` must lie in `[0, 1]`.
    pub fn new(
        ticker: Ticker,
        weight: f64,
        sector: impl Into<String>,
        score: f64,
        rationale_summary: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            ticker,
            weight: ensure_unit("holding weight", weight)?,
            sector: sector.into(),
            score,
            rationale_summary: rationale_summary.into(),
        })
    }

    /// Held ticker.
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Portfolio weight.
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Sector the holding was selected in.
    pub fn sector(&self) -> &str {
        &self.sector
    }

    /// Aggregate score at selection time.
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Short generated rationale, e.g. `"Sector rank 3, score 0.82"`.
    pub fn rationale_summary(&self) -> &str {
        &self.rationale_summary
    }
}

/// Realized allocation to one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorAllocation {
    /// Sector name.
    pub sector: String,
    /// Benchmark weight of the sector.
    pub benchmark_weight: f64,
    /// Sum of holding weights in the sector.
    pub actual_weight: f64,
    /// Number of holdings in the sector.
    pub stock_count: usize,
}

/// A constructed portfolio for one as-of date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    holdings: Vec<PortfolioHolding>,
    sector_allocations: Vec<SectorAllocation>,
    as_of_date: Date,
}

impl PortfolioResult {
    /// Assemble a portfolio result.
    pub const fn new(
        holdings: Vec<PortfolioHolding>,
        sector_allocations: Vec<SectorAllocation>,
        as_of_date: Date,
    ) -> Self {
        Self {
            holdings,
            sector_allocations,
            as_of_date,
        }
    }

    /// A portfolio with no holdings.
    pub const fn empty(as_of_date: Date) -> Self {
        Self::new(Vec::new(), Vec::new(), as_of_date)
    }

    /// Holdings in construction order.
    pub fn holdings(&self) -> &[PortfolioHolding] {
        &self.holdings
    }

    /// Per-sector allocations.
    pub fn sector_allocations(&self) -> &[SectorAllocation] {
        &self.sector_allocations
    }

    /// Construction date.
    pub const fn as_of_date(&self) -> Date {
        self.as_of_date
    }

    /// Sum of holding weights.
    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(PortfolioHolding::weight).sum()
    }

    /// Number of holdings.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Whether the portfolio holds nothing.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}
