//! Benchmark-relative portfolio construction.

use std::collections::{BTreeMap, HashSet};

use moat_types::{
    BenchmarkWeight, Date, PortfolioHolding, PortfolioResult, RankedStock, Result, SectorAllocation,
    benchmark_total,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::apportion::largest_remainder;

/// Tolerance before a benchmark total away from 1.0 is reported.
const BENCHMARK_SUM_TOLERANCE: f64 = 0.01;

/// Configuration for portfolio construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Number of holdings to aim for.
    pub target_size: usize,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self { target_size: 30 }
    }
}

/// One sector's share of the construction.
#[derive(Debug)]
struct SectorSlot<'a> {
    sector: &'a str,
    benchmark_weight: f64,
    candidates: Vec<&'a RankedStock>,
}

/// Builds a fixed-size, fully weighted portfolio from sector-ranked stocks.
///
/// Slots are apportioned across benchmark sectors with the largest-remainder
/// method, every sector with candidates keeps at least one slot, and each
/// sector's benchmark weight is split among its picks in proportion to score.
/// Final weights are rescaled to sum to 1.
#[derive(Debug, Clone, Default)]
pub struct PortfolioBuilder {
    config: PortfolioConfig,
}

impl PortfolioBuilder {
    /// Create a builder with the given configuration.
    pub const fn new(config: PortfolioConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Construct the portfolio.
    ///
    /// `ranked` should hold one cross-section; sectors absent from `benchmark`
    /// are never selected and benchmark sectors without candidates are left
    /// out. Empty input yields an empty portfolio.
    ///
    /// # Errors
    ///
    /// Only propagates value-object validation failures, which the weighting
    /// scheme keeps out of reach for valid inputs.
    pub fn build(
        &self,
        ranked: &[RankedStock],
        benchmark: &[BenchmarkWeight],
        as_of_date: Date,
    ) -> Result<PortfolioResult> {
        if ranked.is_empty() || self.config.target_size == 0 {
            return Ok(PortfolioResult::empty(as_of_date));
        }

        let total = benchmark_total(benchmark);
        if (total - 1.0).abs() > BENCHMARK_SUM_TOLERANCE {
            warn!(total, "benchmark sector weights do not sum to 1.0");
        }

        let slots = self.sector_slots(ranked, benchmark);
        if slots.is_empty() {
            debug!("no benchmark sector has candidates");
            return Ok(PortfolioResult::empty(as_of_date));
        }

        let quotas: Vec<f64> = slots
            .iter()
            .map(|s| self.config.target_size as f64 * s.benchmark_weight)
            .collect();
        let counts = largest_remainder(&quotas, self.config.target_size);

        let mut picks: Vec<(&RankedStock, f64)> = Vec::new();
        for (slot, count) in slots.iter().zip(counts) {
            let count = count.clamp(1, slot.candidates.len());
            let selected = &slot.candidates[..count];
            let score_sum: f64 = selected.iter().map(|s| s.aggregate_score).sum();

            if score_sum > 0.0 {
                picks.extend(
                    selected
                        .iter()
                        .map(|s| (*s, s.aggregate_score / score_sum * slot.benchmark_weight)),
                );
            } else {
                debug!(sector = slot.sector, "zero total score; splitting sector weight equally");
                let equal = slot.benchmark_weight / count as f64;
                picks.extend(selected.iter().map(|s| (*s, equal)));
            }
        }

        let grand_total: f64 = picks.iter().map(|(_, w)| w).sum();
        let n = picks.len() as f64;
        let holdings = picks
            .into_iter()
            .map(|(stock, raw)| {
                let weight = if grand_total > 0.0 { raw / grand_total } else { 1.0 / n };
                PortfolioHolding::new(
                    stock.ticker.clone(),
                    weight.clamp(0.0, 1.0),
                    stock.gics_sector.clone(),
                    stock.aggregate_score,
                    format!(
                        "Sector rank {}, score {:.2}",
                        stock.sector_rank, stock.aggregate_score
                    ),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let allocations = sector_allocations(&holdings, &slots);

        debug!(
            holdings = holdings.len(),
            sectors = allocations.len(),
            target_size = self.config.target_size,
            "built portfolio"
        );

        Ok(PortfolioResult::new(holdings, allocations, as_of_date))
    }

    /// Benchmark sectors that have candidates, heaviest first, with candidates
    /// sorted best first.
    fn sector_slots<'a>(
        &self,
        ranked: &'a [RankedStock],
        benchmark: &'a [BenchmarkWeight],
    ) -> Vec<SectorSlot<'a>> {
        let mut by_sector: BTreeMap<&str, Vec<&RankedStock>> = BTreeMap::new();
        for stock in ranked {
            by_sector.entry(stock.gics_sector.as_str()).or_default().push(stock);
        }

        let mut seen = HashSet::new();
        let mut slots: Vec<SectorSlot<'a>> = benchmark
            .iter()
            .filter(|b| seen.insert(b.sector()))
            .filter_map(|b| {
                let mut candidates = by_sector.get(b.sector())?.clone();
                candidates.sort_by(|x, y| {
                    y.aggregate_score
                        .total_cmp(&x.aggregate_score)
                        .then_with(|| x.ticker.cmp(&y.ticker))
                });
                Some(SectorSlot {
                    sector: b.sector(),
                    benchmark_weight: b.weight(),
                    candidates,
                })
            })
            .collect();

        let ignored = by_sector
            .keys()
            .filter(|sector| !seen.contains(*sector))
            .count();
        if ignored > 0 {
            debug!(ignored, "candidate sectors missing from benchmark were ignored");
        }

        slots.sort_by(|a, b| {
            b.benchmark_weight
                .total_cmp(&a.benchmark_weight)
                .then_with(|| a.sector.cmp(b.sector))
        });
        slots
    }
}

/// Allocation per sector, computed from the final holdings.
fn sector_allocations(holdings: &[PortfolioHolding], slots: &[SectorSlot<'_>]) -> Vec<SectorAllocation> {
    slots
        .iter()
        .filter_map(|slot| {
            let members: Vec<&PortfolioHolding> =
                holdings.iter().filter(|h| h.sector() == slot.sector).collect();
            if members.is_empty() {
                return None;
            }
            Some(SectorAllocation {
                sector: slot.sector.to_string(),
                benchmark_weight: slot.benchmark_weight,
                actual_weight: members.iter().map(|h| h.weight()).sum(),
                stock_count: members.len(),
            })
        })
        .collect()
}
