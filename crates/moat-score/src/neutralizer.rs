//! Sector-relative normalization of aggregate scores.

use std::collections::{BTreeMap, HashMap};

use moat_types::{
    Date, DatedScore, RankedStock, Result, StockScore, Ticker, UniverseConfig,
    stats::{Dispersion, robust_zscores},
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for sector neutralization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralizerConfig {
    /// Smallest `(date, sector)` group that receives real z-scores.
    pub min_samples: usize,
}

impl Default for NeutralizerConfig {
    fn default() -> Self {
        Self { min_samples: 5 }
    }
}

/// Output of [`SectorNeutralizer::neutralize`].
#[derive(Debug, Clone, Default)]
pub struct NeutralizedScores {
    rows: Vec<RankedStock>,
    excluded: Vec<Ticker>,
}

impl NeutralizedScores {
    /// Surviving rows, in input order.
    pub fn rows(&self) -> &[RankedStock] {
        &self.rows
    }

    /// Consume into the surviving rows.
    pub fn into_rows(self) -> Vec<RankedStock> {
        self.rows
    }

    /// Tickers dropped because the universe has no sector for them.
    pub fn excluded(&self) -> &[Ticker] {
        &self.excluded
    }

    /// Rows observed on `date`.
    pub fn for_date(&self, date: Date) -> Vec<RankedStock> {
        self.rows
            .iter()
            .filter(|row| row.as_of_date == date)
            .cloned()
            .collect()
    }

    /// Number of surviving rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows survived.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tabular view with one row per surviving ticker and date.
    ///
    /// The column set is the same for empty output.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let tickers: Vec<&str> = self.rows.iter().map(|r| r.ticker.as_str()).collect();
        let dates: Vec<Date> = self.rows.iter().map(|r| r.as_of_date).collect();
        let sectors: Vec<&str> = self.rows.iter().map(|r| r.gics_sector.as_str()).collect();
        let scores: Vec<f64> = self.rows.iter().map(|r| r.aggregate_score).collect();
        let zscores: Vec<f64> = self.rows.iter().map(|r| r.sector_zscore).collect();
        let ranks: Vec<u32> = self.rows.iter().map(|r| r.sector_rank).collect();
        let claim_counts: Vec<u64> = self.rows.iter().map(|r| r.claim_count as u64).collect();
        let structural: Vec<f64> = self.rows.iter().map(|r| r.structural_weight).collect();

        let df = df! {
            "ticker" => tickers,
            "as_of_date" => dates,
            "gics_sector" => sectors,
            "aggregate_score" => scores,
            "sector_zscore" => zscores,
            "sector_rank" => ranks,
            "claim_count" => claim_counts,
            "structural_weight" => structural,
        }?;
        Ok(df)
    }
}

/// Converts raw scores into sector-relative z-scores and ranks.
///
/// Rows are bucketed by `(as_of_date, gics_sector)`. Within a bucket the
/// z-score is the robust `(x - median) / (1.4826 * MAD)`; buckets smaller than
/// `min_samples` get NaN instead. Ranks order `aggregate_score` descending with
/// tied scores sharing the lowest rank (1, 2, 2, 4).
#[derive(Debug, Clone, Default)]
pub struct SectorNeutralizer {
    config: NeutralizerConfig,
}

impl SectorNeutralizer {
    /// Create a neutralizer with the given configuration.
    pub const fn new(config: NeutralizerConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &NeutralizerConfig {
        &self.config
    }

    /// Neutralize a single cross-section of scores.
    pub fn neutralize_snapshot(
        &self,
        as_of_date: Date,
        scores: &HashMap<Ticker, StockScore>,
        universe: &UniverseConfig,
    ) -> NeutralizedScores {
        let mut rows: Vec<DatedScore> = scores
            .values()
            .map(|score| DatedScore::new(as_of_date, score.clone()))
            .collect();
        rows.sort_by(|a, b| a.score.ticker().cmp(b.score.ticker()));
        self.neutralize(&rows, universe)
    }

    /// Neutralize dated scores against a universe.
    ///
    /// Tickers the universe does not classify are dropped and reported in
    /// [`NeutralizedScores::excluded`].
    pub fn neutralize(&self, scores: &[DatedScore], universe: &UniverseConfig) -> NeutralizedScores {
        let mut rows = Vec::with_capacity(scores.len());
        let mut excluded = Vec::new();

        for dated in scores {
            let ticker = dated.score.ticker();
            match universe.sector_of(ticker) {
                Some(sector) => rows.push(RankedStock {
                    ticker: ticker.clone(),
                    as_of_date: dated.as_of_date,
                    aggregate_score: dated.score.aggregate_score(),
                    gics_sector: sector.to_string(),
                    sector_zscore: f64::NAN,
                    sector_rank: 0,
                    claim_count: dated.score.claim_count(),
                    structural_weight: dated.score.structural_weight(),
                }),
                None => excluded.push(ticker.clone()),
            }
        }

        if !excluded.is_empty() {
            warn!(
                excluded = excluded.len(),
                "tickers missing from universe were dropped"
            );
        }

        // Bucket row indices by (date, sector), then scatter results back.
        let mut groups: BTreeMap<(Date, String), Vec<usize>> = BTreeMap::new();
        for (idx, row) in rows.iter().enumerate() {
            groups
                .entry((row.as_of_date, row.gics_sector.clone()))
                .or_default()
                .push(idx);
        }

        let mut zscores = vec![f64::NAN; rows.len()];
        let mut ranks = vec![0_u32; rows.len()];

        for ((date, sector), members) in &groups {
            let values: Vec<f64> = members.iter().map(|&i| rows[i].aggregate_score).collect();

            if members.len() >= self.config.min_samples {
                let (z, fit) = robust_zscores(&values);
                match fit.dispersion {
                    Dispersion::Mad => {}
                    Dispersion::StdDev => {
                        debug!(%date, sector = %sector, "MAD is zero; scaled by standard deviation");
                    }
                    Dispersion::Degenerate => {
                        warn!(%date, sector = %sector, "sector scores are identical; z-scores set to 0");
                    }
                }
                for (&i, z) in members.iter().zip(z) {
                    zscores[i] = z;
                }
            } else {
                debug!(
                    %date,
                    sector = %sector,
                    members = members.len(),
                    min_samples = self.config.min_samples,
                    "sector group below minimum sample size"
                );
            }

            for (&i, rank) in members.iter().zip(min_rank_descending(&values)) {
                ranks[i] = rank;
            }
        }

        for ((row, z), rank) in rows.iter_mut().zip(zscores).zip(ranks) {
            row.sector_zscore = z;
            row.sector_rank = rank;
        }

        debug!(
            rows = rows.len(),
            groups = groups.len(),
            "neutralized scores by sector"
        );

        NeutralizedScores { rows, excluded }
    }
}

/// Rank values descending; ties share the lowest rank of their run.
fn min_rank_descending(values: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut ranks = vec![0_u32; values.len()];
    let mut current = 0_u32;
    for (pos, &idx) in order.iter().enumerate() {
        if pos == 0 || values[idx] != values[order[pos - 1]] {
            current = pos as u32 + 1;
        }
        ranks[idx] = current;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date() -> Date {
        Date::from_ymd_opt(2024, 6, 28).unwrap()
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn dated(t: &str, score: f64) -> DatedScore {
        DatedScore::new(date(), StockScore::new(ticker(t), score, 3, 0.5).unwrap())
    }

    fn universe(entries: &[(&str, &str)]) -> UniverseConfig {
        entries
            .iter()
            .map(|(t, s)| (ticker(t), (*s).to_string()))
            .collect()
    }

    #[test]
    fn test_min_rank_ties() {
        assert_eq!(min_rank_descending(&[0.9, 0.8, 0.8, 0.7]), vec![1, 2, 2, 4]);
        assert_eq!(min_rank_descending(&[0.1, 0.5, 0.3]), vec![3, 1, 2]);
        assert!(min_rank_descending(&[]).is_empty());
    }

    #[test]
    fn test_min_sample_gate() {
        let neutralizer = SectorNeutralizer::default();
        let tech = ["A", "B", "C", "D", "E"];
        let health = ["F", "G", "H", "I"];
        let mut entries: Vec<(&str, &str)> = tech.iter().map(|t| (*t, "Tech")).collect();
        entries.extend(health.iter().map(|t| (*t, "Health")));
        let universe = universe(&entries);

        let scores: Vec<DatedScore> = tech
            .iter()
            .chain(health.iter())
            .enumerate()
            .map(|(i, t)| dated(t, 0.1 + 0.08 * i as f64))
            .collect();

        let result = neutralizer.neutralize(&scores, &universe);
        assert_eq!(result.len(), 9);
        for row in result.rows() {
            if row.gics_sector == "Tech" {
                assert!(row.sector_zscore.is_finite(), "{} should be scored", row.ticker);
            } else {
                assert!(row.sector_zscore.is_nan(), "{} should be gated", row.ticker);
            }
        }
    }

    #[test]
    fn test_zscores_and_ranks_within_sector() {
        let neutralizer = SectorNeutralizer::default();
        let universe = universe(&[("A", "Tech"), ("B", "Tech"), ("C", "Tech"), ("D", "Tech"), ("E", "Tech")]);
        let scores = vec![
            dated("A", 0.1),
            dated("B", 0.2),
            dated("C", 0.3),
            dated("D", 0.4),
            dated("E", 0.5),
        ];

        let result = neutralizer.neutralize(&scores, &universe);
        let rows = result.rows();
        assert_relative_eq!(rows[2].sector_zscore, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rows[4].sector_zscore, 0.2 / (1.4826 * 0.1), epsilon = 1e-9);
        assert_eq!(rows[4].sector_rank, 1);
        assert_eq!(rows[0].sector_rank, 5);
    }

    #[test]
    fn test_unmapped_tickers_excluded() {
        let neutralizer = SectorNeutralizer::default();
        let universe = universe(&[("A", "Tech")]);
        let scores = vec![dated("A", 0.5), dated("ZZZ", 0.9)];

        let result = neutralizer.neutralize(&scores, &universe);
        assert_eq!(result.len(), 1);
        assert_eq!(result.excluded(), &[ticker("ZZZ")]);
        assert_eq!(result.rows()[0].sector_rank, 1);
    }

    #[test]
    fn test_groups_split_by_date() {
        let neutralizer = SectorNeutralizer::new(NeutralizerConfig { min_samples: 1 });
        let universe = universe(&[("A", "Tech"), ("B", "Tech")]);
        let later = Date::from_ymd_opt(2024, 9, 30).unwrap();
        let scores = vec![
            dated("A", 0.4),
            dated("B", 0.6),
            DatedScore::new(later, StockScore::new(ticker("A"), 0.9, 1, 0.0).unwrap()),
        ];

        let result = neutralizer.neutralize(&scores, &universe);
        assert_eq!(result.rows()[0].sector_rank, 2);
        assert_eq!(result.rows()[1].sector_rank, 1);
        assert_eq!(result.rows()[2].sector_rank, 1);
        assert_eq!(result.for_date(later).len(), 1);
    }

    #[test]
    fn test_empty_input_keeps_columns() {
        let neutralizer = SectorNeutralizer::default();
        let result = neutralizer.neutralize(&[], &UniverseConfig::default());
        assert!(result.is_empty());

        let frame = result.to_frame().unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.width(), 8);
        assert!(frame.column("sector_zscore").is_ok());
        assert!(frame.column("sector_rank").is_ok());
    }

    #[test]
    fn test_snapshot() {
        let neutralizer = SectorNeutralizer::default();
        let universe = universe(&[("A", "Tech"), ("B", "Tech")]);
        let mut scores = HashMap::new();
        scores.insert(ticker("B"), StockScore::new(ticker("B"), 0.7, 2, 0.0).unwrap());
        scores.insert(ticker("A"), StockScore::new(ticker("A"), 0.3, 2, 0.0).unwrap());

        let result = neutralizer.neutralize_snapshot(date(), &scores, &universe);
        assert_eq!(result.rows()[0].ticker, ticker("A"));
        assert_eq!(result.rows()[0].sector_rank, 2);
        assert!(result.rows()[0].sector_zscore.is_nan());
    }
}
