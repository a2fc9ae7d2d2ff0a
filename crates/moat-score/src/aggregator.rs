//! Collapse scored claims into one score per ticker.

use std::collections::HashMap;

use moat_types::{ClaimType, Result, ScoredClaim, StockScore, Ticker};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Weight of a claim that no structural rule applies to.
pub const BASE_CLAIM_WEIGHT: f64 = 1.0;

/// Configuration for claim aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Confidence at or above which a CAGR-connection claim is boosted.
    pub cagr_boost_threshold: f64,
    /// Relative boost (or penalty below the threshold) for CAGR-connection claims.
    pub cagr_adjustment: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cagr_boost_threshold: 0.7,
            cagr_adjustment: 0.10,
        }
    }
}

/// Reduces per-claim confidences into a per-ticker [`StockScore`].
///
/// Each claim's confidence is first adjusted (CAGR-connection claims only),
/// then weighted by its structural rules:
///
/// | applied rules        | weight |
/// |----------------------|--------|
/// | none of 6 / 11       | 1.0    |
/// | `rule_6`             | 1.5    |
/// | `rule_11`            | 2.0    |
/// | `rule_6` + `rule_11` | 2.0    |
///
/// The aggregate is the weighted mean, clamped to `[0, 1]`.
///
/// # Examples
///
/// ```
/// use moat_score::ScoreAggregator;
/// use moat_types::{Claim, ClaimType, RuleEvaluation, ScoredClaim, Ticker};
///
/// let claim = Claim::new("Dominant installed base", "", ClaimType::CompetitiveAdvantage).unwrap();
/// let scored = ScoredClaim::new(claim, 0.8, RuleEvaluation::from_tags(["rule_11"]).unwrap()).unwrap();
///
/// let aggregator = ScoreAggregator::default();
/// let score = aggregator
///     .aggregate_ticker(&Ticker::new("ASML").unwrap(), &[scored])
///     .unwrap();
/// assert!((score.aggregate_score() - 0.8).abs() < 1e-12);
/// assert_eq!(score.structural_weight(), 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    config: AggregatorConfig,
}

impl ScoreAggregator {
    /// Create an aggregator with the given configuration.
    pub const fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate every ticker that has at least one claim.
    ///
    /// Tickers with an empty claim list are left out of the result.
    pub fn aggregate(&self, claims: &HashMap<Ticker, Vec<ScoredClaim>>) -> HashMap<Ticker, StockScore> {
        let scores: HashMap<Ticker, StockScore> = claims
            .iter()
            .filter_map(|(ticker, list)| Some((ticker.clone(), self.aggregate_ticker(ticker, list)?)))
            .collect();

        debug!(
            tickers_in = claims.len(),
            tickers_scored = scores.len(),
            "aggregated claim scores"
        );
        scores
    }

    /// Aggregate one ticker's claims, `None` when the list is empty.
    pub fn aggregate_ticker(&self, ticker: &Ticker, claims: &[ScoredClaim]) -> Option<StockScore> {
        if claims.is_empty() {
            return None;
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        let mut structural_total = 0.0;

        for claim in claims {
            let weight = self.claim_weight(claim);
            weighted_sum += self.adjusted_confidence(claim) * weight;
            total_weight += weight;
            if claim.rule_evaluation().is_structural() {
                structural_total += weight;
            }
        }

        let (aggregate_score, structural_weight) = if total_weight > 0.0 {
            (
                (weighted_sum / total_weight).clamp(0.0, 1.0),
                (structural_total / total_weight).clamp(0.0, 1.0),
            )
        } else {
            (0.0, 0.0)
        };

        self.build_score(ticker, aggregate_score, claims.len(), structural_weight)
            .ok()
    }

    /// Aggregation weight of a claim: the largest structural weight, or the base weight.
    pub fn claim_weight(&self, claim: &ScoredClaim) -> f64 {
        claim
            .rule_evaluation()
            .structural_weight()
            .map_or(BASE_CLAIM_WEIGHT, |w| w.max(BASE_CLAIM_WEIGHT))
    }

    /// Confidence after the CAGR-connection boost or penalty.
    ///
    /// The threshold is inclusive on the boost side.
    pub fn adjusted_confidence(&self, claim: &ScoredClaim) -> f64 {
        let confidence = claim.final_confidence();
        if claim.claim_type() != ClaimType::CagrConnection {
            return confidence;
        }
        if confidence >= self.config.cagr_boost_threshold {
            confidence * (1.0 + self.config.cagr_adjustment)
        } else {
            confidence * (1.0 - self.config.cagr_adjustment)
        }
    }

    fn build_score(
        &self,
        ticker: &Ticker,
        aggregate_score: f64,
        claim_count: usize,
        structural_weight: f64,
    ) -> Result<StockScore> {
        StockScore::new(ticker.clone(), aggregate_score, claim_count, structural_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use moat_types::{Claim, RuleEvaluation};
    use rstest::rstest;

    fn scored(confidence: f64, claim_type: ClaimType, rules: &[&str]) -> ScoredClaim {
        let claim = Claim::new("claim text", "evidence", claim_type).unwrap();
        ScoredClaim::new(claim, confidence, RuleEvaluation::from_tags(rules).unwrap()).unwrap()
    }

    fn ca(confidence: f64, rules: &[&str]) -> ScoredClaim {
        scored(confidence, ClaimType::CompetitiveAdvantage, rules)
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    #[rstest]
    #[case(&[], 1.0)]
    #[case(&["rule_2"], 1.0)]
    #[case(&["rule_6"], 1.5)]
    #[case(&["rule_11"], 2.0)]
    #[case(&["rule_6", "rule_11"], 2.0)]
    fn test_claim_weight(#[case] rules: &[&str], #[case] expected: f64) {
        let aggregator = ScoreAggregator::default();
        assert_eq!(aggregator.claim_weight(&ca(0.5, rules)), expected);
    }

    #[test]
    fn test_weighted_mean() {
        let aggregator = ScoreAggregator::default();
        let claims = vec![ca(0.9, &["rule_11"]), ca(0.3, &[])];
        let score = aggregator.aggregate_ticker(&ticker("MSFT"), &claims).unwrap();

        // (0.9 * 2 + 0.3 * 1) / 3
        assert_relative_eq!(score.aggregate_score(), 0.7, epsilon = 1e-12);
        assert_relative_eq!(score.structural_weight(), 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(score.claim_count(), 2);
    }

    #[test]
    fn test_cagr_boost_inclusive_at_threshold() {
        let aggregator = ScoreAggregator::default();
        let at = scored(0.7, ClaimType::CagrConnection, &[]);
        assert_relative_eq!(aggregator.adjusted_confidence(&at), 0.77, epsilon = 1e-12);

        let below = scored(0.69, ClaimType::CagrConnection, &[]);
        assert_relative_eq!(aggregator.adjusted_confidence(&below), 0.621, epsilon = 1e-12);

        let other = scored(0.69, ClaimType::FactualClaim, &[]);
        assert_eq!(aggregator.adjusted_confidence(&other), 0.69);
    }

    #[test]
    fn test_cagr_configurable() {
        let aggregator = ScoreAggregator::new(AggregatorConfig {
            cagr_boost_threshold: 0.5,
            cagr_adjustment: 0.2,
        });
        let claim = scored(0.5, ClaimType::CagrConnection, &[]);
        assert_relative_eq!(aggregator.adjusted_confidence(&claim), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_aggregate_clamped_to_unit() {
        let aggregator = ScoreAggregator::default();
        let claims = vec![scored(1.0, ClaimType::CagrConnection, &["rule_11"])];
        let score = aggregator.aggregate_ticker(&ticker("NVDA"), &claims).unwrap();
        assert_eq!(score.aggregate_score(), 1.0);
    }

    #[test]
    fn test_heavier_rule_pulls_toward_claim() {
        let aggregator = ScoreAggregator::default();
        let base = vec![ca(0.9, &[]), ca(0.2, &[]), ca(0.4, &[])];
        let boosted = vec![ca(0.9, &["rule_11"]), ca(0.2, &[]), ca(0.4, &[])];

        let before = aggregator.aggregate_ticker(&ticker("A"), &base).unwrap();
        let after = aggregator.aggregate_ticker(&ticker("A"), &boosted).unwrap();
        assert!(after.aggregate_score() >= before.aggregate_score());

        let low_base = vec![ca(0.1, &[]), ca(0.6, &[])];
        let low_boosted = vec![ca(0.1, &["rule_11"]), ca(0.6, &[])];
        let before = aggregator.aggregate_ticker(&ticker("B"), &low_base).unwrap();
        let after = aggregator.aggregate_ticker(&ticker("B"), &low_boosted).unwrap();
        assert!(after.aggregate_score() <= before.aggregate_score());
    }

    #[test]
    fn test_aggregate_skips_empty_tickers() {
        let aggregator = ScoreAggregator::default();
        let mut claims = HashMap::new();
        claims.insert(ticker("AAPL"), vec![ca(0.6, &["rule_6"])]);
        claims.insert(ticker("XOM"), Vec::new());

        let scores = aggregator.aggregate(&claims);
        assert_eq!(scores.len(), 1);
        assert!(scores.contains_key("AAPL"));
        assert!(!scores.contains_key("XOM"));
    }

    #[test]
    fn test_aggregate_bounds_over_mixed_claims() {
        let aggregator = ScoreAggregator::default();
        let confidences = [0.0, 0.1, 0.35, 0.7, 0.95, 1.0];
        for (i, &c) in confidences.iter().enumerate() {
            let claims: Vec<ScoredClaim> = confidences
                .iter()
                .take(i + 1)
                .map(|&x| scored(x, ClaimType::CagrConnection, &["rule_6"]))
                .chain(std::iter::once(ca(c, &[])))
                .collect();
            let score = aggregator.aggregate_ticker(&ticker("T"), &claims).unwrap();
            assert!((0.0..=1.0).contains(&score.aggregate_score()));
        }
    }
}
