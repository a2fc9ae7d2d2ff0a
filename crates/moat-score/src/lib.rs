//! Claim aggregation and sector-neutral scoring.
//!
//! Two stages of the moat pipeline live here:
//!
//! 1. [`ScoreAggregator`] reduces each ticker's scored claims to a single
//!    [`StockScore`](moat_types::StockScore), weighting structurally
//!    corroborated claims more heavily.
//! 2. [`SectorNeutralizer`] places those scores within their GICS sector using
//!    robust z-scores and ranks, so sectors with different score
//!    distributions become comparable.

mod aggregator;
mod neutralizer;

pub use aggregator::{AggregatorConfig, BASE_CLAIM_WEIGHT, ScoreAggregator};
pub use neutralizer::{NeutralizedScores, NeutralizerConfig, SectorNeutralizer};
