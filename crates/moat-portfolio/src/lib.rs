//! Portfolio construction for the moat strategy.
//!
//! Turns sector-ranked candidates and benchmark sector weights into a
//! concrete portfolio: slots are apportioned to sectors with
//! [`largest_remainder`], the best-scoring stocks fill each sector's slots,
//! and sector weight is shared in proportion to score.

mod apportion;
mod builder;

pub use apportion::largest_remainder;
pub use builder::{PortfolioBuilder, PortfolioConfig};
