//! Report output for the moat pipeline.
//!
//! [`OutputGenerator`] writes a portfolio, its scores and its evaluation into
//! a directory:
//!
//! ```text
//! portfolio.json        holdings, sector allocations, as-of date
//! portfolio.csv         one row per holding
//! stock_scores.json     aggregate scores, sorted by ticker
//! evaluation.json       only when an evaluation is supplied
//! summary.md            allocation, holdings and evaluation tables
//! rationale/<TICKER>.md claims behind each holding
//! ```

mod error;
mod generator;
mod markdown;

pub use error::{OutputError, Result};
pub use generator::{OutputBundle, OutputGenerator, OutputManifest, file_stem, holdings_frame};
pub use markdown::{render_rationale, render_summary};
