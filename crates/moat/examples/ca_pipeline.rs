//! Competitive-advantage strategy on a synthetic universe.
//!
//! This example demonstrates:
//! - Building scored claims, a sector universe and benchmark weights
//! - Running aggregation, sector neutralization and portfolio construction
//! - Evaluating against synthetic returns and analyst scores
//! - Sweeping the minimum score threshold
//! - Writing JSON, CSV and Markdown reports
//!
//! Run with: `cargo run -p moat --example ca_pipeline [output_dir]`
//!
//! Set `RUST_LOG=debug` to see per-stage logging.

use std::collections::HashMap;

use chrono::Duration;
use moat::{
    BenchmarkWeight, Date, MarketData, Pipeline, PipelineConfig, PipelineInputs, ScoredClaim,
    Ticker, UniverseConfig,
    output::OutputGenerator,
    types::{Adjustment, AnalystScore, Claim, ClaimType, ReturnSeries, RuleEvaluation},
};
use tracing_subscriber::EnvFilter;

/// Stock universe by sector.
const SECTORS: &[(&str, f64, &[&str])] = &[
    ("Information Technology", 0.30, &["AAPL", "MSFT", "NVDA", "ADBE", "CRM", "ORCL", "INTC"]),
    ("Health Care", 0.25, &["JNJ", "UNH", "LLY", "PFE", "MRK", "ABT"]),
    ("Financials", 0.25, &["JPM", "V", "MA", "GS", "BLK", "SCHW"]),
    ("Consumer Staples", 0.20, &["PG", "KO", "PEP", "COST", "WMT"]),
];

/// Score thresholds to sweep.
const THRESHOLDS: &[f64] = &[0.0, 0.3, 0.4, 0.5, 0.6];

/// Trading days of synthetic returns.
const DAYS: usize = 126;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let inputs = build_inputs()?;
    let config = PipelineConfig::from_json_str(r#"{"portfolio": {"target_size": 12}}"#)?;
    let pipeline = Pipeline::new(config);

    let run = pipeline.run(&inputs)?;

    println!("\n{:=<72}", "");
    println!("PORTFOLIO ({})", inputs.as_of_date);
    println!("{:=<72}", "");
    println!("{:<8} {:<24} {:>8} {:>8}", "Ticker", "Sector", "Weight", "Score");
    println!("{:-<72}", "");
    for h in run.portfolio.holdings() {
        println!(
            "{:<8} {:<24} {:>7.2}% {:>8.3}",
            h.ticker(),
            h.sector(),
            h.weight() * 100.0,
            h.score()
        );
    }

    println!("\n{:<24} {:>10} {:>10} {:>7}", "Sector", "Benchmark", "Actual", "Stocks");
    println!("{:-<72}", "");
    for a in run.portfolio.sector_allocations() {
        println!(
            "{:<24} {:>9.2}% {:>9.2}% {:>7}",
            a.sector,
            a.benchmark_weight * 100.0,
            a.actual_weight * 100.0,
            a.stock_count
        );
    }

    println!("\n{:=<72}", "");
    println!("THRESHOLD SWEEP");
    println!("{:=<72}", "");
    println!(
        "{:>9} {:>6} {:>8} {:>8} {:>8} {:>9} {:>9}",
        "Threshold", "Size", "Sharpe", "MaxDD", "Beta", "Spearman", "Coverage"
    );
    println!("{:-<72}", "");
    for eval in pipeline.sweep(&inputs, THRESHOLDS)? {
        let spearman = eval
            .analyst_correlation
            .spearman_correlation
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.3}"));
        println!(
            "{:>9.2} {:>6} {:>8.3} {:>7.2}% {:>8.3} {:>9} {:>8.1}%",
            eval.threshold,
            eval.portfolio_size,
            eval.performance.sharpe_ratio,
            eval.performance.max_drawdown * 100.0,
            eval.performance.beta,
            spearman,
            eval.transparency.coverage_rate * 100.0
        );
    }

    let out_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "target/moat-report".to_string());
    let manifest = OutputGenerator::new(&out_dir).write(&run.bundle(&inputs))?;
    println!("\nWrote {} files to {}", manifest.files.len(), out_dir);

    Ok(())
}

/// Deterministic value in `[0, 1)` for index `i`.
fn noise(i: usize) -> f64 {
    let x = ((i as f64 + 1.0) * 12.9898).sin() * 43_758.545_3;
    x - x.floor()
}

fn build_inputs() -> anyhow::Result<PipelineInputs> {
    let as_of_date = Date::from_ymd_opt(2024, 9, 30).ok_or_else(|| anyhow::anyhow!("bad date"))?;

    let mut universe = Vec::new();
    let mut scored_claims: HashMap<Ticker, Vec<ScoredClaim>> = HashMap::new();
    let mut stock_returns = HashMap::new();
    let mut analyst_scores = HashMap::new();
    let dates: Vec<Date> = (0..DAYS as i64)
        .map(|d| as_of_date - Duration::days(DAYS as i64 - 1 - d))
        .collect();

    let mut idx = 0;
    for (sector, _, tickers) in SECTORS {
        for symbol in *tickers {
            idx += 1;
            let ticker = Ticker::new(*symbol)?;
            universe.push((ticker.clone(), (*sector).to_string()));

            let quality = noise(idx);
            let claims = build_claims(symbol, quality, idx)?;
            scored_claims.insert(ticker.clone(), claims);

            let analyst = (quality + 0.3 * noise(idx + 500)).min(1.0);
            analyst_scores.insert(
                ticker.clone(),
                AnalystScore::new([("source_a", analyst), ("source_b", (analyst - 0.1).max(0.0))]),
            );

            let drift = 0.0004 * (quality - 0.4);
            let series = dates
                .iter()
                .enumerate()
                .map(|(d, date)| (*date, drift + 0.02 * (noise(idx * 1_000 + d) - 0.5)));
            stock_returns.insert(ticker, ReturnSeries::new(series));
        }
    }

    let benchmark_returns = ReturnSeries::new(
        dates
            .iter()
            .enumerate()
            .map(|(d, date)| (*date, 0.0002 + 0.015 * (noise(90_000 + d) - 0.5))),
    );

    let benchmark = SECTORS
        .iter()
        .map(|(sector, weight, _)| BenchmarkWeight::new(*sector, *weight))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PipelineInputs {
        as_of_date,
        scored_claims,
        universe: universe.into_iter().collect::<UniverseConfig>(),
        benchmark,
        market: Some(MarketData {
            stock_returns,
            benchmark_returns,
            analyst_scores,
        }),
    })
}

fn build_claims(symbol: &str, quality: f64, idx: usize) -> anyhow::Result<Vec<ScoredClaim>> {
    let count = 2 + idx % 4;
    (0..count)
        .map(|c| {
            let (claim_type, tags): (ClaimType, &[&str]) = match c % 3 {
                0 => (ClaimType::CompetitiveAdvantage, &["rule_6"]),
                1 => (ClaimType::CagrConnection, &["rule_2"]),
                _ => (ClaimType::FactualClaim, &["rule_11", "rule_6"]),
            };
            let confidence = (quality * 0.8 + 0.2 * noise(idx * 10 + c)).clamp(0.0, 1.0);
            let claim = Claim::new(
                format!("{symbol} claim {}: {}", c + 1, claim_type.as_str()),
                format!("{symbol} earnings call, Q2 2024"),
                claim_type,
            )?;
            let scored = ScoredClaim::new(claim, confidence, RuleEvaluation::from_tags(tags.iter().copied())?)?
                .with_adjustments(vec![Adjustment::new("consistency_check", 0.05, "Repeated across calls")?]);
            Ok(scored)
        })
        .collect()
}
