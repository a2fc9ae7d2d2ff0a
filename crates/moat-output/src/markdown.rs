//! Markdown rendering for the summary and per-holding rationale reports.

use std::fmt::Write;

use moat_types::{EvaluationResult, PortfolioHolding, PortfolioResult, ScoredClaim, StockScore};

use crate::Result;

/// Render `summary.md`: sector allocations, holdings and, when present, evaluation.
pub fn render_summary(portfolio: &PortfolioResult, evaluation: Option<&EvaluationResult>) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "# Portfolio summary ({})", portfolio.as_of_date())?;
    writeln!(out)?;
    writeln!(
        out,
        "{} holdings, total weight {:.4}",
        portfolio.len(),
        portfolio.total_weight()
    )?;

    writeln!(out)?;
    writeln!(out, "## Sector allocation")?;
    writeln!(out)?;
    writeln!(out, "| Sector | Benchmark | Actual | Active | Stocks |")?;
    writeln!(out, "|---|---:|---:|---:|---:|")?;
    for alloc in portfolio.sector_allocations() {
        writeln!(
            out,
            "| {} | {:.2}% | {:.2}% | {:+.2}% | {} |",
            alloc.sector,
            alloc.benchmark_weight * 100.0,
            alloc.actual_weight * 100.0,
            (alloc.actual_weight - alloc.benchmark_weight) * 100.0,
            alloc.stock_count
        )?;
    }

    writeln!(out)?;
    writeln!(out, "## Holdings")?;
    writeln!(out)?;
    writeln!(out, "| Ticker | Sector | Weight | Score | Rationale |")?;
    writeln!(out, "|---|---|---:|---:|---|")?;
    for holding in portfolio.holdings() {
        writeln!(
            out,
            "| {} | {} | {:.2}% | {:.3} | {} |",
            holding.ticker(),
            holding.sector(),
            holding.weight() * 100.0,
            holding.score(),
            holding.rationale_summary()
        )?;
    }

    if let Some(eval) = evaluation {
        write_evaluation(&mut out, eval)?;
    }
    Ok(out)
}

fn write_evaluation(out: &mut String, eval: &EvaluationResult) -> Result<()> {
    let perf = &eval.performance;
    let corr = &eval.analyst_correlation;
    let transparency = &eval.transparency;

    writeln!(out)?;
    writeln!(out, "## Evaluation (threshold {:.2}, as of {})", eval.threshold, eval.as_of_date)?;
    writeln!(out)?;
    writeln!(out, "| Metric | Value |")?;
    writeln!(out, "|---|---:|")?;
    writeln!(out, "| Sharpe ratio | {:.3} |", perf.sharpe_ratio)?;
    writeln!(out, "| Max drawdown | {:.2}% |", perf.max_drawdown * 100.0)?;
    writeln!(out, "| Beta | {:.3} |", perf.beta)?;
    writeln!(out, "| Information ratio | {:.3} |", perf.information_ratio)?;
    writeln!(out, "| Cumulative return | {:.2}% |", perf.cumulative_return * 100.0)?;
    writeln!(out, "| Analyst Spearman | {} |", optional(corr.spearman_correlation))?;
    writeln!(out, "| Analyst p-value | {} |", optional(corr.p_value))?;
    writeln!(out, "| Analyst hit rate | {} |", optional(corr.hit_rate))?;
    writeln!(out, "| Analyst sample | {} |", corr.sample_size)?;
    writeln!(out, "| Mean claims | {:.2} |", transparency.mean_claim_count)?;
    writeln!(out, "| Mean structural weight | {:.3} |", transparency.mean_structural_weight)?;
    writeln!(out, "| Coverage | {:.1}% |", transparency.coverage_rate * 100.0)?;
    Ok(())
}

/// Render `rationale/<TICKER>.md` for one holding.
///
/// `claims` lists every scored claim behind the holding; it may be empty when
/// the holding has no claim record.
pub fn render_rationale(
    holding: &PortfolioHolding,
    score: Option<&StockScore>,
    claims: &[ScoredClaim],
) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "# {}", holding.ticker())?;
    writeln!(out)?;
    writeln!(out, "- Sector: {}", holding.sector())?;
    writeln!(out, "- Weight: {:.2}%", holding.weight() * 100.0)?;
    writeln!(out, "- Score: {:.3}", holding.score())?;
    if let Some(score) = score {
        writeln!(out, "- Claims: {}", score.claim_count())?;
        writeln!(out, "- Structural weight: {:.3}", score.structural_weight())?;
    }
    writeln!(out, "- Summary: {}", holding.rationale_summary())?;

    writeln!(out)?;
    writeln!(out, "## Claims")?;
    if claims.is_empty() {
        writeln!(out)?;
        writeln!(out, "No scored claims recorded.")?;
    }
    for (i, scored) in claims.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "### {}. {}", i + 1, scored.claim().claim())?;
        writeln!(out)?;
        writeln!(out, "- Type: {}", scored.claim_type().as_str())?;
        writeln!(out, "- Confidence: {:.2}", scored.final_confidence())?;
        let mut applied: Vec<_> = scored.rule_evaluation().applied_rules().iter().collect();
        applied.sort_by_key(|rule| rule.number());
        let rules: Vec<String> = applied.iter().map(ToString::to_string).collect();
        if !rules.is_empty() {
            writeln!(out, "- Rules: {}", rules.join(", "))?;
        }
        if !scored.claim().evidence().is_empty() {
            writeln!(out, "- Evidence: {}", scored.claim().evidence())?;
        }
        for adj in scored.adjustments() {
            writeln!(
                out,
                "- Adjustment ({}): {:+.2}, {}",
                adj.source(),
                adj.adjustment(),
                adj.reasoning()
            )?;
        }
    }
    Ok(out)
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}
