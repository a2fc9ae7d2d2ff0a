//! Writes a pipeline run to a report directory.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use moat_types::{EvaluationResult, PortfolioResult, ScoredClaim, StockScore, Ticker};
use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    OutputError, Result,
    markdown::{render_rationale, render_summary},
};

/// Everything one report is built from. Nothing in it is modified.
#[derive(Debug, Clone, Copy)]
pub struct OutputBundle<'a> {
    /// The constructed portfolio.
    pub portfolio: &'a PortfolioResult,
    /// Aggregate scores of the whole universe.
    pub stock_scores: &'a HashMap<Ticker, StockScore>,
    /// Scored claims per ticker, used for rationale files.
    pub scored_claims: &'a HashMap<Ticker, Vec<ScoredClaim>>,
    /// Evaluation of the portfolio, if market data was available.
    pub evaluation: Option<&'a EvaluationResult>,
}

/// Paths written by [`OutputGenerator::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutputManifest {
    /// Report root directory.
    pub directory: PathBuf,
    /// Files written, in write order.
    pub files: Vec<PathBuf>,
}

impl OutputManifest {
    /// Whether `name` (relative to the report directory) was written.
    pub fn contains(&self, name: impl AsRef<Path>) -> bool {
        let path = self.directory.join(name);
        self.files.iter().any(|f| *f == path)
    }
}

#[derive(Serialize)]
struct ScoreRecord<'a> {
    ticker: &'a Ticker,
    aggregate_score: f64,
    claim_count: usize,
    structural_weight: f64,
}

/// Writes JSON, CSV and Markdown reports into a directory.
#[derive(Debug, Clone)]
pub struct OutputGenerator {
    directory: PathBuf,
}

impl OutputGenerator {
    /// Create a generator rooted at `directory`. Nothing is created until
    /// [`write`](Self::write).
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Report root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write all reports for `bundle`, creating directories as needed.
    pub fn write(&self, bundle: &OutputBundle<'_>) -> Result<OutputManifest> {
        let rationale_dir = self.directory.join("rationale");
        fs::create_dir_all(&rationale_dir).map_err(|e| OutputError::io(&rationale_dir, e))?;

        let mut manifest = OutputManifest {
            directory: self.directory.clone(),
            files: Vec::new(),
        };

        manifest.files.push(self.write_json("portfolio.json", bundle.portfolio)?);
        manifest.files.push(self.write_portfolio_csv(bundle.portfolio)?);
        manifest.files.push(self.write_json("stock_scores.json", &score_records(bundle.stock_scores))?);
        if let Some(eval) = bundle.evaluation {
            manifest.files.push(self.write_json("evaluation.json", eval)?);
        }

        let summary = render_summary(bundle.portfolio, bundle.evaluation)?;
        manifest.files.push(self.write_text(&self.directory.join("summary.md"), &summary)?);

        for holding in bundle.portfolio.holdings() {
            let claims = bundle
                .scored_claims
                .get(holding.ticker())
                .map_or(&[][..], Vec::as_slice);
            let text = render_rationale(holding, bundle.stock_scores.get(holding.ticker()), claims)?;
            let path = rationale_dir.join(format!("{}.md", file_stem(holding.ticker())));
            manifest.files.push(self.write_text(&path, &text)?);
        }

        info!(
            directory = %self.directory.display(),
            files = manifest.files.len(),
            "wrote reports"
        );
        Ok(manifest)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_text(&self.directory.join(name), &json)
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<PathBuf> {
        fs::write(path, text).map_err(|e| OutputError::io(path, e))?;
        debug!(path = %path.display(), bytes = text.len(), "wrote file");
        Ok(path.to_path_buf())
    }

    fn write_portfolio_csv(&self, portfolio: &PortfolioResult) -> Result<PathBuf> {
        let mut df = holdings_frame(portfolio)?;
        let path = self.directory.join("portfolio.csv");
        let mut file = fs::File::create(&path).map_err(|e| OutputError::io(&path, e))?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
        debug!(path = %path.display(), rows = df.height(), "wrote file");
        Ok(path)
    }
}

/// One row per holding: ticker, sector, weight, score, rationale.
pub fn holdings_frame(portfolio: &PortfolioResult) -> Result<DataFrame> {
    let holdings = portfolio.holdings();
    let tickers: Vec<&str> = holdings.iter().map(|h| h.ticker().as_str()).collect();
    let sectors: Vec<&str> = holdings.iter().map(|h| h.sector()).collect();
    let weights: Vec<f64> = holdings.iter().map(|h| h.weight()).collect();
    let scores: Vec<f64> = holdings.iter().map(|h| h.score()).collect();
    let rationales: Vec<&str> = holdings.iter().map(|h| h.rationale_summary()).collect();

    let df = df! {
        "ticker" => tickers,
        "sector" => sectors,
        "weight" => weights,
        "score" => scores,
        "rationale" => rationales,
    }?;
    Ok(df)
}

fn score_records(scores: &HashMap<Ticker, StockScore>) -> Vec<ScoreRecord<'_>> {
    let mut records: Vec<ScoreRecord<'_>> = scores
        .values()
        .map(|s| ScoreRecord {
            ticker: s.ticker(),
            aggregate_score: s.aggregate_score(),
            claim_count: s.claim_count(),
            structural_weight: s.structural_weight(),
        })
        .collect();
    records.sort_by(|a, b| a.ticker.cmp(b.ticker));
    records
}

/// File-name form of a ticker: `/` and spaces become `_`.
pub fn file_stem(ticker: &Ticker) -> String {
    ticker.as_str().replace(['/', ' '], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use moat_types::{
        AnalystCorrelation, Claim, ClaimType, Date, PerformanceMetrics, PortfolioHolding,
        RuleEvaluation, SectorAllocation, TransparencyMetrics,
    };

    fn date() -> Date {
        Date::from_ymd_opt(2024, 9, 30).unwrap()
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn portfolio() -> PortfolioResult {
        let holdings = vec![
            PortfolioHolding::new(ticker("MSFT US"), 0.6, "Tech", 0.8, "Sector rank 1, score 0.80")
                .unwrap(),
            PortfolioHolding::new(ticker("BRK/B"), 0.4, "Financials", 0.6, "Sector rank 1, score 0.60")
                .unwrap(),
        ];
        let allocations = vec![
            SectorAllocation {
                sector: "Tech".to_string(),
                benchmark_weight: 0.6,
                actual_weight: 0.6,
                stock_count: 1,
            },
            SectorAllocation {
                sector: "Financials".to_string(),
                benchmark_weight: 0.4,
                actual_weight: 0.4,
                stock_count: 1,
            },
        ];
        PortfolioResult::new(holdings, allocations, date())
    }

    fn scores() -> HashMap<Ticker, StockScore> {
        [("MSFT US", 0.8, 3), ("BRK/B", 0.6, 1), ("AAPL", 0.4, 2)]
            .into_iter()
            .map(|(t, s, n)| (ticker(t), StockScore::new(ticker(t), s, n, 0.5).unwrap()))
            .collect()
    }

    fn claims() -> HashMap<Ticker, Vec<ScoredClaim>> {
        let claim = Claim::new("Azure has high switching costs", "Q3 call", ClaimType::CompetitiveAdvantage)
            .unwrap();
        let rules = RuleEvaluation::from_tags(["rule_6", "rule_2"]).unwrap();
        let scored = ScoredClaim::new(claim, 0.8, rules).unwrap();
        HashMap::from([(ticker("MSFT US"), vec![scored])])
    }

    fn evaluation() -> EvaluationResult {
        EvaluationResult {
            threshold: 0.5,
            portfolio_size: 2,
            performance: PerformanceMetrics {
                sharpe_ratio: 1.2,
                max_drawdown: 0.1,
                beta: 0.9,
                information_ratio: 0.4,
                cumulative_return: 0.15,
            },
            analyst_correlation: AnalystCorrelation::default(),
            transparency: TransparencyMetrics::default(),
            as_of_date: date(),
        }
    }

    #[test]
    fn test_write_without_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let generator = OutputGenerator::new(dir.path().join("report"));
        let (portfolio, scores, claims) = (portfolio(), scores(), claims());
        let bundle = OutputBundle {
            portfolio: &portfolio,
            stock_scores: &scores,
            scored_claims: &claims,
            evaluation: None,
        };

        let manifest = generator.write(&bundle).unwrap();
        assert!(manifest.contains("portfolio.json"));
        assert!(manifest.contains("portfolio.csv"));
        assert!(manifest.contains("stock_scores.json"));
        assert!(manifest.contains("summary.md"));
        assert!(manifest.contains("rationale/MSFT_US.md"));
        assert!(manifest.contains("rationale/BRK_B.md"));
        assert!(!manifest.contains("evaluation.json"));
        assert!(!dir.path().join("report/evaluation.json").exists());
        for file in &manifest.files {
            assert!(file.exists(), "{} missing", file.display());
        }
    }

    #[test]
    fn test_write_contents() {
        let dir = tempfile::tempdir().unwrap();
        let generator = OutputGenerator::new(dir.path());
        let (portfolio, scores, claims, eval) = (portfolio(), scores(), claims(), evaluation());
        let bundle = OutputBundle {
            portfolio: &portfolio,
            stock_scores: &scores,
            scored_claims: &claims,
            evaluation: Some(&eval),
        };
        generator.write(&bundle).unwrap();

        let json = fs::read_to_string(dir.path().join("portfolio.json")).unwrap();
        let parsed: PortfolioResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, portfolio);

        let scores_json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("stock_scores.json")).unwrap())
                .unwrap();
        let tickers: Vec<&str> = scores_json
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["ticker"].as_str().unwrap())
            .collect();
        assert_eq!(tickers, vec!["AAPL", "BRK/B", "MSFT US"]);

        let csv = fs::read_to_string(dir.path().join("portfolio.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("ticker,sector,weight,score,rationale"));
        assert_eq!(csv.lines().count(), 3);

        let eval_json = fs::read_to_string(dir.path().join("evaluation.json")).unwrap();
        let parsed: EvaluationResult = serde_json::from_str(&eval_json).unwrap();
        assert_eq!(parsed, eval);

        let summary = fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert!(summary.contains("## Sector allocation"));
        assert!(summary.contains("| MSFT US | Tech | 60.00% |"));
        assert!(summary.contains("| Analyst Spearman | n/a |"));

        let rationale = fs::read_to_string(dir.path().join("rationale/MSFT_US.md")).unwrap();
        assert!(rationale.contains("Azure has high switching costs"));
        assert!(rationale.contains("- Rules: rule_2, rule_6"));

        let empty = fs::read_to_string(dir.path().join("rationale/BRK_B.md")).unwrap();
        assert!(empty.contains("No scored claims recorded."));
    }

    #[test]
    fn test_holdings_frame_empty_portfolio() {
        let df = holdings_frame(&PortfolioResult::empty(date())).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 5);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(&ticker("BRK/B")), "BRK_B");
        assert_eq!(file_stem(&ticker("AAPL US")), "AAPL_US");
        assert_eq!(file_stem(&ticker("AAPL")), "AAPL");
    }
}
