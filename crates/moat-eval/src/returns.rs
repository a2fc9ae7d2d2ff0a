//! Portfolio return series from per-stock returns.

use std::collections::{BTreeMap, HashMap};

use moat_types::{Date, PortfolioResult, ReturnSeries, Ticker};

/// Constant-weight portfolio returns.
///
/// Each date any holding has an observation contributes
/// `sum(weight_i * return_i)`. Missing or non-finite stock returns count as
/// zero for that holding on that date.
pub fn portfolio_returns(
    portfolio: &PortfolioResult,
    stock_returns: &HashMap<Ticker, ReturnSeries>,
) -> ReturnSeries {
    let mut by_date: BTreeMap<Date, f64> = BTreeMap::new();
    for holding in portfolio.holdings() {
        let Some(series) = stock_returns.get(holding.ticker()) else {
            continue;
        };
        for (date, ret) in series.dates().iter().zip(series.values()) {
            let contribution = if ret.is_finite() {
                holding.weight() * ret
            } else {
                0.0
            };
            *by_date.entry(*date).or_insert(0.0) += contribution;
        }
    }
    ReturnSeries::new(by_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use moat_types::PortfolioHolding;

    fn date(day: u32) -> Date {
        Date::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn ticker(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    #[test]
    fn test_weighted_sum() {
        let holdings = vec![
            PortfolioHolding::new(ticker("A"), 0.6, "Tech", 0.8, "").unwrap(),
            PortfolioHolding::new(ticker("B"), 0.4, "Tech", 0.6, "").unwrap(),
        ];
        let portfolio = PortfolioResult::new(holdings, Vec::new(), date(1));

        let mut returns = HashMap::new();
        returns.insert(ticker("A"), ReturnSeries::new([(date(1), 0.01), (date(2), 0.02)]));
        returns.insert(ticker("B"), ReturnSeries::new([(date(1), -0.01), (date(3), f64::NAN)]));
        returns.insert(ticker("C"), ReturnSeries::new([(date(4), 0.5)]));

        let series = portfolio_returns(&portfolio, &returns);
        assert_eq!(series.dates(), &[date(1), date(2), date(3)]);
        assert_relative_eq!(series.values()[0], 0.002, epsilon = 1e-12);
        assert_relative_eq!(series.values()[1], 0.012, epsilon = 1e-12);
        assert_eq!(series.values()[2], 0.0);
    }

    #[test]
    fn test_empty_portfolio() {
        let series = portfolio_returns(&PortfolioResult::empty(date(1)), &HashMap::new());
        assert!(series.is_empty());
    }
}
