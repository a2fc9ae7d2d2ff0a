//! Validated security identifiers.

use std::{borrow::Borrow, str::FromStr};

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{MoatError, Result};

/// Maximum accepted ticker length in characters.
pub const MAX_TICKER_LEN: usize = 32;

/// A validated ticker symbol.
///
/// Accepts exchange-style (`"MSFT"`, `"BRK.B"`) and terminal-style
/// (`"7203 JP"`, `"NESN SW"`) identifiers: ASCII uppercase letters, digits,
/// `.`, `-`, `/` and single inner spaces, at most [`MAX_TICKER_LEN`] characters.
///
/// # Example
///
/// ```
/// use moat_types::Ticker;
///
/// let ticker = Ticker::new("AAPL US").unwrap();
/// assert_eq!(ticker.as_str(), "AAPL US");
/// assert!(Ticker::new(" aapl").is_err());
/// ```
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Validate and wrap a ticker string.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(MoatError::InvalidTicker(value))
        }
    }

    /// Returns the ticker as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(value: &str) -> bool {
        if value.is_empty() || value.len() > MAX_TICKER_LEN {
            return false;
        }
        if value.starts_with(' ') || value.ends_with(' ') || value.contains("  ") {
            return false;
        }
        value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '/' | ' '))
    }
}

impl FromStr for Ticker {
    type Err = MoatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = MoatError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Ticker {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AAPL")]
    #[case("BRK.B")]
    #[case("BRK/B US")]
    #[case("7203 JP")]
    #[case("RDS-A")]
    fn test_valid_tickers(#[case] raw: &str) {
        let ticker = Ticker::new(raw).unwrap();
        assert_eq!(ticker.as_str(), raw);
        assert_eq!(ticker.to_string(), raw);
    }

    #[rstest]
    #[case("")]
    #[case("aapl")]
    #[case(" AAPL")]
    #[case("AAPL ")]
    #[case("AAPL  US")]
    #[case("AAPL$")]
    #[case("ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456")]
    fn test_invalid_tickers(#[case] raw: &str) {
        assert!(matches!(Ticker::new(raw), Err(MoatError::InvalidTicker(_))));
    }

    #[test]
    fn test_ticker_serde_validates() {
        let ticker: Ticker = serde_json::from_str("\"MSFT\"").unwrap();
        assert_eq!(ticker.as_str(), "MSFT");
        assert_eq!(serde_json::to_string(&ticker).unwrap(), "\"MSFT\"");

        let bad: std::result::Result<Ticker, _> = serde_json::from_str("\"msft\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_ticker_borrow_lookup() {
        let mut map = std::collections::HashMap::new();
        map.insert(Ticker::new("MSFT").unwrap(), 1);
        assert_eq!(map.get("MSFT"), Some(&1));
    }
}
