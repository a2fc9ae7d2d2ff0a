//! Universe membership and sector classification.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::Ticker;

/// Read-only ticker to GICS sector mapping for an investable universe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseConfig {
    sectors: HashMap<Ticker, String>,
}

impl UniverseConfig {
    /// Create a universe from a ticker to sector map.
    pub const fn new(sectors: HashMap<Ticker, String>) -> Self {
        Self { sectors }
    }

    /// Sector for a ticker, if it belongs to the universe.
    pub fn sector_of(&self, ticker: &Ticker) -> Option<&str> {
        self.sectors.get(ticker).map(String::as_str)
    }

    /// Whether the ticker belongs to the universe.
    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.sectors.contains_key(ticker)
    }

    /// Distinct sectors, sorted.
    pub fn sectors(&self) -> BTreeSet<&str> {
        self.sectors.values().map(String::as_str).collect()
    }

    /// Number of tickers.
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    /// Whether the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

impl FromIterator<(Ticker, String)> for UniverseConfig {
    fn from_iter<I: IntoIterator<Item = (Ticker, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
