//! Universe selection for a scan date.
//!
//! The universe is every ticker quoted in the day's snapshot, narrowed to an
//! optional watchlist, minus tickers whose prefix marks an excluded sector.

use crate::domain::config::UniverseConfig;
use crate::domain::market::MarketSnapshot;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub tickers: Vec<String>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.tickers.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Parses a comma-separated ticker list.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

pub fn excluded_prefix<'a>(ticker: &str, prefixes: &'a [String]) -> Option<&'a str> {
    prefixes
        .iter()
        .find(|p| ticker.starts_with(p.as_str()))
        .map(String::as_str)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedTicker {
    pub ticker: String,
    pub prefix: String,
}

pub struct UniverseSelection {
    pub universe: Universe,
    pub excluded: Vec<ExcludedTicker>,
}

pub fn select(snapshot: &MarketSnapshot, config: &UniverseConfig) -> UniverseSelection {
    let watchlist: HashSet<&str> = config.watchlist.iter().map(String::as_str).collect();
    let mut tickers = Vec::new();
    let mut excluded = Vec::new();

    for ticker in snapshot.tickers() {
        if !watchlist.is_empty() && !watchlist.contains(ticker) {
            continue;
        }
        match excluded_prefix(ticker, &config.excluded_prefixes) {
            Some(prefix) => excluded.push(ExcludedTicker {
                ticker: ticker.to_string(),
                prefix: prefix.to_string(),
            }),
            None => tickers.push(ticker.to_string()),
        }
    }

    UniverseSelection {
        universe: Universe { tickers },
        excluded,
    }
}
