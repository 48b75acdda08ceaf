//! Whole-market daily snapshot and index series.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Market index close for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexBar {
    pub date: NaiveDate,
    pub close: f64,
}

/// Every listed ticker's bar for one trading day plus the market breadth reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub date: NaiveDate,
    pub quotes: BTreeMap<String, OhlcvBar>,
    pub index_close: f64,
    pub limit_down_count: u32,
}

impl MarketSnapshot {
    pub fn new(date: NaiveDate, index_close: f64, limit_down_count: u32) -> Self {
        Self {
            date,
            quotes: BTreeMap::new(),
            index_close,
            limit_down_count,
        }
    }

    pub fn with_quote(mut self, bar: OhlcvBar) -> Self {
        self.quotes.insert(bar.ticker.clone(), bar);
        self
    }

    pub fn quote(&self, ticker: &str) -> Option<&OhlcvBar> {
        self.quotes.get(ticker)
    }

    pub fn close_of(&self, ticker: &str) -> Option<f64> {
        self.quotes.get(ticker).map(|b| b.close)
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.quotes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ticker: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            ticker: ticker.into(),
            date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
            turnover: close * 1000.0,
        }
    }

    #[test]
    fn snapshot_lookup_by_ticker() {
        let snap = MarketSnapshot::new(NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(), 22_000.0, 12)
            .with_quote(bar("2330", 1050.0))
            .with_quote(bar("2317", 180.0));

        assert_eq!(snap.len(), 2);
        assert_eq!(snap.close_of("2317"), Some(180.0));
        assert_eq!(snap.close_of("9999"), None);
        assert_eq!(snap.tickers().collect::<Vec<_>>(), vec!["2317", "2330"]);
    }
}
