#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use stockhunter::domain::error::ScreenerError;
use stockhunter::domain::flow::{FlowHistory, FundamentalRecord, InstitutionalFlowRecord};
use stockhunter::domain::market::{IndexBar, MarketSnapshot};
pub use stockhunter::domain::ohlcv::OhlcvBar;
use stockhunter::ports::data_port::{
    FundamentalProvider, InstitutionalFlowProvider, MarketDataProvider, PriceHistoryProvider,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub kind: &'static str,
    pub ticker: Option<String>,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct IndexDay {
    pub date: NaiveDate,
    pub close: f64,
    pub limit_down_count: u32,
}

/// In-memory market. With `leak_future` set, history lookups return their
/// lookback window plus every later row, like a careless data source would.
pub struct MockMarket {
    pub index: Vec<IndexDay>,
    pub bars: HashMap<String, Vec<OhlcvBar>>,
    pub flows: HashMap<String, Vec<InstitutionalFlowRecord>>,
    pub fundamentals: HashMap<String, Vec<FundamentalRecord>>,
    pub failing: HashSet<String>,
    pub failing_index: HashSet<NaiveDate>,
    pub leak_future: bool,
    pub queries: Mutex<Vec<Query>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self {
            index: Vec::new(),
            bars: HashMap::new(),
            flows: HashMap::new(),
            fundamentals: HashMap::new(),
            failing: HashSet::new(),
            failing_index: HashSet::new(),
            leak_future: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Slowly rising index with no limit-down stocks on every day.
    pub fn with_rising_index(mut self, days: &[NaiveDate]) -> Self {
        self.index = days
            .iter()
            .enumerate()
            .map(|(i, &date)| IndexDay {
                date,
                close: 17_000.0 + 10.0 * i as f64,
                limit_down_count: 0,
            })
            .collect();
        self
    }

    pub fn with_index_day(mut self, date: NaiveDate, close: f64, limit_down_count: u32) -> Self {
        self.index.retain(|d| d.date != date);
        self.index.push(IndexDay {
            date,
            close,
            limit_down_count,
        });
        self.index.sort_by_key(|d| d.date);
        self
    }

    pub fn without_index_day(mut self, date: NaiveDate) -> Self {
        self.index.retain(|d| d.date != date);
        self
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.bars.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_flows(mut self, ticker: &str, flows: Vec<InstitutionalFlowRecord>) -> Self {
        self.flows.insert(ticker.to_string(), flows);
        self
    }

    pub fn with_fundamentals(mut self, ticker: &str, record: FundamentalRecord) -> Self {
        self.fundamentals
            .entry(ticker.to_string())
            .or_default()
            .push(record);
        self
    }

    pub fn with_failing(mut self, ticker: &str) -> Self {
        self.failing.insert(ticker.to_string());
        self
    }

    /// Index history lookups as of `date` fail while its snapshot still loads.
    pub fn with_failing_index(mut self, date: NaiveDate) -> Self {
        self.failing_index.insert(date);
        self
    }

    pub fn leaking(mut self) -> Self {
        self.leak_future = true;
        self
    }

    fn log(&self, kind: &'static str, ticker: Option<&str>, as_of: NaiveDate) {
        self.queries.lock().unwrap().push(Query {
            kind,
            ticker: ticker.map(str::to_string),
            as_of,
        });
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    pub fn queries_of(&self, kind: &str) -> Vec<Query> {
        self.queries().into_iter().filter(|q| q.kind == kind).collect()
    }

    fn fail_if_broken(&self, ticker: &str) -> Result<(), ScreenerError> {
        if self.failing.contains(ticker) {
            return Err(ScreenerError::provider(format!("feed down for {}", ticker)));
        }
        Ok(())
    }
}

impl MarketDataProvider for MockMarket {
    fn get_snapshot(&self, date: NaiveDate) -> Result<Option<MarketSnapshot>, ScreenerError> {
        self.log("snapshot", None, date);
        let Some(day) = self.index.iter().find(|d| d.date == date) else {
            return Ok(None);
        };
        let mut snapshot = MarketSnapshot::new(date, day.close, day.limit_down_count);
        for bars in self.bars.values() {
            if let Some(bar) = bars.iter().find(|b| b.date == date) {
                snapshot = snapshot.with_quote(bar.clone());
            }
        }
        Ok(Some(snapshot))
    }

    fn get_index_history(
        &self,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<Vec<IndexBar>, ScreenerError> {
        self.log("index", None, as_of);
        if self.failing_index.contains(&as_of) {
            return Err(ScreenerError::provider(format!("index feed down on {}", as_of)));
        }
        let bars: Vec<IndexBar> = self
            .index
            .iter()
            .map(|d| IndexBar {
                date: d.date,
                close: d.close,
            })
            .collect();
        let end = bars.partition_point(|b| b.date <= as_of);
        let start = end.saturating_sub(lookback);
        let end = if self.leak_future { bars.len() } else { end };
        Ok(bars[start..end].to_vec())
    }
}

impl PriceHistoryProvider for MockMarket {
    fn get_history(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        self.log("history", Some(ticker), as_of);
        self.fail_if_broken(ticker)?;
        let Some(series) = self.bars.get(ticker) else {
            return Ok(Vec::new());
        };
        let end = series.partition_point(|b| b.date <= as_of);
        let start = end.saturating_sub(lookback);
        let end = if self.leak_future { series.len() } else { end };
        Ok(series[start..end].to_vec())
    }
}

impl InstitutionalFlowProvider for MockMarket {
    fn get_flow(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<FlowHistory, ScreenerError> {
        self.log("flow", Some(ticker), as_of);
        self.fail_if_broken(ticker)?;
        let mut records: Vec<InstitutionalFlowRecord> =
            self.flows.get(ticker).cloned().unwrap_or_default();
        records.sort_by_key(|r| r.date);
        let end = records.partition_point(|r| r.date <= as_of);
        let start = end.saturating_sub(lookback);
        if self.leak_future {
            // from_records clips to its as-of date, so pass the far future
            return Ok(FlowHistory::from_records(records[start..].to_vec(), NaiveDate::MAX));
        }
        Ok(FlowHistory::from_records(records[start..end].to_vec(), as_of))
    }
}

impl FundamentalProvider for MockMarket {
    fn get_latest(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<Option<FundamentalRecord>, ScreenerError> {
        self.log("fundamentals", Some(ticker), as_of);
        let records = self.fundamentals.get(ticker);
        if self.leak_future {
            return Ok(records.and_then(|r| r.iter().max_by_key(|f| f.as_of)).cloned());
        }
        Ok(records
            .and_then(|r| r.iter().filter(|f| f.as_of <= as_of).max_by_key(|f| f.as_of))
            .cloned())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// `n` consecutive weekdays starting at `start`.
pub fn trading_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(n);
    let mut d = start;
    while days.len() < n {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(d);
        }
        d += Duration::days(1);
    }
    days
}

pub fn make_bar(ticker: &str, date: NaiveDate, close: f64, volume: i64) -> OhlcvBar {
    OhlcvBar {
        ticker: ticker.to_string(),
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume,
        turnover: close * volume as f64,
    }
}

/// Zig-zag uptrend: every even day jumps on heavier volume, every odd day
/// gives part of it back on lighter volume. Even days pass the trend gate with
/// RSI near 65; odd days fail on volume expansion.
pub fn zigzag_closes(base: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| base + 0.3 * i as f64 + if i % 2 == 0 { 1.0 } else { 0.0 })
        .collect()
}

pub fn zigzag_bars(ticker: &str, days: &[NaiveDate], base: f64) -> Vec<OhlcvBar> {
    zigzag_closes(base, days.len())
        .into_iter()
        .zip(days)
        .enumerate()
        .map(|(i, (close, &d))| make_bar(ticker, d, close, if i % 2 == 0 { 3_000 } else { 2_000 }))
        .collect()
}

pub fn steady_buying(days: &[NaiveDate], foreign: i64, trust: i64) -> Vec<InstitutionalFlowRecord> {
    days.iter()
        .map(|&date| InstitutionalFlowRecord {
            date,
            foreign,
            trust,
            dealer: 0,
        })
        .collect()
}

pub fn healthy_fundamentals(as_of: NaiveDate) -> FundamentalRecord {
    FundamentalRecord {
        as_of,
        valuation_ratio: Some(15.0),
        revenue_yoy_pct: Some(12.0),
    }
}

/// A market where `tickers` all follow the zig-zag uptrend with steady
/// institutional buying over `days`.
pub fn bullish_market(tickers: &[(&str, f64)], days: &[NaiveDate]) -> MockMarket {
    let mut market = MockMarket::new().with_rising_index(days);
    for &(ticker, base) in tickers {
        market = market
            .with_bars(ticker, zigzag_bars(ticker, days, base))
            .with_flows(ticker, steady_buying(days, 200, 100))
            .with_fundamentals(ticker, healthy_fundamentals(days[0]));
    }
    market
}

/// Index of the last even position in `days[..=upto]`.
pub fn last_even(upto: usize) -> usize {
    if upto % 2 == 0 {
        upto
    } else {
        upto - 1
    }
}
