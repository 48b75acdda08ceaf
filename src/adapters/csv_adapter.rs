//! CSV directory data adapter.
//!
//! Layout under the base directory:
//!
//! ```text
//! index.csv              date,close,limit_down_count
//! prices/<ticker>.csv    date,open,high,low,close,volume,turnover
//! flow/<ticker>.csv      date,foreign,trust,dealer         (optional)
//! fundamentals.csv       ticker,as_of,valuation_ratio,revenue_yoy_pct (optional)
//! ```
//!
//! Everything is loaded once; lookups are served from memory and never return
//! rows dated after the requested day.

use crate::domain::decision::Decision;
use crate::domain::error::ScreenerError;
use crate::domain::flow::{FlowHistory, FundamentalRecord, InstitutionalFlowRecord};
use crate::domain::market::{IndexBar, MarketSnapshot};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::Position;
use crate::ports::data_port::{
    FundamentalProvider, InstitutionalFlowProvider, MarketDataProvider, PriceHistoryProvider,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
struct IndexRow {
    date: NaiveDate,
    close: f64,
    limit_down_count: u32,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    turnover: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FlowRow {
    date: NaiveDate,
    foreign: i64,
    trust: i64,
    dealer: i64,
}

#[derive(Debug, Deserialize)]
struct FundamentalRow {
    ticker: String,
    as_of: NaiveDate,
    valuation_ratio: Option<f64>,
    revenue_yoy_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PositionRow {
    ticker: String,
    entry_price: f64,
    entry_date: NaiveDate,
    peak_price: Option<f64>,
}

pub struct CsvDataSource {
    base_path: PathBuf,
    index: Vec<IndexRow>,
    bars: HashMap<String, Vec<OhlcvBar>>,
    flows: HashMap<String, Vec<InstitutionalFlowRecord>>,
    fundamentals: HashMap<String, Vec<FundamentalRecord>>,
}

impl CsvDataSource {
    pub fn open<P: AsRef<Path>>(base_path: P) -> Result<Self, ScreenerError> {
        let base_path = base_path.as_ref().to_path_buf();

        let mut index: Vec<IndexRow> = read_rows(&base_path.join("index.csv"))?;
        index.sort_by_key(|r| r.date);

        let mut bars = HashMap::new();
        for (ticker, path) in ticker_files(&base_path.join("prices"))? {
            let rows: Vec<PriceRow> = read_rows(&path)?;
            let mut series: Vec<OhlcvBar> = rows
                .into_iter()
                .map(|r| OhlcvBar {
                    ticker: ticker.clone(),
                    date: r.date,
                    open: r.open,
                    high: r.high,
                    low: r.low,
                    close: r.close,
                    volume: r.volume,
                    turnover: r.turnover.unwrap_or(r.close * r.volume as f64),
                })
                .collect();
            series.sort_by_key(|b| b.date);
            bars.insert(ticker, series);
        }

        let mut flows = HashMap::new();
        let flow_dir = base_path.join("flow");
        if flow_dir.is_dir() {
            for (ticker, path) in ticker_files(&flow_dir)? {
                let rows: Vec<FlowRow> = read_rows(&path)?;
                let mut records: Vec<InstitutionalFlowRecord> = rows
                    .into_iter()
                    .map(|r| InstitutionalFlowRecord {
                        date: r.date,
                        foreign: r.foreign,
                        trust: r.trust,
                        dealer: r.dealer,
                    })
                    .collect();
                records.sort_by_key(|r| r.date);
                flows.insert(ticker, records);
            }
        }

        let mut fundamentals: HashMap<String, Vec<FundamentalRecord>> = HashMap::new();
        let fundamentals_path = base_path.join("fundamentals.csv");
        if fundamentals_path.is_file() {
            let rows: Vec<FundamentalRow> = read_rows(&fundamentals_path)?;
            for row in rows {
                fundamentals.entry(row.ticker).or_default().push(FundamentalRecord {
                    as_of: row.as_of,
                    valuation_ratio: row.valuation_ratio,
                    revenue_yoy_pct: row.revenue_yoy_pct,
                });
            }
            for records in fundamentals.values_mut() {
                records.sort_by_key(|r| r.as_of);
            }
        }

        debug!(
            path = %base_path.display(),
            tickers = bars.len(),
            index_days = index.len(),
            "csv data loaded"
        );

        Ok(Self {
            base_path,
            index,
            bars,
            flows,
            fundamentals,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.bars.keys().cloned().collect();
        tickers.sort();
        tickers
    }

    /// First and last index dates.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.index.first()?.date, self.index.last()?.date))
    }
}

impl MarketDataProvider for CsvDataSource {
    fn get_snapshot(&self, date: NaiveDate) -> Result<Option<MarketSnapshot>, ScreenerError> {
        let Ok(pos) = self.index.binary_search_by_key(&date, |r| r.date) else {
            return Ok(None);
        };
        let row = &self.index[pos];
        let mut snapshot = MarketSnapshot::new(date, row.close, row.limit_down_count);
        for series in self.bars.values() {
            if let Ok(i) = series.binary_search_by_key(&date, |b| b.date) {
                snapshot = snapshot.with_quote(series[i].clone());
            }
        }
        Ok(Some(snapshot))
    }

    fn get_index_history(
        &self,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<Vec<IndexBar>, ScreenerError> {
        let end = self.index.partition_point(|r| r.date <= as_of);
        let start = end.saturating_sub(lookback);
        Ok(self.index[start..end]
            .iter()
            .map(|r| IndexBar {
                date: r.date,
                close: r.close,
            })
            .collect())
    }
}

impl PriceHistoryProvider for CsvDataSource {
    fn get_history(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let Some(series) = self.bars.get(ticker) else {
            return Ok(Vec::new());
        };
        let end = series.partition_point(|b| b.date <= as_of);
        let start = end.saturating_sub(lookback);
        Ok(series[start..end].to_vec())
    }
}

impl InstitutionalFlowProvider for CsvDataSource {
    fn get_flow(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<FlowHistory, ScreenerError> {
        let Some(records) = self.flows.get(ticker) else {
            return Ok(FlowHistory::default());
        };
        let end = records.partition_point(|r| r.date <= as_of);
        let start = end.saturating_sub(lookback);
        Ok(FlowHistory::from_records(records[start..end].to_vec(), as_of))
    }
}

impl FundamentalProvider for CsvDataSource {
    fn get_latest(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<Option<FundamentalRecord>, ScreenerError> {
        Ok(self
            .fundamentals
            .get(ticker)
            .and_then(|records| records.iter().rev().find(|r| r.as_of <= as_of))
            .cloned())
    }
}

/// Reads held positions from `ticker,entry_price,entry_date[,peak_price]`.
pub fn read_positions<P: AsRef<Path>>(path: P) -> Result<Vec<Position>, ScreenerError> {
    let rows: Vec<PositionRow> = read_rows(path.as_ref())?;
    rows.into_iter()
        .map(|row| {
            let mut position = Position::open(row.ticker, row.entry_price, row.entry_date)?;
            if let Some(peak) = row.peak_price {
                position.mark(peak);
            }
            Ok(position)
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct DecisionRow<'a> {
    date: NaiveDate,
    ticker: &'a str,
    score: i32,
    tier: String,
    allocation: f64,
    close: f64,
    stop_loss: f64,
    take_profit: Option<f64>,
    stretch_target: Option<f64>,
    five_day_cumulative: i64,
    leader: String,
    annotations: String,
}

/// Writes one row per decision.
pub fn write_decisions<W: Write>(decisions: &[Decision], writer: W) -> Result<(), ScreenerError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for d in decisions {
        let annotations: Vec<String> = d.annotations.iter().map(|a| a.to_string()).collect();
        wtr.serialize(DecisionRow {
            date: d.date,
            ticker: &d.ticker,
            score: d.score,
            tier: d.allocation.tier.to_string(),
            allocation: d.allocation.fraction,
            close: d.close,
            stop_loss: d.risk.stop_loss,
            take_profit: d.risk.take_profit,
            stretch_target: d.risk.stretch_target,
            five_day_cumulative: d.five_day_cumulative,
            leader: format!("{:?}", d.leader),
            annotations: annotations.join("; "),
        })
        .map_err(|e| ScreenerError::Report {
            reason: format!("CSV write error: {}", e),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, ScreenerError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ScreenerError::provider(format!("failed to read {}: {}", path.display(), e))
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    rdr.deserialize()
        .map(|row| {
            row.map_err(|e| {
                ScreenerError::provider(format!("CSV parse error in {}: {}", path.display(), e))
            })
        })
        .collect()
}

/// `(ticker, path)` for every `<ticker>.csv` in `dir`, sorted by ticker.
fn ticker_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, ScreenerError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        ScreenerError::provider(format!("failed to read directory {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| ScreenerError::provider(format!("directory entry error: {}", e)))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            if let Some(stem) = path.file_stem() {
                files.push((stem.to_string_lossy().to_string(), path));
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn setup_test_data() -> TempDir {
        let dir = TempDir::new().unwrap();
        let path = dir.path();
        fs::create_dir(path.join("prices")).unwrap();
        fs::create_dir(path.join("flow")).unwrap();

        fs::write(
            path.join("index.csv"),
            "date,close,limit_down_count\n\
             2024-01-15,17500,3\n\
             2024-01-16,17600,5\n\
             2024-01-17,17400,120\n",
        )
        .unwrap();
        fs::write(
            path.join("prices/2330.csv"),
            "date,open,high,low,close,volume,turnover\n\
             2024-01-17,110.0,120.0,105.0,115.0,55000,6325000\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000,5250000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000,\n",
        )
        .unwrap();
        fs::write(
            path.join("prices/2317.csv"),
            "date,open,high,low,close,volume,turnover\n\
             2024-01-15,50.0,51.0,49.0,50.5,1000,50500\n",
        )
        .unwrap();
        fs::write(
            path.join("flow/2330.csv"),
            "date,foreign,trust,dealer\n\
             2024-01-15,100,20,-5\n\
             2024-01-16,-40,10,0\n\
             2024-01-17,300,0,0\n",
        )
        .unwrap();
        fs::write(
            path.join("fundamentals.csv"),
            "ticker,as_of,valuation_ratio,revenue_yoy_pct\n\
             2330,2024-01-10,18.5,12.0\n\
             2330,2024-01-17,19.0,\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn history_is_ascending_and_bounded() {
        let dir = setup_test_data();
        let source = CsvDataSource::open(dir.path()).unwrap();

        let bars = source.get_history("2330", date(16), 10).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, date(15));
        assert_eq!(bars[1].date, date(16));
        // blank turnover falls back to close * volume
        assert_eq!(bars[1].turnover, 110.0 * 60000.0);

        let bars = source.get_history("2330", date(17), 1).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 115.0);
    }

    #[test]
    fn snapshot_holds_quotes_traded_that_day() {
        let dir = setup_test_data();
        let source = CsvDataSource::open(dir.path()).unwrap();

        let snap = source.get_snapshot(date(15)).unwrap().unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.limit_down_count, 3);

        let snap = source.get_snapshot(date(17)).unwrap().unwrap();
        assert_eq!(snap.tickers().collect::<Vec<_>>(), vec!["2330"]);

        assert!(source.get_snapshot(date(20)).unwrap().is_none());
    }

    #[test]
    fn index_history_respects_as_of() {
        let dir = setup_test_data();
        let source = CsvDataSource::open(dir.path()).unwrap();
        let history = source.get_index_history(date(16), 60).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].close, 17600.0);
        assert_eq!(source.date_range(), Some((date(15), date(17))));
    }

    #[test]
    fn flow_is_most_recent_first() {
        let dir = setup_test_data();
        let source = CsvDataSource::open(dir.path()).unwrap();
        let flow = source.get_flow("2330", date(16), 20).unwrap();
        assert_eq!(flow.len(), 2);
        assert_eq!(flow.latest().unwrap().date, date(16));
        assert!(source.get_flow("2317", date(16), 20).unwrap().is_empty());
    }

    #[test]
    fn latest_fundamentals_as_of() {
        let dir = setup_test_data();
        let source = CsvDataSource::open(dir.path()).unwrap();
        let rec = source.get_latest("2330", date(16)).unwrap().unwrap();
        assert_eq!(rec.valuation_ratio, Some(18.5));
        let rec = source.get_latest("2330", date(17)).unwrap().unwrap();
        assert_eq!(rec.revenue_yoy_pct, None);
        assert!(source.get_latest("2330", date(1)).unwrap().is_none());
    }

    #[test]
    fn missing_index_is_a_provider_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            CsvDataSource::open(dir.path()),
            Err(ScreenerError::Provider { .. })
        ));
    }

    #[test]
    fn positions_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("holdings.csv");
        fs::write(
            &path,
            "ticker,entry_price,entry_date,peak_price\n\
             2330,100.0,2024-01-02,118.0\n\
             2317,50.0,2024-01-05,\n",
        )
        .unwrap();
        let positions = read_positions(&path).unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].peak_price, 118.0);
        assert_eq!(positions[1].peak_price, 50.0);
    }
}
