//! Market data provider ports.
//!
//! Implementations must return nothing dated after the requested `as_of`.
//! The pipeline clips defensively anyway. Retry and credential handling
//! belong inside implementations.

use crate::domain::error::ScreenerError;
use crate::domain::flow::{FlowHistory, FundamentalRecord};
use crate::domain::market::{IndexBar, MarketSnapshot};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait MarketDataProvider: Sync {
    /// Snapshot for `date`, or `None` when the market did not trade or the
    /// data is missing.
    fn get_snapshot(&self, date: NaiveDate) -> Result<Option<MarketSnapshot>, ScreenerError>;

    /// Up to `lookback` index closes ending at or before `as_of`, ascending.
    fn get_index_history(
        &self,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<Vec<IndexBar>, ScreenerError>;
}

pub trait PriceHistoryProvider: Sync {
    /// Up to `lookback` bars ending at or before `as_of`, ascending.
    fn get_history(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<Vec<OhlcvBar>, ScreenerError>;
}

pub trait InstitutionalFlowProvider: Sync {
    /// Up to `lookback` daily records ending at or before `as_of`,
    /// most-recent-first.
    fn get_flow(
        &self,
        ticker: &str,
        as_of: NaiveDate,
        lookback: usize,
    ) -> Result<FlowHistory, ScreenerError>;
}

pub trait FundamentalProvider: Sync {
    fn get_latest(
        &self,
        ticker: &str,
        as_of: NaiveDate,
    ) -> Result<Option<FundamentalRecord>, ScreenerError>;
}

/// The four providers a scan reads from.
#[derive(Clone, Copy)]
pub struct Providers<'a> {
    pub market: &'a dyn MarketDataProvider,
    pub prices: &'a dyn PriceHistoryProvider,
    pub flows: &'a dyn InstitutionalFlowProvider,
    pub fundamentals: &'a dyn FundamentalProvider,
}

impl<'a> Providers<'a> {
    /// One value implementing every port, such as the CSV directory adapter.
    pub fn from_source<P>(source: &'a P) -> Self
    where
        P: MarketDataProvider + PriceHistoryProvider + InstitutionalFlowProvider + FundamentalProvider,
    {
        Self {
            market: source,
            prices: source,
            flows: source,
            fundamentals: source,
        }
    }
}
