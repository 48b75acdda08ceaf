//! Per-scan candidate state.

use crate::domain::config::ScreenerConfig;
use crate::domain::flow::FundamentalRecord;
use crate::domain::gates::chips::ChipsSummary;
use crate::domain::gates::{Annotation, GateVerdict, RejectReason};
use crate::domain::indicator::atr::{atr, AtrReading};
use crate::domain::indicator::roc::{daily_change, n_day_return};
use crate::domain::indicator::rsi::rsi;
use crate::domain::indicator::sma::{bias, sma};
use crate::domain::indicator::stochastic::{stochastic, StochasticReading};
use crate::domain::indicator::volume::volume_ratio;
use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

/// Every indicator the gates read, computed once from the candidate's history.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub close: f64,
    pub volume: i64,
    pub turnover: f64,
    pub ma: Indicator,
    pub bias: Indicator,
    pub rsi: Indicator,
    pub daily_change: Indicator,
    pub run_up: Indicator,
    pub volume_ratio: Indicator,
    pub kd: Indicator<StochasticReading>,
    pub atr: Indicator<AtrReading>,
}

impl IndicatorSet {
    /// `bars` must be ascending and end with the as-of bar `quote`.
    pub fn compute(quote: &OhlcvBar, bars: &[OhlcvBar], config: &ScreenerConfig) -> Self {
        let trend = &config.trend;
        let ma = sma(bars, trend.ma_window);
        Self {
            close: quote.close,
            volume: quote.volume,
            turnover: quote.turnover,
            bias: bias(quote.close, ma),
            ma,
            rsi: rsi(bars, trend.rsi_period),
            daily_change: daily_change(bars),
            run_up: n_day_return(bars, trend.run_up_days),
            volume_ratio: volume_ratio(bars, config.liquidity.spike_lookback),
            kd: stochastic(bars, trend.kd_period),
            atr: atr(bars, config.risk.atr_period),
        }
    }
}

/// A ticker moving through the gates on one scan date.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub ticker: String,
    pub date: NaiveDate,
    pub indicators: IndicatorSet,
    pub score: i32,
    pub annotations: Vec<Annotation>,
    pub chips: Option<ChipsSummary>,
    pub fundamentals: Option<FundamentalRecord>,
}

impl Candidate {
    pub fn new(ticker: impl Into<String>, date: NaiveDate, indicators: IndicatorSet) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            indicators,
            score: 0,
            annotations: Vec::new(),
            chips: None,
            fundamentals: None,
        }
    }

    /// Folds a stage verdict into the running score.
    pub fn apply(&mut self, verdict: GateVerdict) -> Result<(), RejectReason> {
        match verdict {
            GateVerdict::Pass { score, annotations } => {
                self.score += score;
                self.annotations.extend(annotations);
                Ok(())
            }
            GateVerdict::Reject(reason) => Err(reason),
        }
    }
}
