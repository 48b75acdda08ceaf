//! Average True Range.
//!
//! With at least n + 1 bars: mean of the true range over the last n bars.
//! With fewer bars (but at least one): mean of high - low over the available
//! bars, capped at n. The reading records which method produced it.

use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::OhlcvBar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtrMethod {
    TrueRange,
    HighLowRange,
}

/// Volatility class by ATR as a percent of price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volatility {
    Lively,
    Normal,
    Sluggish,
}

impl Volatility {
    pub fn classify(atr_pct: f64) -> Self {
        if atr_pct > 2.5 {
            Volatility::Lively
        } else if atr_pct < 1.5 {
            Volatility::Sluggish
        } else {
            Volatility::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtrReading {
    pub value: f64,
    pub method: AtrMethod,
    /// ATR as a percent of the as-of close.
    pub pct_of_price: f64,
    pub volatility: Volatility,
}

pub fn atr(bars: &[OhlcvBar], period: usize) -> Indicator<AtrReading> {
    if period == 0 {
        return Indicator::Undefined;
    }

    Indicator::require(bars.len(), 1, || {
        let (value, method) = if bars.len() > period {
            let tail = &bars[bars.len() - period - 1..];
            let sum: f64 = tail
                .windows(2)
                .map(|w| w[1].true_range(w[0].close))
                .sum();
            (sum / period as f64, AtrMethod::TrueRange)
        } else {
            let take = bars.len().min(period);
            let tail = &bars[bars.len() - take..];
            let sum: f64 = tail.iter().map(OhlcvBar::range).sum();
            (sum / take as f64, AtrMethod::HighLowRange)
        };

        let close = bars[bars.len() - 1].close;
        if !value.is_finite() || close <= 0.0 {
            return Indicator::Undefined;
        }
        let pct_of_price = value / close * 100.0;

        Indicator::Computed(AtrReading {
            value,
            method,
            pct_of_price,
            volatility: Volatility::classify(pct_of_price),
        })
    })
}
