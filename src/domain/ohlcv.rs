//! Daily bar representation.
//!
//! Price histories are ordered ascending by date everywhere in the crate:
//! `bars[0]` is the oldest bar and `bars.last()` is the as-of day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub turnover: f64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Drops every bar dated after `as_of` and restores ascending order.
///
/// Returns the number of bars removed so callers can report a leaky provider.
pub fn clip_to_as_of(bars: &mut Vec<OhlcvBar>, as_of: NaiveDate) -> usize {
    let before = bars.len();
    bars.retain(|b| b.date <= as_of);
    bars.sort_by_key(|b| b.date);
    before - bars.len()
}

/// Close prices in history order.
pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
