//! Whole-market circuit breaker.

use crate::domain::config::{InsufficientDataPolicy, ScreenerConfig};
use crate::domain::indicator::sma::sma_of;
use crate::domain::indicator::Indicator;
use crate::domain::market::{IndexBar, MarketSnapshot};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeStatus {
    Safe,
    Danger,
}

impl RegimeStatus {
    pub fn is_danger(&self) -> bool {
        matches!(self, RegimeStatus::Danger)
    }
}

impl fmt::Display for RegimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegimeStatus::Safe => f.write_str("SAFE"),
            RegimeStatus::Danger => f.write_str("DANGER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegimeReason {
    IndexBelowAverage { close: f64, average: f64 },
    LimitDownBreadth { count: u32, threshold: u32 },
    IndexHistoryInsufficient { have: usize, need: usize },
}

impl fmt::Display for RegimeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegimeReason::IndexBelowAverage { close, average } => {
                write!(f, "index {:.2} below its average {:.2}", close, average)
            }
            RegimeReason::LimitDownBreadth { count, threshold } => {
                write!(f, "{} limit-down stocks (threshold {})", count, threshold)
            }
            RegimeReason::IndexHistoryInsufficient { have, need } => {
                write!(f, "index history has {} closes, need {}", have, need)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeAssessment {
    pub date: NaiveDate,
    pub status: RegimeStatus,
    pub index_close: f64,
    pub index_average: Option<f64>,
    pub limit_down_count: u32,
    /// Every condition that fired. Empty when SAFE.
    pub reasons: Vec<RegimeReason>,
}

/// Classifies the market on the snapshot's date. `index_history` is
/// ascending; bars after the snapshot date are ignored.
pub fn assess(
    snapshot: &MarketSnapshot,
    index_history: &[IndexBar],
    config: &ScreenerConfig,
) -> RegimeAssessment {
    let closes: Vec<f64> = index_history
        .iter()
        .filter(|b| b.date <= snapshot.date)
        .map(|b| b.close)
        .collect();
    let average = sma_of(&closes, config.regime.index_ma_window);
    classify(
        snapshot.date,
        snapshot.index_close,
        average,
        snapshot.limit_down_count,
        config,
    )
}

pub fn classify(
    date: NaiveDate,
    index_close: f64,
    index_average: Indicator,
    limit_down_count: u32,
    config: &ScreenerConfig,
) -> RegimeAssessment {
    let mut reasons = Vec::new();

    match index_average {
        Indicator::Computed(average) => {
            if index_close < average {
                reasons.push(RegimeReason::IndexBelowAverage {
                    close: index_close,
                    average,
                });
            }
        }
        Indicator::Insufficient { have, need } => {
            if config.insufficient_data == InsufficientDataPolicy::Reject {
                reasons.push(RegimeReason::IndexHistoryInsufficient { have, need });
            }
        }
        Indicator::Undefined => {
            if config.insufficient_data == InsufficientDataPolicy::Reject {
                reasons.push(RegimeReason::IndexHistoryInsufficient {
                    have: 0,
                    need: config.regime.index_ma_window,
                });
            }
        }
    }

    let threshold = config.regime.limit_down_threshold;
    if limit_down_count > threshold {
        reasons.push(RegimeReason::LimitDownBreadth {
            count: limit_down_count,
            threshold,
        });
    }

    RegimeAssessment {
        date,
        status: if reasons.is_empty() {
            RegimeStatus::Safe
        } else {
            RegimeStatus::Danger
        },
        index_close,
        index_average: index_average.get(),
        limit_down_count,
        reasons,
    }
}
