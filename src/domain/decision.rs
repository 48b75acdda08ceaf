//! Ranked, risk-annotated scan output.

use crate::domain::candidate::Candidate;
use crate::domain::config::RiskConfig;
use crate::domain::gates::chips::Leader;
use crate::domain::gates::sizing::Allocation;
use crate::domain::gates::Annotation;
use crate::domain::indicator::atr::{AtrReading, Volatility};
use crate::domain::indicator::Indicator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stop and target prices derived from the ATR channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
    pub stretch_target: Option<f64>,
    pub atr: Option<f64>,
    pub volatility: Option<Volatility>,
}

impl RiskLevels {
    /// The stop never sits further below the close than the hard floor. With
    /// no ATR only the floor stop is set.
    pub fn from_atr(close: f64, atr: &Indicator<AtrReading>, config: &RiskConfig) -> Self {
        let floor = close * (1.0 - config.hard_stop_pct);
        match atr.value() {
            Some(reading) => Self {
                stop_loss: (close - config.stop_atr_multiple * reading.value).max(floor),
                take_profit: Some(close + config.take_profit_atr_multiple * reading.value),
                stretch_target: Some(close + config.stretch_atr_multiple * reading.value),
                atr: Some(reading.value),
                volatility: Some(reading.volatility),
            },
            None => Self {
                stop_loss: floor,
                take_profit: None,
                stretch_target: None,
                atr: None,
                volatility: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
    pub score: i32,
    pub allocation: Allocation,
    pub risk: RiskLevels,
    pub five_day_cumulative: i64,
    pub consecutive_buy_days: usize,
    pub leader: Leader,
    pub rsi: Option<f64>,
    pub bias: Option<f64>,
    pub annotations: Vec<Annotation>,
}

impl Decision {
    pub fn from_candidate(candidate: Candidate, allocation: Allocation, config: &RiskConfig) -> Self {
        let ind = &candidate.indicators;
        let risk = RiskLevels::from_atr(ind.close, &ind.atr, config);
        let (five_day_cumulative, consecutive_buy_days, leader) = candidate
            .chips
            .as_ref()
            .map(|c| (c.five_day_cumulative, c.consecutive_buy_days, c.leader))
            .unwrap_or((0, 0, Leader::Neither));

        Self {
            date: candidate.date,
            close: ind.close,
            score: candidate.score,
            allocation,
            risk,
            five_day_cumulative,
            consecutive_buy_days,
            leader,
            rsi: ind.rsi.get(),
            bias: ind.bias.get(),
            ticker: candidate.ticker,
            annotations: candidate.annotations,
        }
    }
}
