//! Technical indicator implementations.
//!
//! Every function takes an ascending bar slice and reports the value as of the
//! last bar. Results are an [`Indicator`]: either a computed value, an explicit
//! insufficient-data marker carrying how many observations were available and
//! needed, or `Undefined` when the inputs are present but the formula divides by
//! zero. No function substitutes a neutral default for missing history.

pub mod atr;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volume;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Indicator<T = f64> {
    Computed(T),
    Insufficient { have: usize, need: usize },
    Undefined,
}

impl<T> Indicator<T> {
    /// Runs `compute` only when `have >= need`.
    pub fn require(have: usize, need: usize, compute: impl FnOnce() -> Indicator<T>) -> Self {
        if have < need {
            Indicator::Insufficient { have, need }
        } else {
            compute()
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Indicator::Computed(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Indicator::Computed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Indicator<U> {
        match self {
            Indicator::Computed(v) => Indicator::Computed(f(v)),
            Indicator::Insufficient { have, need } => Indicator::Insufficient { have, need },
            Indicator::Undefined => Indicator::Undefined,
        }
    }
}

impl Indicator<f64> {
    /// Computed only for a finite value, `Undefined` otherwise.
    pub fn finite(value: f64) -> Self {
        if value.is_finite() {
            Indicator::Computed(value)
        } else {
            Indicator::Undefined
        }
    }

    pub fn get(&self) -> Option<f64> {
        self.value().copied()
    }
}

/// Indicator identity and parameters, used to name the indicator a gate could
/// not evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Stochastic(usize),
    Atr(usize),
    Return(usize),
    VolumeRatio(usize),
    IndexSma(usize),
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Stochastic(period) => write!(f, "KD({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Return(days) => write!(f, "RETURN({})", days),
            IndicatorType::VolumeRatio(days) => write!(f, "VOLRATIO({})", days),
            IndicatorType::IndexSma(period) => write!(f, "INDEX_SMA({})", period),
        }
    }
}
