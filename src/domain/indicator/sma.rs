//! Simple moving average and bias (deviation from the average).
//!
//! SMA(n) = mean of the most recent n closes. Needs n observations.

use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::{closes, OhlcvBar};

pub fn sma(bars: &[OhlcvBar], window: usize) -> Indicator {
    sma_of(&closes(bars), window)
}

/// SMA over a raw ascending value series (used for the market index).
pub fn sma_of(values: &[f64], window: usize) -> Indicator {
    if window == 0 {
        return Indicator::Undefined;
    }
    Indicator::require(values.len(), window, || {
        let tail = &values[values.len() - window..];
        Indicator::finite(tail.iter().sum::<f64>() / window as f64)
    })
}

/// (price - ma) / ma as a fraction.
pub fn bias(price: f64, ma: Indicator) -> Indicator {
    match ma {
        Indicator::Computed(m) if m != 0.0 => Indicator::finite((price - m) / m),
        Indicator::Computed(_) => Indicator::Undefined,
        other => other,
    }
}
