//! N-day return.
//!
//! RETURN(n) = (C[t] - C[t-n]) / C[t-n], as a fraction. Needs n + 1 closes.
//! A zero base close is undefined.

use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::OhlcvBar;

pub fn n_day_return(bars: &[OhlcvBar], days: usize) -> Indicator {
    if days == 0 {
        return Indicator::Undefined;
    }
    Indicator::require(bars.len(), days + 1, || {
        let last = bars.len() - 1;
        let base = bars[last - days].close;
        if base == 0.0 {
            Indicator::Undefined
        } else {
            Indicator::finite((bars[last].close - base) / base)
        }
    })
}

/// Today's change versus the previous close.
pub fn daily_change(bars: &[OhlcvBar]) -> Indicator {
    n_day_return(bars, 1)
}
