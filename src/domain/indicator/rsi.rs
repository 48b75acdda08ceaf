//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Needs n + 1 closes (n price changes). Shorter histories are reported as
//! insufficient rather than a neutral 50.

use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::OhlcvBar;

pub fn rsi(bars: &[OhlcvBar], period: usize) -> Indicator {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    rsi_of(&closes, period)
}

pub fn rsi_of(closes: &[f64], period: usize) -> Indicator {
    if period == 0 {
        return Indicator::Undefined;
    }

    Indicator::require(closes.len(), period + 1, || {
        let mut gains: Vec<f64> = Vec::with_capacity(closes.len() - 1);
        let mut losses: Vec<f64> = Vec::with_capacity(closes.len() - 1);

        for w in closes.windows(2) {
            let change = w[1] - w[0];
            gains.push(if change > 0.0 { change } else { 0.0 });
            losses.push(if change < 0.0 { -change } else { 0.0 });
        }

        let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
        let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

        for i in period..gains.len() {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        }

        let value = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };
        Indicator::finite(value)
    })
}
