//! Stochastic oscillator %K/%D with 2/3, 1/3 smoothing.
//!
//! RSV(t) = (C(t) - LL(n)) / (HH(n) - LL(n)) * 100, 0 when HH == LL
//! K(t)   = 2/3 * K(t-1) + 1/3 * RSV(t)
//! D(t)   = 2/3 * D(t-1) + 1/3 * K(t)
//!
//! K and D are seeded at 50 before the first day with a full n-bar window. Only
//! the trailing n + 10 bars feed the recursion, so the reading depends on recent
//! history alone. Needs n + 1 bars.

use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::OhlcvBar;
use serde::{Deserialize, Serialize};

const SEED: f64 = 50.0;
const EXTRA_BARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticReading {
    pub k: f64,
    pub d: f64,
    pub k_prev: f64,
    pub d_prev: f64,
}

impl StochasticReading {
    /// K crossed above D on the as-of day.
    pub fn golden_cross(&self) -> bool {
        self.k_prev <= self.d_prev && self.k > self.d
    }
}

pub fn stochastic(bars: &[OhlcvBar], period: usize) -> Indicator<StochasticReading> {
    if period == 0 {
        return Indicator::Undefined;
    }

    Indicator::require(bars.len(), period + 1, || {
        let start = bars.len().saturating_sub(period + EXTRA_BARS);
        let recent = &bars[start..];

        let mut k = SEED;
        let mut d = SEED;
        let mut k_prev = SEED;
        let mut d_prev = SEED;

        for end in period..=recent.len() {
            let window = &recent[end - period..end];
            let close = window[window.len() - 1].close;
            let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

            let rsv = if highest == lowest {
                0.0
            } else {
                (close - lowest) / (highest - lowest) * 100.0
            };

            k_prev = k;
            d_prev = d;
            k = (2.0 / 3.0) * k_prev + (1.0 / 3.0) * rsv;
            d = (2.0 / 3.0) * d_prev + (1.0 / 3.0) * k;
        }

        Indicator::Computed(StochasticReading { k, d, k_prev, d_prev })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            ticker: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
            turnover: close * 1000.0,
        }
    }

    #[test]
    fn insufficient_below_period_plus_one() {
        let bars: Vec<OhlcvBar> = (1..=9).map(|d| make_bar(d, 11.0, 9.0, 10.0)).collect();
        assert_eq!(
            stochastic(&bars, 9),
            Indicator::Insufficient { have: 9, need: 10 }
        );
    }

    #[test]
    fn first_two_computable_days_from_seed() {
        // period 2, 3 bars → two windows
        let bars = vec![
            make_bar(1, 10.0, 8.0, 9.0),
            make_bar(2, 12.0, 9.0, 12.0),
            make_bar(3, 12.0, 10.0, 10.0),
        ];
        let reading = *stochastic(&bars, 2).value().unwrap();

        // window [1,2]: LL 8, HH 12, close 12 → RSV 100
        let k1 = 2.0 / 3.0 * 50.0 + 100.0 / 3.0;
        let d1 = 2.0 / 3.0 * 50.0 + k1 / 3.0;
        // window [2,3]: LL 9, HH 12, close 10 → RSV 33.33
        let rsv2 = (10.0 - 9.0) / (12.0 - 9.0) * 100.0;
        let k2 = 2.0 / 3.0 * k1 + rsv2 / 3.0;
        let d2 = 2.0 / 3.0 * d1 + k2 / 3.0;

        assert!((reading.k_prev - k1).abs() < 1e-9);
        assert!((reading.d_prev - d1).abs() < 1e-9);
        assert!((reading.k - k2).abs() < 1e-9);
        assert!((reading.d - d2).abs() < 1e-9);
    }

    #[test]
    fn flat_range_uses_zero_rsv() {
        let bars: Vec<OhlcvBar> = (1..=10).map(|d| make_bar(d, 10.0, 10.0, 10.0)).collect();
        let reading = *stochastic(&bars, 9).value().unwrap();
        // two windows of RSV 0
        let k1 = 2.0 / 3.0 * 50.0;
        let k2 = 2.0 / 3.0 * k1;
        assert!((reading.k - k2).abs() < 1e-9);
        assert!(reading.k < 50.0);
    }

    #[test]
    fn values_stay_in_range() {
        let bars: Vec<OhlcvBar> = (1..=28)
            .map(|d| {
                let c = 100.0 + ((d * 7) % 11) as f64;
                make_bar(d, c + 2.0, c - 2.0, c)
            })
            .collect();
        let reading = *stochastic(&bars, 9).value().unwrap();
        for v in [reading.k, reading.d, reading.k_prev, reading.d_prev] {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn golden_cross_detection() {
        let reading = StochasticReading {
            k: 30.0,
            d: 25.0,
            k_prev: 20.0,
            d_prev: 24.0,
        };
        assert!(reading.golden_cross());
        let flat = StochasticReading {
            k_prev: 30.0,
            d_prev: 25.0,
            ..reading
        };
        assert!(!flat.golden_cross());
    }
}
