//! Volume ratio: today's volume over the mean of the previous n days' volume.
//!
//! VOLRATIO(n) = V[t] / mean(V[t-1..t-n]). Needs n + 1 bars.

use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::OhlcvBar;

/// Mean volume of the `days` bars before the as-of bar.
pub fn prior_average_volume(bars: &[OhlcvBar], days: usize) -> Indicator {
    if days == 0 {
        return Indicator::Undefined;
    }
    Indicator::require(bars.len(), days + 1, || {
        let last = bars.len() - 1;
        let window = &bars[last - days..last];
        Indicator::finite(window.iter().map(|b| b.volume as f64).sum::<f64>() / days as f64)
    })
}

pub fn volume_ratio(bars: &[OhlcvBar], days: usize) -> Indicator {
    match prior_average_volume(bars, days) {
        Indicator::Computed(avg) if avg > 0.0 => {
            let today = bars[bars.len() - 1].volume as f64;
            Indicator::finite(today / avg)
        }
        Indicator::Computed(_) => Indicator::Undefined,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(volumes: &[i64]) -> Vec<OhlcvBar> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| OhlcvBar {
                ticker: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume,
                turnover: volume as f64 * 10.0,
            })
            .collect()
    }

    #[test]
    fn ratio_against_previous_five_days() {
        let bars = make_bars(&[9999, 100, 200, 300, 400, 500, 900]);
        // mean of 100..500 = 300
        let r = volume_ratio(&bars, 5).get().unwrap();
        assert!((r - 3.0).abs() < 1e-12);
    }

    #[test]
    fn ratio_needs_six_bars() {
        let bars = make_bars(&[100, 200, 300, 400, 500]);
        assert_eq!(
            volume_ratio(&bars, 5),
            Indicator::Insufficient { have: 5, need: 6 }
        );
    }

    #[test]
    fn zero_average_is_undefined() {
        let bars = make_bars(&[0, 0, 0, 0, 0, 100]);
        assert_eq!(volume_ratio(&bars, 5), Indicator::Undefined);
    }
}
