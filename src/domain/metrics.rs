//! Forward-return statistics per horizon.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonStats {
    /// Trading days after the decision.
    pub horizon: usize,
    pub valid_count: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_return: f64,
    pub best: Option<f64>,
    pub worst: Option<f64>,
}

impl HorizonStats {
    /// `returns` are fractions; a win is a strictly positive return.
    pub fn compute(horizon: usize, returns: &[f64]) -> Self {
        let mut wins = 0usize;
        let mut total = 0.0_f64;
        let mut best: Option<f64> = None;
        let mut worst: Option<f64> = None;

        for &r in returns {
            if r > 0.0 {
                wins += 1;
            }
            total += r;
            best = Some(best.map_or(r, |b| b.max(r)));
            worst = Some(worst.map_or(r, |w| w.min(r)));
        }

        let valid_count = returns.len();
        let (win_rate, avg_return) = if valid_count > 0 {
            (wins as f64 / valid_count as f64, total / valid_count as f64)
        } else {
            (0.0, 0.0)
        };

        HorizonStats {
            horizon,
            valid_count,
            wins,
            win_rate,
            avg_return,
            best,
            worst,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stats_over_mixed_returns() {
        let stats = HorizonStats::compute(5, &[0.10, -0.05, 0.02, 0.0]);
        assert_eq!(stats.valid_count, 4);
        assert_eq!(stats.wins, 2);
        assert_relative_eq!(stats.win_rate, 0.5);
        assert_relative_eq!(stats.avg_return, 0.0175, epsilon = 1e-12);
        assert_eq!(stats.best, Some(0.10));
        assert_eq!(stats.worst, Some(-0.05));
    }

    #[test]
    fn zero_return_is_not_a_win() {
        let stats = HorizonStats::compute(10, &[0.0, 0.0]);
        assert_eq!(stats.wins, 0);
        assert_relative_eq!(stats.win_rate, 0.0);
    }

    #[test]
    fn empty_horizon() {
        let stats = HorizonStats::compute(10, &[]);
        assert_eq!(stats.valid_count, 0);
        assert_eq!(stats.best, None);
        assert_relative_eq!(stats.avg_return, 0.0);
    }
}
