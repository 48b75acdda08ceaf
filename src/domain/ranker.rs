//! Orders surviving decisions and keeps the best `top_n`.

use crate::domain::decision::Decision;
use std::cmp::Ordering;

/// Score descending, then five-day institutional cumulative descending, then
/// ticker ascending.
pub fn compare(a: &Decision, b: &Decision) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.five_day_cumulative.cmp(&a.five_day_cumulative))
        .then_with(|| a.ticker.cmp(&b.ticker))
}

pub fn rank(mut decisions: Vec<Decision>, top_n: usize) -> Vec<Decision> {
    decisions.sort_by(compare);
    decisions.truncate(top_n);
    decisions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::RiskLevels;
    use crate::domain::gates::chips::Leader;
    use crate::domain::gates::sizing::{Allocation, AllocationTier};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn decision(ticker: &str, score: i32, five_day: i64) -> Decision {
        Decision {
            date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            ticker: ticker.into(),
            close: 100.0,
            score,
            allocation: Allocation {
                tier: AllocationTier::Medium,
                fraction: 0.08,
            },
            risk: RiskLevels {
                stop_loss: 93.0,
                take_profit: None,
                stretch_target: None,
                atr: None,
                volatility: None,
            },
            five_day_cumulative: five_day,
            consecutive_buy_days: 2,
            leader: Leader::Both,
            rsi: None,
            bias: None,
            annotations: Vec::new(),
        }
    }

    fn tickers(decisions: &[Decision]) -> Vec<&str> {
        decisions.iter().map(|d| d.ticker.as_str()).collect()
    }

    #[test]
    fn sorts_by_score_then_flow_then_ticker() {
        let ranked = rank(
            vec![
                decision("3008", 3, 500),
                decision("2330", 5, 100),
                decision("2454", 3, 900),
                decision("1101", 3, 500),
            ],
            10,
        );
        assert_eq!(tickers(&ranked), vec!["2330", "2454", "1101", "3008"]);
    }

    #[test]
    fn truncates_to_top_n() {
        let all: Vec<Decision> = (0..10).map(|i| decision(&format!("{}", 1000 + i), i, 0)).collect();
        let ranked = rank(all, 6);
        assert_eq!(ranked.len(), 6);
        assert_eq!(ranked[0].score, 9);
        assert_eq!(ranked[5].score, 4);
    }

    proptest! {
        #[test]
        fn ranked_output_is_bounded_and_ordered(
            entries in prop::collection::vec((0i32..8, -2000i64..2000), 0..30),
            top_n in 1usize..12,
        ) {
            let decisions: Vec<Decision> = entries
                .iter()
                .enumerate()
                .map(|(i, &(score, flow))| decision(&format!("T{:03}", i), score, flow))
                .collect();
            let ranked = rank(decisions, top_n);
            prop_assert!(ranked.len() <= top_n);
            for pair in ranked.windows(2) {
                prop_assert_ne!(compare(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }
}
