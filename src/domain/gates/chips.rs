//! Institutional order-flow consensus.
//!
//! Works on a [`FlowHistory`], which is most-recent-first: the leading record
//! is the as-of day.

use crate::domain::config::ChipsConfig;
use crate::domain::flow::FlowHistory;
use crate::domain::gates::{GateVerdict, RejectReason};
use serde::{Deserialize, Serialize};

const FIVE_DAYS: usize = 5;
const LEADER_RATIO: f64 = 1.5;

/// Which participant category dominates recent buying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leader {
    Foreign,
    DomesticFunds,
    Both,
    Neither,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipsSummary {
    pub consecutive_buy_days: usize,
    pub five_day_cumulative: i64,
    pub one_month_cumulative: i64,
    pub foreign_five_day: i64,
    pub trust_five_day: i64,
    pub leader: Leader,
    pub observations: usize,
}

pub fn summarize(history: &FlowHistory) -> ChipsSummary {
    let records = history.records();

    let consecutive_buy_days = records.iter().take_while(|r| r.net() > 0).count();
    let recent = &records[..records.len().min(FIVE_DAYS)];
    let five_day_cumulative = recent.iter().map(|r| r.net()).sum();
    let one_month_cumulative = records.iter().map(|r| r.net()).sum();
    let foreign_five_day: i64 = recent.iter().map(|r| r.foreign).sum();
    let trust_five_day: i64 = recent.iter().map(|r| r.trust).sum();

    ChipsSummary {
        consecutive_buy_days,
        five_day_cumulative,
        one_month_cumulative,
        foreign_five_day,
        trust_five_day,
        leader: leader(foreign_five_day, trust_five_day),
        observations: records.len(),
    }
}

fn leader(foreign: i64, trust: i64) -> Leader {
    if foreign <= 0 && trust <= 0 {
        return Leader::Neither;
    }
    let (f, t) = (foreign as f64, trust as f64);
    if t > LEADER_RATIO * f {
        Leader::DomesticFunds
    } else if f > LEADER_RATIO * t {
        Leader::Foreign
    } else {
        Leader::Both
    }
}

pub fn evaluate(summary: &ChipsSummary, config: &ChipsConfig) -> GateVerdict {
    if summary.observations == 0 {
        return GateVerdict::Reject(RejectReason::NoFlowData);
    }
    if summary.consecutive_buy_days < config.min_consecutive_days {
        return GateVerdict::Reject(RejectReason::WeakConsecutiveBuying {
            days: summary.consecutive_buy_days,
            min: config.min_consecutive_days,
        });
    }
    if summary.five_day_cumulative < config.five_day_floor {
        return GateVerdict::Reject(RejectReason::WeakFiveDayFlow {
            total: summary.five_day_cumulative,
            floor: config.five_day_floor,
        });
    }
    if summary.one_month_cumulative < config.month_floor {
        return GateVerdict::Reject(RejectReason::MonthlyDistribution {
            total: summary.one_month_cumulative,
            floor: config.month_floor,
        });
    }

    let mut score = 0;
    if summary.five_day_cumulative > 0 {
        score += config.positive_flow_bonus;
    }
    if summary.consecutive_buy_days >= config.persistence_days {
        score += config.persistence_bonus;
    }
    if let Some(tier) = config
        .magnitude_tiers
        .iter()
        .find(|tier| summary.five_day_cumulative > tier.above)
    {
        score += tier.bonus;
    }

    GateVerdict::pass(score)
}
