//! Screening gates.
//!
//! Each stage is a pure function of a candidate's state returning a
//! [`GateVerdict`]. A stage either passes with a score contribution and
//! non-blocking annotations, or rejects with a reason. The pipeline applies the
//! stages in a fixed order and stops at the first rejection.

pub mod chips;
pub mod liquidity;
pub mod regime;
pub mod sizing;
pub mod trend;
pub mod valuation;

use crate::domain::config::{InsufficientDataPolicy, LiquidityMeasure};
use crate::domain::indicator::{Indicator, IndicatorType};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateVerdict {
    Pass {
        score: i32,
        annotations: Vec<Annotation>,
    },
    Reject(RejectReason),
}

impl GateVerdict {
    pub fn pass(score: i32) -> Self {
        GateVerdict::Pass {
            score,
            annotations: Vec::new(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, GateVerdict::Pass { .. })
    }
}

/// Stage that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Universe,
    Liquidity,
    Trend,
    Chips,
    Valuation,
    Sizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Universe => "universe",
            Stage::Liquidity => "liquidity",
            Stage::Trend => "trend",
            Stage::Chips => "chips",
            Stage::Valuation => "valuation",
            Stage::Sizing => "sizing",
        };
        f.write_str(name)
    }
}

/// Non-blocking observation attached to a passing candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    AbnormalVolumeSpike { ratio: f64 },
    KdGoldenCross { k: f64, d: f64 },
    /// Condition skipped because the indicator could not be computed.
    Unevaluated { indicator: IndicatorType },
    FundamentalsUnavailable,
    ValuationPenalty { ratio: f64, penalty: i32 },
    RevenueDeclinePenalty { yoy_pct: f64, penalty: i32 },
    RevenueGrowthBonus { yoy_pct: f64, bonus: i32 },
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::AbnormalVolumeSpike { ratio } => {
                write!(f, "abnormal volume spike ({:.1}x)", ratio)
            }
            Annotation::KdGoldenCross { k, d } => {
                write!(f, "KD golden cross (K {:.1} > D {:.1})", k, d)
            }
            Annotation::Unevaluated { indicator } => write!(f, "{} not evaluated", indicator),
            Annotation::FundamentalsUnavailable => f.write_str("fundamentals unavailable"),
            Annotation::ValuationPenalty { ratio, penalty } => {
                write!(f, "valuation {:.1} out of range (-{})", ratio, penalty)
            }
            Annotation::RevenueDeclinePenalty { yoy_pct, penalty } => {
                write!(f, "revenue {:+.1}% YoY (-{})", yoy_pct, penalty)
            }
            Annotation::RevenueGrowthBonus { yoy_pct, bonus } => {
                write!(f, "revenue {:+.1}% YoY (+{})", yoy_pct, bonus)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    ExcludedPrefix { prefix: String },
    PriceOutOfBand { price: f64, min: f64, max: f64 },
    BelowLiquidityFloor {
        measure: LiquidityMeasure,
        value: f64,
        floor: f64,
    },
    BelowMovingAverage { close: f64, average: f64 },
    Overheated { rsi: f64, ceiling: f64 },
    DailyChangeOutOfRange { change: f64, min: f64, max: f64 },
    RunUpTooLarge { run_up: f64, ceiling: f64 },
    NoVolumeExpansion { ratio: f64 },
    InsufficientData {
        indicator: IndicatorType,
        have: usize,
        need: usize,
    },
    UndefinedIndicator { indicator: IndicatorType },
    NoFlowData,
    WeakConsecutiveBuying { days: usize, min: usize },
    WeakFiveDayFlow { total: i64, floor: i64 },
    MonthlyDistribution { total: i64, floor: i64 },
    ValuationOutOfRange { ratio: f64, cap: f64 },
    RevenueDecline { yoy_pct: f64 },
    NonPositiveScore { score: i32 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::ExcludedPrefix { prefix } => write!(f, "excluded prefix {}", prefix),
            RejectReason::PriceOutOfBand { price, min, max } => {
                write!(f, "price {:.2} outside [{}, {}]", price, min, max)
            }
            RejectReason::BelowLiquidityFloor {
                measure,
                value,
                floor,
            } => write!(f, "{:?} {:.0} below floor {:.0}", measure, value, floor),
            RejectReason::BelowMovingAverage { close, average } => {
                write!(f, "close {:.2} not above MA {:.2}", close, average)
            }
            RejectReason::Overheated { rsi, ceiling } => {
                write!(f, "RSI {:.1} not below {}", rsi, ceiling)
            }
            RejectReason::DailyChangeOutOfRange { change, min, max } => write!(
                f,
                "daily change {:+.2}% outside [{:+.2}%, {:+.2}%]",
                change * 100.0,
                min * 100.0,
                max * 100.0
            ),
            RejectReason::RunUpTooLarge { run_up, ceiling } => write!(
                f,
                "run-up {:+.2}% not below {:.2}%",
                run_up * 100.0,
                ceiling * 100.0
            ),
            RejectReason::NoVolumeExpansion { ratio } => {
                write!(f, "volume {:.2}x below its average", ratio)
            }
            RejectReason::InsufficientData {
                indicator,
                have,
                need,
            } => write!(f, "{} needs {} bars, have {}", indicator, need, have),
            RejectReason::UndefinedIndicator { indicator } => write!(f, "{} undefined", indicator),
            RejectReason::NoFlowData => f.write_str("no institutional flow data"),
            RejectReason::WeakConsecutiveBuying { days, min } => {
                write!(f, "{} consecutive buy days, need {}", days, min)
            }
            RejectReason::WeakFiveDayFlow { total, floor } => {
                write!(f, "five-day flow {} below {}", total, floor)
            }
            RejectReason::MonthlyDistribution { total, floor } => {
                write!(f, "one-month flow {} below {}", total, floor)
            }
            RejectReason::ValuationOutOfRange { ratio, cap } => {
                write!(f, "valuation {:.1} outside (0, {}]", ratio, cap)
            }
            RejectReason::RevenueDecline { yoy_pct } => {
                write!(f, "revenue {:+.1}% YoY", yoy_pct)
            }
            RejectReason::NonPositiveScore { score } => write!(f, "score {} not positive", score),
        }
    }
}

/// Reads an indicator for a gate condition.
///
/// `Ok(Some(v))` when computed. Otherwise the policy decides: `Reject` yields
/// the reason naming the indicator, `Ignore` annotates the skipped condition
/// and yields `Ok(None)`.
pub(crate) fn resolve<T: Copy>(
    indicator: &Indicator<T>,
    kind: IndicatorType,
    policy: InsufficientDataPolicy,
    annotations: &mut Vec<Annotation>,
) -> Result<Option<T>, RejectReason> {
    let reason = match indicator {
        Indicator::Computed(v) => return Ok(Some(*v)),
        Indicator::Insufficient { have, need } => RejectReason::InsufficientData {
            indicator: kind,
            have: *have,
            need: *need,
        },
        Indicator::Undefined => RejectReason::UndefinedIndicator { indicator: kind },
    };
    match policy {
        InsufficientDataPolicy::Reject => Err(reason),
        InsufficientDataPolicy::Ignore => {
            annotations.push(Annotation::Unevaluated { indicator: kind });
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_computed_value() {
        let mut notes = Vec::new();
        let got = resolve(
            &Indicator::Computed(4.0),
            IndicatorType::Sma(20),
            InsufficientDataPolicy::Reject,
            &mut notes,
        );
        assert_eq!(got, Ok(Some(4.0)));
        assert!(notes.is_empty());
    }

    #[test]
    fn resolve_insufficient_under_reject_names_indicator() {
        let mut notes = Vec::new();
        let got = resolve::<f64>(
            &Indicator::Insufficient { have: 10, need: 15 },
            IndicatorType::Rsi(14),
            InsufficientDataPolicy::Reject,
            &mut notes,
        );
        assert_eq!(
            got,
            Err(RejectReason::InsufficientData {
                indicator: IndicatorType::Rsi(14),
                have: 10,
                need: 15
            })
        );
    }

    #[test]
    fn resolve_insufficient_under_ignore_annotates() {
        let mut notes = Vec::new();
        let got = resolve::<f64>(
            &Indicator::Undefined,
            IndicatorType::VolumeRatio(5),
            InsufficientDataPolicy::Ignore,
            &mut notes,
        );
        assert_eq!(got, Ok(None));
        assert_eq!(
            notes,
            vec![Annotation::Unevaluated {
                indicator: IndicatorType::VolumeRatio(5)
            }]
        );
    }

    #[test]
    fn reject_reason_display() {
        let reason = RejectReason::WeakConsecutiveBuying { days: 1, min: 2 };
        assert_eq!(reason.to_string(), "1 consecutive buy days, need 2");
    }
}
