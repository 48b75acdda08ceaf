//! Optional fundamental filter.

use crate::domain::config::{ValuationConfig, ValuationMode};
use crate::domain::flow::FundamentalRecord;
use crate::domain::gates::{Annotation, GateVerdict, RejectReason};

pub fn evaluate(record: Option<&FundamentalRecord>, config: &ValuationConfig) -> GateVerdict {
    if !config.enabled {
        return GateVerdict::pass(0);
    }
    let Some(record) = record else {
        return GateVerdict::Pass {
            score: 0,
            annotations: vec![Annotation::FundamentalsUnavailable],
        };
    };

    let mut score = 0;
    let mut annotations = Vec::new();

    if let Some(ratio) = record.valuation_ratio {
        if ratio <= 0.0 || ratio > config.valuation_cap {
            match config.mode {
                ValuationMode::Strict => {
                    return GateVerdict::Reject(RejectReason::ValuationOutOfRange {
                        ratio,
                        cap: config.valuation_cap,
                    });
                }
                ValuationMode::Loose => {
                    score -= config.penalty;
                    annotations.push(Annotation::ValuationPenalty {
                        ratio,
                        penalty: config.penalty,
                    });
                }
            }
        }
    }

    if let Some(yoy_pct) = record.revenue_yoy_pct {
        if yoy_pct <= 0.0 {
            match config.mode {
                ValuationMode::Strict => {
                    return GateVerdict::Reject(RejectReason::RevenueDecline { yoy_pct });
                }
                ValuationMode::Loose => {
                    score -= config.penalty;
                    annotations.push(Annotation::RevenueDeclinePenalty {
                        yoy_pct,
                        penalty: config.penalty,
                    });
                }
            }
        } else if config.growth_bonus > 0 {
            score += config.growth_bonus;
            annotations.push(Annotation::RevenueGrowthBonus {
                yoy_pct,
                bonus: config.growth_bonus,
            });
        }
    }

    GateVerdict::Pass { score, annotations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(ratio: Option<f64>, yoy: Option<f64>) -> FundamentalRecord {
        FundamentalRecord {
            as_of: NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            valuation_ratio: ratio,
            revenue_yoy_pct: yoy,
        }
    }

    fn strict() -> ValuationConfig {
        ValuationConfig {
            enabled: true,
            mode: ValuationMode::Strict,
            valuation_cap: 35.0,
            penalty: 1,
            growth_bonus: 0,
        }
    }

    fn loose() -> ValuationConfig {
        ValuationConfig {
            mode: ValuationMode::Loose,
            growth_bonus: 1,
            ..strict()
        }
    }

    #[test]
    fn missing_record_passes_with_annotation() {
        assert_eq!(
            evaluate(None, &strict()),
            GateVerdict::Pass {
                score: 0,
                annotations: vec![Annotation::FundamentalsUnavailable]
            }
        );
    }

    #[test]
    fn strict_rejects_expensive_and_negative_ratios() {
        assert!(!evaluate(Some(&record(Some(40.0), None)), &strict()).is_pass());
        assert!(!evaluate(Some(&record(Some(-3.0), None)), &strict()).is_pass());
        assert!(evaluate(Some(&record(Some(35.0), None)), &strict()).is_pass());
    }

    #[test]
    fn strict_rejects_revenue_decline() {
        assert_eq!(
            evaluate(Some(&record(Some(12.0), Some(-4.0))), &strict()),
            GateVerdict::Reject(RejectReason::RevenueDecline { yoy_pct: -4.0 })
        );
    }

    #[test]
    fn loose_penalises_instead_of_rejecting() {
        let verdict = evaluate(Some(&record(Some(50.0), Some(0.0))), &loose());
        match verdict {
            GateVerdict::Pass { score, annotations } => {
                assert_eq!(score, -2);
                assert_eq!(annotations.len(), 2);
            }
            other => panic!("expected pass, got {:?}", other),
        }
    }

    #[test]
    fn growth_bonus_when_configured() {
        assert_eq!(
            evaluate(Some(&record(Some(15.0), Some(22.0))), &loose()),
            GateVerdict::Pass {
                score: 1,
                annotations: vec![Annotation::RevenueGrowthBonus {
                    yoy_pct: 22.0,
                    bonus: 1
                }]
            }
        );
        assert_eq!(
            evaluate(Some(&record(Some(15.0), Some(22.0))), &strict()),
            GateVerdict::pass(0)
        );
    }

    #[test]
    fn disabled_gate_always_passes() {
        let config = ValuationConfig {
            enabled: false,
            ..strict()
        };
        assert_eq!(
            evaluate(Some(&record(Some(99.0), Some(-10.0))), &config),
            GateVerdict::pass(0)
        );
    }
}
