//! Technical trend filter with momentum bonuses.
//!
//! Conditions, in order: close above its moving average, RSI below the
//! overheat ceiling, daily change inside the configured band, N-day run-up
//! below its ceiling, and optionally volume at or above its recent average.

use crate::domain::candidate::IndicatorSet;
use crate::domain::config::{InsufficientDataPolicy, ScreenerConfig};
use crate::domain::gates::{resolve, Annotation, GateVerdict, RejectReason};
use crate::domain::indicator::IndicatorType;

pub fn evaluate(indicators: &IndicatorSet, config: &ScreenerConfig) -> GateVerdict {
    match check(indicators, config, config.insufficient_data) {
        Ok(verdict) => verdict,
        Err(reason) => GateVerdict::Reject(reason),
    }
}

fn check(
    ind: &IndicatorSet,
    config: &ScreenerConfig,
    policy: InsufficientDataPolicy,
) -> Result<GateVerdict, RejectReason> {
    let t = &config.trend;
    let mut annotations = Vec::new();

    if let Some(average) = resolve(&ind.ma, IndicatorType::Sma(t.ma_window), policy, &mut annotations)? {
        if ind.close <= average {
            return Err(RejectReason::BelowMovingAverage {
                close: ind.close,
                average,
            });
        }
    }

    if let Some(rsi) = resolve(&ind.rsi, IndicatorType::Rsi(t.rsi_period), policy, &mut annotations)? {
        if rsi >= t.rsi_ceiling {
            return Err(RejectReason::Overheated {
                rsi,
                ceiling: t.rsi_ceiling,
            });
        }
    }

    let change = resolve(&ind.daily_change, IndicatorType::Return(1), policy, &mut annotations)?;
    if let Some(change) = change {
        if change < t.change_min || change > t.change_max {
            return Err(RejectReason::DailyChangeOutOfRange {
                change,
                min: t.change_min,
                max: t.change_max,
            });
        }
    }

    if let Some(run_up) = resolve(
        &ind.run_up,
        IndicatorType::Return(t.run_up_days),
        policy,
        &mut annotations,
    )? {
        if run_up >= t.run_up_ceiling {
            return Err(RejectReason::RunUpTooLarge {
                run_up,
                ceiling: t.run_up_ceiling,
            });
        }
    }

    let ratio_kind = IndicatorType::VolumeRatio(config.liquidity.spike_lookback);
    let ratio = if t.require_volume_expansion {
        let ratio = resolve(&ind.volume_ratio, ratio_kind, policy, &mut annotations)?;
        if let Some(ratio) = ratio {
            if ratio < 1.0 {
                return Err(RejectReason::NoVolumeExpansion { ratio });
            }
        }
        ratio
    } else {
        ind.volume_ratio.get()
    };

    let mut score = 0;
    if ratio.is_some_and(|r| r > 1.0) {
        score += t.volume_bonus;
    }
    if change.is_some_and(|c| c > 0.0 && c <= t.fresh_breakout_ceiling) {
        score += t.fresh_breakout_bonus;
    }
    if ind.bias.get().is_some_and(|b| b < t.safe_bias_ceiling) {
        score += t.safe_bias_bonus;
    }

    if let Some(kd) = ind.kd.value() {
        if kd.golden_cross() {
            annotations.push(Annotation::KdGoldenCross { k: kd.k, d: kd.d });
        }
    }

    Ok(GateVerdict::Pass { score, annotations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::stochastic::StochasticReading;
    use crate::domain::indicator::Indicator;

    fn healthy() -> IndicatorSet {
        IndicatorSet {
            close: 105.0,
            volume: 2_000,
            turnover: 210_000_000.0,
            ma: Indicator::Computed(100.0),
            bias: Indicator::Computed(0.05),
            rsi: Indicator::Computed(62.0),
            daily_change: Indicator::Computed(0.02),
            run_up: Indicator::Computed(0.04),
            volume_ratio: Indicator::Computed(1.6),
            kd: Indicator::Computed(StochasticReading {
                k: 55.0,
                d: 50.0,
                k_prev: 48.0,
                d_prev: 49.0,
            }),
            atr: Indicator::Undefined,
        }
    }

    #[test]
    fn healthy_candidate_earns_every_bonus() {
        let verdict = evaluate(&healthy(), &ScreenerConfig::default());
        assert_eq!(
            verdict,
            GateVerdict::Pass {
                score: 3,
                annotations: vec![Annotation::KdGoldenCross { k: 55.0, d: 50.0 }]
            }
        );
    }

    #[test]
    fn close_at_average_is_rejected() {
        let mut ind = healthy();
        ind.close = 100.0;
        assert!(matches!(
            evaluate(&ind, &ScreenerConfig::default()),
            GateVerdict::Reject(RejectReason::BelowMovingAverage { .. })
        ));
    }

    #[test]
    fn rsi_at_ceiling_is_overheated() {
        let mut ind = healthy();
        ind.rsi = Indicator::Computed(80.0);
        assert!(matches!(
            evaluate(&ind, &ScreenerConfig::default()),
            GateVerdict::Reject(RejectReason::Overheated { .. })
        ));
    }

    #[test]
    fn daily_change_band_edges() {
        let config = ScreenerConfig::default();
        let mut ind = healthy();
        ind.daily_change = Indicator::Computed(-0.02);
        assert!(evaluate(&ind, &config).is_pass());
        ind.daily_change = Indicator::Computed(0.051);
        assert!(!evaluate(&ind, &config).is_pass());
    }

    #[test]
    fn run_up_at_ceiling_is_rejected() {
        let mut ind = healthy();
        ind.run_up = Indicator::Computed(0.10);
        assert!(matches!(
            evaluate(&ind, &ScreenerConfig::default()),
            GateVerdict::Reject(RejectReason::RunUpTooLarge { .. })
        ));
    }

    #[test]
    fn volume_contraction_rejected_only_when_required() {
        let mut ind = healthy();
        ind.volume_ratio = Indicator::Computed(0.8);
        let mut config = ScreenerConfig::default();
        assert!(config.trend.require_volume_expansion);
        assert_eq!(
            evaluate(&ind, &config),
            GateVerdict::Reject(RejectReason::NoVolumeExpansion { ratio: 0.8 })
        );

        config.trend.require_volume_expansion = false;
        match evaluate(&ind, &config) {
            GateVerdict::Pass { score, .. } => assert_eq!(score, 2),
            other => panic!("expected pass, got {:?}", other),
        }
    }

    #[test]
    fn bonuses_can_be_disabled() {
        let mut config = ScreenerConfig::default();
        config.trend.volume_bonus = 0;
        config.trend.fresh_breakout_bonus = 0;
        config.trend.safe_bias_bonus = 0;
        match evaluate(&healthy(), &config) {
            GateVerdict::Pass { score, .. } => assert_eq!(score, 0),
            other => panic!("expected pass, got {:?}", other),
        }
    }

    #[test]
    fn insufficient_rsi_rejects_under_default_policy() {
        let mut ind = healthy();
        ind.rsi = Indicator::Insufficient { have: 10, need: 15 };
        assert_eq!(
            evaluate(&ind, &ScreenerConfig::default()),
            GateVerdict::Reject(RejectReason::InsufficientData {
                indicator: IndicatorType::Rsi(14),
                have: 10,
                need: 15
            })
        );
    }

    #[test]
    fn insufficient_rsi_is_skipped_under_ignore_policy() {
        let mut ind = healthy();
        ind.rsi = Indicator::Insufficient { have: 10, need: 15 };
        let mut config = ScreenerConfig::default();
        config.insufficient_data = InsufficientDataPolicy::Ignore;
        match evaluate(&ind, &config) {
            GateVerdict::Pass { annotations, .. } => assert!(annotations.contains(
                &Annotation::Unevaluated {
                    indicator: IndicatorType::Rsi(14)
                }
            )),
            other => panic!("expected pass, got {:?}", other),
        }
    }
}
