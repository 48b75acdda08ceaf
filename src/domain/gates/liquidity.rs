//! Price band and tradable-size floor.

use crate::domain::candidate::IndicatorSet;
use crate::domain::config::{LiquidityConfig, LiquidityMeasure};
use crate::domain::gates::{Annotation, GateVerdict, RejectReason};

pub fn evaluate(indicators: &IndicatorSet, config: &LiquidityConfig) -> GateVerdict {
    let price = indicators.close;
    if price < config.price_min || price > config.price_max {
        return GateVerdict::Reject(RejectReason::PriceOutOfBand {
            price,
            min: config.price_min,
            max: config.price_max,
        });
    }

    let value = match config.measure {
        LiquidityMeasure::Turnover => indicators.turnover,
        LiquidityMeasure::Volume => indicators.volume as f64,
    };
    if value < config.floor {
        return GateVerdict::Reject(RejectReason::BelowLiquidityFloor {
            measure: config.measure,
            value,
            floor: config.floor,
        });
    }

    let mut annotations = Vec::new();
    if let Some(ratio) = indicators.volume_ratio.get() {
        if ratio > config.spike_ratio {
            annotations.push(Annotation::AbnormalVolumeSpike { ratio });
        }
    }

    GateVerdict::Pass {
        score: 0,
        annotations,
    }
}
