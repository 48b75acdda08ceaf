//! Screening configuration.
//!
//! One immutable [`ScreenerConfig`] carries every threshold used by the gates,
//! the exit state machine and the backtest harness. Strategy variants are named
//! [`Preset`]s of this single type. All ratios are fractions (0.05 = 5%) and all
//! institutional flow amounts are in board lots.

use crate::domain::error::ScreenerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a gate does when an indicator it needs cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsufficientDataPolicy {
    /// Reject the candidate, naming the indicator.
    Reject,
    /// Skip the affected condition and annotate it as unevaluated.
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityMeasure {
    Turnover,
    Volume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationMode {
    Strict,
    Loose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub index_ma_window: usize,
    pub limit_down_threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Ticker prefixes never screened (sector codes, ETFs).
    pub excluded_prefixes: Vec<String>,
    /// When non-empty, only these tickers are screened.
    pub watchlist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityConfig {
    pub price_min: f64,
    pub price_max: f64,
    pub measure: LiquidityMeasure,
    pub floor: f64,
    pub spike_ratio: f64,
    pub spike_lookback: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    pub ma_window: usize,
    pub rsi_period: usize,
    pub rsi_ceiling: f64,
    pub change_min: f64,
    pub change_max: f64,
    pub run_up_days: usize,
    pub run_up_ceiling: f64,
    pub require_volume_expansion: bool,
    pub kd_period: usize,
    pub volume_bonus: i32,
    pub fresh_breakout_ceiling: f64,
    pub fresh_breakout_bonus: i32,
    pub safe_bias_ceiling: f64,
    pub safe_bias_bonus: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeTier {
    /// Five-day cumulative strictly above this earns `bonus`.
    pub above: i64,
    pub bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipsConfig {
    pub lookback_days: usize,
    pub min_consecutive_days: usize,
    pub five_day_floor: i64,
    pub month_floor: i64,
    pub persistence_days: usize,
    pub positive_flow_bonus: i32,
    pub persistence_bonus: i32,
    /// Checked in order; the first matching tier applies.
    pub magnitude_tiers: Vec<MagnitudeTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    pub enabled: bool,
    pub mode: ValuationMode,
    pub valuation_cap: f64,
    pub penalty: i32,
    pub growth_bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingConfig {
    pub high_threshold: i32,
    pub high_allocation: f64,
    pub medium_allocation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub atr_period: usize,
    pub stop_atr_multiple: f64,
    pub hard_stop_pct: f64,
    pub take_profit_atr_multiple: f64,
    pub stretch_atr_multiple: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitConfig {
    /// Unrealized P&L at or below this fires STOP_LOSS (negative).
    pub stop_loss: f64,
    pub min_holding_days: u32,
    pub short_ma_window: usize,
    pub trailing_trigger: f64,
    pub trailing_stop: f64,
    pub take_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSettings {
    /// Forward-return horizons in trading days.
    pub horizons: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenerConfig {
    pub name: String,
    pub top_n: usize,
    /// Bars requested from the price history provider per candidate.
    pub history_lookback: usize,
    pub insufficient_data: InsufficientDataPolicy,
    pub parallel: bool,
    pub regime: RegimeConfig,
    pub universe: UniverseConfig,
    pub liquidity: LiquidityConfig,
    pub trend: TrendConfig,
    pub chips: ChipsConfig,
    pub valuation: ValuationConfig,
    pub sizing: SizingConfig,
    pub risk: RiskConfig,
    pub exit: ExitConfig,
    pub backtest: BacktestSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// Daily-volume liquidity, strict chips persistence, volume expansion required.
    Standard,
    /// Turnover liquidity with spike warnings and strict valuation.
    Guardian,
    /// Looser trend band, loose valuation with a revenue-growth bonus.
    Momentum,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Standard, Preset::Guardian, Preset::Momentum];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Standard => "standard",
            Preset::Guardian => "guardian",
            Preset::Momentum => "momentum",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Preset::Standard),
            "guardian" => Ok(Preset::Guardian),
            "momentum" => Ok(Preset::Momentum),
            other => Err(ScreenerError::invalid_config(
                "preset",
                format!("unknown preset '{}'", other),
            )),
        }
    }
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self::preset(Preset::Standard)
    }
}

impl ScreenerConfig {
    pub fn preset(preset: Preset) -> Self {
        let standard = Self::standard();
        match preset {
            Preset::Standard => standard,
            Preset::Guardian => Self {
                name: preset.name().into(),
                liquidity: LiquidityConfig {
                    measure: LiquidityMeasure::Turnover,
                    floor: 50_000_000.0,
                    price_min: 10.0,
                    price_max: 1_000.0,
                    ..standard.liquidity.clone()
                },
                trend: TrendConfig {
                    require_volume_expansion: false,
                    ..standard.trend.clone()
                },
                chips: ChipsConfig {
                    min_consecutive_days: 3,
                    ..standard.chips.clone()
                },
                valuation: ValuationConfig {
                    mode: ValuationMode::Strict,
                    ..standard.valuation.clone()
                },
                ..standard
            },
            Preset::Momentum => Self {
                name: preset.name().into(),
                top_n: 10,
                trend: TrendConfig {
                    require_volume_expansion: false,
                    change_min: 0.0,
                    change_max: 0.07,
                    rsi_ceiling: 85.0,
                    ..standard.trend.clone()
                },
                valuation: ValuationConfig {
                    mode: ValuationMode::Loose,
                    growth_bonus: 1,
                    ..standard.valuation.clone()
                },
                ..standard
            },
        }
    }

    fn standard() -> Self {
        Self {
            name: Preset::Standard.name().into(),
            top_n: 6,
            history_lookback: 60,
            insufficient_data: InsufficientDataPolicy::Reject,
            parallel: true,
            regime: RegimeConfig {
                index_ma_window: 60,
                limit_down_threshold: 100,
            },
            universe: UniverseConfig {
                excluded_prefixes: vec!["00".into(), "25".into(), "28".into(), "58".into()],
                watchlist: Vec::new(),
            },
            liquidity: LiquidityConfig {
                price_min: 30.0,
                price_max: 300.0,
                measure: LiquidityMeasure::Volume,
                floor: 800.0,
                spike_ratio: 5.0,
                spike_lookback: 5,
            },
            trend: TrendConfig {
                ma_window: 20,
                rsi_period: 14,
                rsi_ceiling: 80.0,
                change_min: -0.02,
                change_max: 0.05,
                run_up_days: 5,
                run_up_ceiling: 0.10,
                require_volume_expansion: true,
                kd_period: 9,
                volume_bonus: 1,
                fresh_breakout_ceiling: 0.04,
                fresh_breakout_bonus: 1,
                safe_bias_ceiling: 0.08,
                safe_bias_bonus: 1,
            },
            chips: ChipsConfig {
                lookback_days: 20,
                min_consecutive_days: 2,
                five_day_floor: 300,
                month_floor: -10_000,
                persistence_days: 3,
                positive_flow_bonus: 1,
                persistence_bonus: 1,
                magnitude_tiers: vec![
                    MagnitudeTier { above: 5_000, bonus: 2 },
                    MagnitudeTier { above: 1_000, bonus: 1 },
                ],
            },
            valuation: ValuationConfig {
                enabled: true,
                mode: ValuationMode::Strict,
                valuation_cap: 35.0,
                penalty: 1,
                growth_bonus: 0,
            },
            sizing: SizingConfig {
                high_threshold: 3,
                high_allocation: 0.15,
                medium_allocation: 0.08,
            },
            risk: RiskConfig {
                atr_period: 14,
                stop_atr_multiple: 2.0,
                hard_stop_pct: 0.07,
                take_profit_atr_multiple: 2.0,
                stretch_atr_multiple: 4.0,
            },
            exit: ExitConfig {
                stop_loss: -0.08,
                min_holding_days: 3,
                short_ma_window: 20,
                trailing_trigger: 0.10,
                trailing_stop: 0.10,
                take_profit: 0.30,
            },
            backtest: BacktestSettings {
                horizons: vec![5, 10],
            },
        }
    }

    /// Bars a candidate needs for every indicator the gates read.
    pub fn required_history(&self) -> usize {
        [
            self.trend.ma_window,
            self.trend.rsi_period + 1,
            self.trend.kd_period + 1,
            self.trend.run_up_days + 1,
            self.liquidity.spike_lookback + 1,
            self.risk.atr_period + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }

    /// Rejects thresholds outside their valid domain. Runs before any
    /// candidate work.
    pub fn validate(&self) -> Result<(), ScreenerError> {
        fn ensure(ok: bool, key: &str, reason: &str) -> Result<(), ScreenerError> {
            if ok {
                Ok(())
            } else {
                Err(ScreenerError::invalid_config(key, reason))
            }
        }
        fn fraction(value: f64, key: &str) -> Result<(), ScreenerError> {
            ensure(
                value.is_finite() && value > 0.0 && value < 1.0,
                key,
                "must be between 0 and 1 (exclusive)",
            )
        }

        ensure(self.top_n >= 1, "top_n", "must be at least 1")?;
        ensure(
            self.history_lookback >= self.required_history(),
            "history_lookback",
            "must cover the longest indicator window",
        )?;

        ensure(self.regime.index_ma_window >= 1, "regime.index_ma_window", "must be at least 1")?;

        let l = &self.liquidity;
        ensure(l.price_min >= 0.0, "liquidity.price_min", "must be non-negative")?;
        ensure(l.price_max > l.price_min, "liquidity.price_max", "must exceed price_min")?;
        ensure(l.floor >= 0.0, "liquidity.floor", "must be non-negative")?;
        ensure(l.spike_ratio > 0.0, "liquidity.spike_ratio", "must be positive")?;
        ensure(l.spike_lookback >= 1, "liquidity.spike_lookback", "must be at least 1")?;

        let t = &self.trend;
        ensure(t.ma_window >= 1, "trend.ma_window", "must be at least 1")?;
        ensure(t.rsi_period >= 1, "trend.rsi_period", "must be at least 1")?;
        ensure(
            t.rsi_ceiling > 0.0 && t.rsi_ceiling <= 100.0,
            "trend.rsi_ceiling",
            "must be in (0, 100]",
        )?;
        ensure(t.change_min <= t.change_max, "trend.change_min", "must not exceed change_max")?;
        ensure(t.run_up_days >= 1, "trend.run_up_days", "must be at least 1")?;
        ensure(t.kd_period >= 1, "trend.kd_period", "must be at least 1")?;
        ensure(
            t.volume_bonus >= 0 && t.fresh_breakout_bonus >= 0 && t.safe_bias_bonus >= 0,
            "trend.bonus",
            "bonuses must be non-negative",
        )?;

        let c = &self.chips;
        ensure(c.lookback_days >= 5, "chips.lookback_days", "must cover at least 5 days")?;
        ensure(c.min_consecutive_days >= 1, "chips.min_consecutive_days", "must be at least 1")?;
        ensure(c.persistence_days >= 1, "chips.persistence_days", "must be at least 1")?;
        ensure(
            c.magnitude_tiers.windows(2).all(|w| w[0].above > w[1].above),
            "chips.magnitude_tiers",
            "tiers must be ordered from largest to smallest threshold",
        )?;

        let v = &self.valuation;
        ensure(v.valuation_cap > 0.0, "valuation.valuation_cap", "must be positive")?;
        ensure(v.penalty >= 0, "valuation.penalty", "must be non-negative")?;
        ensure(v.growth_bonus >= 0, "valuation.growth_bonus", "must be non-negative")?;

        let s = &self.sizing;
        ensure(s.high_threshold >= 1, "sizing.high_threshold", "must be at least 1")?;
        fraction(s.high_allocation, "sizing.high_allocation")?;
        fraction(s.medium_allocation, "sizing.medium_allocation")?;
        ensure(
            s.high_allocation >= s.medium_allocation,
            "sizing.high_allocation",
            "must be at least medium_allocation",
        )?;

        let r = &self.risk;
        ensure(r.atr_period >= 1, "risk.atr_period", "must be at least 1")?;
        ensure(r.stop_atr_multiple > 0.0, "risk.stop_atr_multiple", "must be positive")?;
        fraction(r.hard_stop_pct, "risk.hard_stop_pct")?;
        ensure(
            r.take_profit_atr_multiple > 0.0,
            "risk.take_profit_atr_multiple",
            "must be positive",
        )?;
        ensure(
            r.stretch_atr_multiple >= r.take_profit_atr_multiple,
            "risk.stretch_atr_multiple",
            "must be at least take_profit_atr_multiple",
        )?;

        let e = &self.exit;
        ensure(e.stop_loss < 0.0 && e.stop_loss > -1.0, "exit.stop_loss", "must be in (-1, 0)")?;
        ensure(e.short_ma_window >= 1, "exit.short_ma_window", "must be at least 1")?;
        fraction(e.trailing_trigger, "exit.trailing_trigger")?;
        fraction(e.trailing_stop, "exit.trailing_stop")?;
        ensure(e.take_profit > 0.0, "exit.take_profit", "must be positive")?;

        ensure(!self.backtest.horizons.is_empty(), "backtest.horizons", "must not be empty")?;
        ensure(
            self.backtest.horizons.iter().all(|&h| h >= 1),
            "backtest.horizons",
            "every horizon must be at least 1 day",
        )?;

        Ok(())
    }
}
