//! Builds a [`ScreenerConfig`] from INI sections.
//!
//! `[scan] preset` selects the base preset; every other key is optional and
//! overrides one field of it. Unknown sections or keys and unparsable values
//! are errors. The assembled config is validated before it is returned.

use crate::domain::config::{
    InsufficientDataPolicy, LiquidityMeasure, MagnitudeTier, Preset, ScreenerConfig, ValuationMode,
};
use crate::domain::error::ScreenerError;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use std::fmt::Display;
use std::str::FromStr;

const KNOWN_KEYS: &[(&str, &[&str])] = &[
    (
        "scan",
        &[
            "preset",
            "name",
            "top_n",
            "history_lookback",
            "insufficient_data",
            "parallel",
            "excluded_prefixes",
            "watchlist",
        ],
    ),
    ("regime", &["index_ma_window", "limit_down_threshold"]),
    (
        "liquidity",
        &[
            "price_min",
            "price_max",
            "measure",
            "floor",
            "spike_ratio",
            "spike_lookback",
        ],
    ),
    (
        "trend",
        &[
            "ma_window",
            "rsi_period",
            "rsi_ceiling",
            "change_min",
            "change_max",
            "run_up_days",
            "run_up_ceiling",
            "require_volume_expansion",
            "kd_period",
            "volume_bonus",
            "fresh_breakout_ceiling",
            "fresh_breakout_bonus",
            "safe_bias_ceiling",
            "safe_bias_bonus",
        ],
    ),
    (
        "chips",
        &[
            "lookback_days",
            "min_consecutive_days",
            "five_day_floor",
            "month_floor",
            "persistence_days",
            "positive_flow_bonus",
            "persistence_bonus",
            "magnitude_tiers",
        ],
    ),
    (
        "valuation",
        &["enabled", "mode", "valuation_cap", "penalty", "growth_bonus"],
    ),
    (
        "sizing",
        &["high_threshold", "high_allocation", "medium_allocation"],
    ),
    (
        "risk",
        &[
            "atr_period",
            "stop_atr_multiple",
            "hard_stop_pct",
            "take_profit_atr_multiple",
            "stretch_atr_multiple",
        ],
    ),
    (
        "exit",
        &[
            "stop_loss",
            "min_holding_days",
            "short_ma_window",
            "trailing_trigger",
            "trailing_stop",
            "take_profit",
        ],
    ),
    ("backtest", &["horizons"]),
];

pub fn load_screener_config(port: &dyn ConfigPort) -> Result<ScreenerConfig, ScreenerError> {
    validate_known_keys(port)?;

    let preset = match port.get_string("scan", "preset") {
        Some(name) => name
            .parse::<Preset>()
            .map_err(|_| invalid("scan", "preset", format!("unknown preset '{}'", name)))?,
        None => Preset::Standard,
    };
    let mut c = ScreenerConfig::preset(preset);

    if let Some(name) = port.get_string("scan", "name") {
        c.name = name.trim().to_string();
    }
    set(port, "scan", "top_n", &mut c.top_n)?;
    set(port, "scan", "history_lookback", &mut c.history_lookback)?;
    set_with(port, "scan", "insufficient_data", &mut c.insufficient_data, parse_policy)?;
    set_with(port, "scan", "parallel", &mut c.parallel, parse_bool)?;
    set_with(port, "scan", "excluded_prefixes", &mut c.universe.excluded_prefixes, parse_prefixes)?;
    set_with(port, "scan", "watchlist", &mut c.universe.watchlist, |v| {
        parse_tickers(v).map_err(|e| e.to_string())
    })?;

    set(port, "regime", "index_ma_window", &mut c.regime.index_ma_window)?;
    set(port, "regime", "limit_down_threshold", &mut c.regime.limit_down_threshold)?;

    let l = &mut c.liquidity;
    set(port, "liquidity", "price_min", &mut l.price_min)?;
    set(port, "liquidity", "price_max", &mut l.price_max)?;
    set_with(port, "liquidity", "measure", &mut l.measure, parse_measure)?;
    set(port, "liquidity", "floor", &mut l.floor)?;
    set(port, "liquidity", "spike_ratio", &mut l.spike_ratio)?;
    set(port, "liquidity", "spike_lookback", &mut l.spike_lookback)?;

    let t = &mut c.trend;
    set(port, "trend", "ma_window", &mut t.ma_window)?;
    set(port, "trend", "rsi_period", &mut t.rsi_period)?;
    set(port, "trend", "rsi_ceiling", &mut t.rsi_ceiling)?;
    set(port, "trend", "change_min", &mut t.change_min)?;
    set(port, "trend", "change_max", &mut t.change_max)?;
    set(port, "trend", "run_up_days", &mut t.run_up_days)?;
    set(port, "trend", "run_up_ceiling", &mut t.run_up_ceiling)?;
    set_with(port, "trend", "require_volume_expansion", &mut t.require_volume_expansion, parse_bool)?;
    set(port, "trend", "kd_period", &mut t.kd_period)?;
    set(port, "trend", "volume_bonus", &mut t.volume_bonus)?;
    set(port, "trend", "fresh_breakout_ceiling", &mut t.fresh_breakout_ceiling)?;
    set(port, "trend", "fresh_breakout_bonus", &mut t.fresh_breakout_bonus)?;
    set(port, "trend", "safe_bias_ceiling", &mut t.safe_bias_ceiling)?;
    set(port, "trend", "safe_bias_bonus", &mut t.safe_bias_bonus)?;

    let ch = &mut c.chips;
    set(port, "chips", "lookback_days", &mut ch.lookback_days)?;
    set(port, "chips", "min_consecutive_days", &mut ch.min_consecutive_days)?;
    set(port, "chips", "five_day_floor", &mut ch.five_day_floor)?;
    set(port, "chips", "month_floor", &mut ch.month_floor)?;
    set(port, "chips", "persistence_days", &mut ch.persistence_days)?;
    set(port, "chips", "positive_flow_bonus", &mut ch.positive_flow_bonus)?;
    set(port, "chips", "persistence_bonus", &mut ch.persistence_bonus)?;
    set_with(port, "chips", "magnitude_tiers", &mut ch.magnitude_tiers, parse_tiers)?;

    let v = &mut c.valuation;
    set_with(port, "valuation", "enabled", &mut v.enabled, parse_bool)?;
    set_with(port, "valuation", "mode", &mut v.mode, parse_mode)?;
    set(port, "valuation", "valuation_cap", &mut v.valuation_cap)?;
    set(port, "valuation", "penalty", &mut v.penalty)?;
    set(port, "valuation", "growth_bonus", &mut v.growth_bonus)?;

    set(port, "sizing", "high_threshold", &mut c.sizing.high_threshold)?;
    set(port, "sizing", "high_allocation", &mut c.sizing.high_allocation)?;
    set(port, "sizing", "medium_allocation", &mut c.sizing.medium_allocation)?;

    let r = &mut c.risk;
    set(port, "risk", "atr_period", &mut r.atr_period)?;
    set(port, "risk", "stop_atr_multiple", &mut r.stop_atr_multiple)?;
    set(port, "risk", "hard_stop_pct", &mut r.hard_stop_pct)?;
    set(port, "risk", "take_profit_atr_multiple", &mut r.take_profit_atr_multiple)?;
    set(port, "risk", "stretch_atr_multiple", &mut r.stretch_atr_multiple)?;

    let e = &mut c.exit;
    set(port, "exit", "stop_loss", &mut e.stop_loss)?;
    set(port, "exit", "min_holding_days", &mut e.min_holding_days)?;
    set(port, "exit", "short_ma_window", &mut e.short_ma_window)?;
    set(port, "exit", "trailing_trigger", &mut e.trailing_trigger)?;
    set(port, "exit", "trailing_stop", &mut e.trailing_stop)?;
    set(port, "exit", "take_profit", &mut e.take_profit)?;

    set_with(port, "backtest", "horizons", &mut c.backtest.horizons, |v| {
        split_list(v).map(|s| s.parse::<usize>().map_err(|e| e.to_string())).collect()
    })?;

    c.validate()?;
    Ok(c)
}

fn validate_known_keys(port: &dyn ConfigPort) -> Result<(), ScreenerError> {
    for section in port.sections() {
        let Some((_, keys)) = KNOWN_KEYS.iter().find(|(name, _)| *name == section) else {
            return Err(ScreenerError::ConfigInvalid {
                section: section.clone(),
                key: String::new(),
                reason: "unknown section".to_string(),
            });
        };
        for key in port.keys(&section) {
            if !keys.contains(&key.as_str()) {
                return Err(invalid(&section, &key, "unknown key".to_string()));
            }
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: String) -> ScreenerError {
    ScreenerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn set<T>(port: &dyn ConfigPort, section: &str, key: &str, target: &mut T) -> Result<(), ScreenerError>
where
    T: FromStr,
    T::Err: Display,
{
    set_with(port, section, key, target, |v| v.parse::<T>().map_err(|e| e.to_string()))
}

fn set_with<T>(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
    target: &mut T,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<(), ScreenerError> {
    if let Some(raw) = port.get_string(section, key) {
        *target = parse(raw.trim()).map_err(|reason| invalid(section, key, reason))?;
    }
    Ok(())
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected a boolean, got '{}'", other)),
    }
}

fn parse_policy(value: &str) -> Result<InsufficientDataPolicy, String> {
    match value.to_lowercase().as_str() {
        "reject" => Ok(InsufficientDataPolicy::Reject),
        "ignore" => Ok(InsufficientDataPolicy::Ignore),
        other => Err(format!("expected reject or ignore, got '{}'", other)),
    }
}

fn parse_measure(value: &str) -> Result<LiquidityMeasure, String> {
    match value.to_lowercase().as_str() {
        "turnover" => Ok(LiquidityMeasure::Turnover),
        "volume" => Ok(LiquidityMeasure::Volume),
        other => Err(format!("expected turnover or volume, got '{}'", other)),
    }
}

fn parse_mode(value: &str) -> Result<ValuationMode, String> {
    match value.to_lowercase().as_str() {
        "strict" => Ok(ValuationMode::Strict),
        "loose" => Ok(ValuationMode::Loose),
        other => Err(format!("expected strict or loose, got '{}'", other)),
    }
}

fn parse_prefixes(value: &str) -> Result<Vec<String>, String> {
    Ok(split_list(value).map(str::to_string).collect())
}

/// `above:bonus` pairs, e.g. `5000:2, 1000:1`.
fn parse_tiers(value: &str) -> Result<Vec<MagnitudeTier>, String> {
    split_list(value)
        .map(|pair| {
            let (above, bonus) = pair
                .split_once(':')
                .ok_or_else(|| format!("tier '{}' must be above:bonus", pair))?;
            Ok(MagnitudeTier {
                above: above.trim().parse().map_err(|e| format!("tier '{}': {}", pair, e))?,
                bonus: bonus.trim().parse().map_err(|e| format!("tier '{}': {}", pair, e))?,
            })
        })
        .collect()
}
