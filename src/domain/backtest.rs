//! Historical replay of the screening pipeline.
//!
//! Every weekday in the range is scanned with provider calls bounded by that
//! day. Forward returns are measured afterwards from the closes observed on
//! later scan days, so no decision ever sees data past its own date and no
//! horizon reads past the last completed day.

use crate::domain::config::ScreenerConfig;
use crate::domain::error::ScreenerError;
use crate::domain::gates::regime::RegimeStatus;
use crate::domain::gates::sizing::AllocationTier;
use crate::domain::metrics::HorizonStats;
use crate::domain::ohlcv::clip_to_as_of;
use crate::domain::pipeline::scan_snapshot;
use crate::ports::data_port::Providers;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A scan day that produced no result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGap {
    pub date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub regime: RegimeStatus,
    pub recommendations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardReturn {
    pub horizon: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub return_pct: f64,
    pub win: bool,
}

/// One recommendation and how it played out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub date: NaiveDate,
    pub ticker: String,
    pub entry_price: f64,
    pub score: i32,
    pub tier: AllocationTier,
    pub forward: Vec<ForwardReturn>,
}

impl BacktestResult {
    pub fn at(&self, horizon: usize) -> Option<&ForwardReturn> {
        self.forward.iter().find(|f| f.horizon == horizon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub config_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DaySummary>,
    pub total_recommendations: usize,
    pub results: Vec<BacktestResult>,
    pub horizons: Vec<HorizonStats>,
    pub gaps: Vec<DayGap>,
    /// Stopped early by the cutoff; only completed days are covered.
    pub truncated: bool,
}

impl BacktestReport {
    pub fn horizon(&self, horizon: usize) -> Option<&HorizonStats> {
        self.horizons.iter().find(|h| h.horizon == horizon)
    }

    pub fn danger_days(&self) -> usize {
        self.days.iter().filter(|d| d.regime.is_danger()).count()
    }
}

/// Closes observed on one trading day that had a snapshot.
struct ObservedDay {
    date: NaiveDate,
    closes: HashMap<String, f64>,
}

struct Pending {
    day_index: usize,
    result: BacktestResult,
}

pub fn run_backtest(
    start: NaiveDate,
    end: NaiveDate,
    config: &ScreenerConfig,
    providers: &Providers<'_>,
) -> Result<BacktestReport, ScreenerError> {
    run_backtest_until(start, end, config, providers, |_| false)
}

/// Like [`run_backtest`], but `cutoff` is asked before each day and stops the
/// run when it returns true.
pub fn run_backtest_until(
    start: NaiveDate,
    end: NaiveDate,
    config: &ScreenerConfig,
    providers: &Providers<'_>,
    mut cutoff: impl FnMut(NaiveDate) -> bool,
) -> Result<BacktestReport, ScreenerError> {
    config.validate()?;
    if start > end {
        return Err(ScreenerError::invalid_config(
            "backtest.range",
            format!("start {} is after end {}", start, end),
        ));
    }

    info!(%start, %end, config = %config.name, "backtest started");

    let mut observed: Vec<ObservedDay> = Vec::new();
    let mut pending: Vec<Pending> = Vec::new();
    let mut days = Vec::new();
    let mut gaps = Vec::new();
    let mut truncated = false;

    for date in weekdays(start, end) {
        if cutoff(date) {
            info!(%date, "backtest cut off");
            truncated = true;
            break;
        }

        let snapshot = match providers.market.get_snapshot(date) {
            Ok(Some(snapshot)) if snapshot.date == date => snapshot,
            Ok(Some(snapshot)) => {
                record_gap(&mut gaps, date, format!("snapshot dated {}", snapshot.date));
                continue;
            }
            Ok(None) => {
                record_gap(&mut gaps, date, "no snapshot".into());
                continue;
            }
            Err(e) => {
                record_gap(&mut gaps, date, e.to_string());
                continue;
            }
        };

        // Every accepted snapshot is a trading day for horizon counting, even
        // when its scan fails.
        let day_index = observed.len();
        observed.push(ObservedDay {
            date,
            closes: snapshot
                .quotes
                .iter()
                .map(|(ticker, bar)| (ticker.clone(), bar.close))
                .collect(),
        });

        let outcome = match scan_snapshot(&snapshot, config, providers) {
            Ok(outcome) => outcome,
            Err(e) => {
                record_gap(&mut gaps, date, e.to_string());
                continue;
            }
        };

        debug!(%date, regime = %outcome.regime.status, picks = outcome.decisions.len(), "backtest day");
        days.push(DaySummary {
            date,
            regime: outcome.regime.status,
            recommendations: outcome.decisions.len(),
        });

        for decision in outcome.decisions {
            pending.push(Pending {
                day_index,
                result: BacktestResult {
                    date,
                    entry_price: decision.close,
                    score: decision.score,
                    tier: decision.allocation.tier,
                    ticker: decision.ticker,
                    forward: Vec::new(),
                },
            });
        }
    }

    let mut results = Vec::with_capacity(pending.len());
    for Pending { day_index, mut result } in pending {
        for &horizon in &config.backtest.horizons {
            let Some(day) = observed.get(day_index + horizon) else {
                continue;
            };
            let Some(exit_price) = exit_close(day, &result.ticker, providers) else {
                continue;
            };
            if result.entry_price <= 0.0 {
                continue;
            }
            let return_pct = (exit_price - result.entry_price) / result.entry_price;
            result.forward.push(ForwardReturn {
                horizon,
                exit_date: day.date,
                exit_price,
                return_pct,
                win: return_pct > 0.0,
            });
        }
        results.push(result);
    }

    let horizons: Vec<HorizonStats> = config
        .backtest
        .horizons
        .iter()
        .map(|&h| {
            let returns: Vec<f64> = results
                .iter()
                .filter_map(|r| r.at(h).map(|f| f.return_pct))
                .collect();
            HorizonStats::compute(h, &returns)
        })
        .collect();

    let report = BacktestReport {
        config_name: config.name.clone(),
        start,
        end,
        total_recommendations: results.len(),
        days,
        results,
        horizons,
        gaps,
        truncated,
    };

    info!(
        days = report.days.len(),
        danger_days = report.danger_days(),
        recommendations = report.total_recommendations,
        gaps = report.gaps.len(),
        truncated = report.truncated,
        "backtest finished"
    );
    for stats in &report.horizons {
        info!(
            horizon = stats.horizon,
            valid = stats.valid_count,
            win_rate = stats.win_rate,
            avg_return = stats.avg_return,
            "horizon summary"
        );
    }

    Ok(report)
}

fn record_gap(gaps: &mut Vec<DayGap>, date: NaiveDate, reason: String) {
    warn!(%date, %reason, "backtest day skipped");
    gaps.push(DayGap { date, reason });
}

/// Close of `ticker` on an observed day. Falls back to its price history, but
/// only a bar dated that day counts; an older bar means it did not trade.
fn exit_close(day: &ObservedDay, ticker: &str, providers: &Providers<'_>) -> Option<f64> {
    if let Some(&close) = day.closes.get(ticker) {
        return Some(close);
    }
    match providers.prices.get_history(ticker, day.date, 1) {
        Ok(mut bars) => {
            clip_to_as_of(&mut bars, day.date);
            bars.last()
                .filter(|b| b.date == day.date)
                .map(|b| b.close)
        }
        Err(e) => {
            warn!(ticker, date = %day.date, error = %e, "forward price unavailable");
            None
        }
    }
}

/// Monday to Friday dates in `[start, end]`.
pub fn weekdays(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}
