//! Exit state machine for held positions.
//!
//! A position is HOLDING until one of the exit conditions fires, checked in
//! strict priority order: FORCED_EXIT, STOP_LOSS, TECH_BREAK, TRAILING_STOP,
//! TAKE_PROFIT. HOLD means no transition.

use crate::domain::config::ScreenerConfig;
use crate::domain::error::ScreenerError;
use crate::domain::gates::regime::{self, RegimeAssessment, RegimeStatus};
use crate::domain::indicator::sma::sma;
use crate::domain::indicator::Indicator;
use crate::domain::ohlcv::clip_to_as_of;
use crate::domain::pipeline::CandidateFailure;
use crate::domain::position::Position;
use crate::ports::data_port::Providers;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitKind {
    ForcedExit,
    StopLoss,
    TechBreak,
    TrailingStop,
    TakeProfit,
    Hold,
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExitKind::ForcedExit => "FORCED_EXIT",
            ExitKind::StopLoss => "STOP_LOSS",
            ExitKind::TechBreak => "TECH_BREAK",
            ExitKind::TrailingStop => "TRAILING_STOP",
            ExitKind::TakeProfit => "TAKE_PROFIT",
            ExitKind::Hold => "HOLD",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitAction {
    pub kind: ExitKind,
    pub pnl_ratio: f64,
}

impl ExitAction {
    pub fn is_exit(&self) -> bool {
        self.kind != ExitKind::Hold
    }
}

/// Market state of a held ticker on the evaluation day.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitQuote {
    pub date: NaiveDate,
    pub close: f64,
    pub short_ma: Indicator,
    /// Trading days since entry.
    pub holding_days: u32,
}

pub fn evaluate_exit(
    position: &Position,
    quote: &ExitQuote,
    regime: RegimeStatus,
    config: &ScreenerConfig,
) -> ExitAction {
    let exit = &config.exit;
    let pnl_ratio = position.pnl_ratio(quote.close);
    let action = |kind| ExitAction { kind, pnl_ratio };

    if regime.is_danger() {
        return action(ExitKind::ForcedExit);
    }

    if quote.holding_days >= exit.min_holding_days && pnl_ratio <= exit.stop_loss {
        return action(ExitKind::StopLoss);
    }

    if let Some(ma) = quote.short_ma.get() {
        if quote.close < ma && pnl_ratio < 0.0 {
            return action(ExitKind::TechBreak);
        }
    }

    let mut marked = position.clone();
    marked.mark(quote.close);
    if marked.peak_gain() > exit.trailing_trigger
        && marked.drawdown_from_peak(quote.close) > exit.trailing_stop
    {
        return action(ExitKind::TrailingStop);
    }

    if pnl_ratio >= exit.take_profit {
        return action(ExitKind::TakeProfit);
    }

    action(ExitKind::Hold)
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingReview {
    /// The position marked with the day's close.
    pub position: Position,
    pub quote: ExitQuote,
    pub action: ExitAction,
}

#[derive(Debug, Clone)]
pub struct HoldingsReview {
    pub date: NaiveDate,
    pub regime: RegimeAssessment,
    pub reviews: Vec<HoldingReview>,
    pub failures: Vec<CandidateFailure>,
}

/// Runs the exit state machine for every held position on `date`.
pub fn review_positions(
    date: NaiveDate,
    positions: &[Position],
    config: &ScreenerConfig,
    providers: &Providers<'_>,
) -> Result<HoldingsReview, ScreenerError> {
    config.validate()?;

    let snapshot = providers
        .market
        .get_snapshot(date)?
        .ok_or_else(|| ScreenerError::ProviderGap {
            what: "snapshot".into(),
            date,
        })?;
    let index = providers
        .market
        .get_index_history(date, config.regime.index_ma_window)?;
    let regime = regime::assess(&snapshot, &index, config);

    let lookback = config
        .exit
        .short_ma_window
        .max(config.exit.min_holding_days as usize + 1);

    let mut reviews = Vec::with_capacity(positions.len());
    let mut failures = Vec::new();

    for position in positions {
        match review_one(date, position, lookback, regime.status, config, providers) {
            Ok(review) => reviews.push(review),
            Err(e) => {
                warn!(ticker = %position.ticker, error = %e, "holding review failed");
                failures.push(CandidateFailure {
                    ticker: position.ticker.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        %date,
        regime = %regime.status,
        reviewed = reviews.len(),
        exits = reviews.iter().filter(|r| r.action.is_exit()).count(),
        "holdings reviewed"
    );

    Ok(HoldingsReview {
        date,
        regime,
        reviews,
        failures,
    })
}

fn review_one(
    date: NaiveDate,
    position: &Position,
    lookback: usize,
    regime: RegimeStatus,
    config: &ScreenerConfig,
    providers: &Providers<'_>,
) -> Result<HoldingReview, ScreenerError> {
    let mut bars = providers.prices.get_history(&position.ticker, date, lookback)?;
    clip_to_as_of(&mut bars, date);
    let last = bars.last().ok_or_else(|| ScreenerError::ProviderGap {
        what: format!("price history for {}", position.ticker),
        date,
    })?;

    // Bars beyond the lookback are not seen, so this saturates at `lookback`.
    let holding_days = bars.iter().filter(|b| b.date > position.entry_date).count() as u32;

    let quote = ExitQuote {
        date: last.date,
        close: last.close,
        short_ma: sma(&bars, config.exit.short_ma_window),
        holding_days,
    };
    let action = evaluate_exit(position, &quote, regime, config);

    let mut marked = position.clone();
    marked.mark(quote.close);

    Ok(HoldingReview {
        position: marked,
        quote,
        action,
    })
}
