//! Held positions and their closing records.

use crate::domain::error::ScreenerError;
use crate::domain::exit::{ExitAction, ExitKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    /// Highest close since entry; never decreases.
    pub peak_price: f64,
}

impl Position {
    pub fn open(
        ticker: impl Into<String>,
        entry_price: f64,
        entry_date: NaiveDate,
    ) -> Result<Self, ScreenerError> {
        let ticker = ticker.into();
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(ScreenerError::InvalidPosition {
                ticker,
                reason: format!("entry price {} must be positive", entry_price),
            });
        }
        Ok(Self {
            ticker,
            entry_price,
            entry_date,
            peak_price: entry_price,
        })
    }

    /// Records today's close, raising the peak when exceeded.
    pub fn mark(&mut self, close: f64) {
        if close > self.peak_price {
            self.peak_price = close;
        }
    }

    pub fn pnl_ratio(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    pub fn peak_gain(&self) -> f64 {
        (self.peak_price - self.entry_price) / self.entry_price
    }

    pub fn drawdown_from_peak(&self, price: f64) -> f64 {
        if self.peak_price > 0.0 {
            (self.peak_price - price) / self.peak_price
        } else {
            0.0
        }
    }

    /// Closes on an exiting action. HOLD is not a transition to CLOSED.
    pub fn close(
        self,
        action: &ExitAction,
        exit_date: NaiveDate,
        exit_price: f64,
    ) -> Result<ClosedPosition, ScreenerError> {
        if action.kind == ExitKind::Hold {
            return Err(ScreenerError::InvalidPosition {
                ticker: self.ticker,
                reason: "cannot close on HOLD".into(),
            });
        }
        if exit_date < self.entry_date {
            return Err(ScreenerError::InvalidPosition {
                ticker: self.ticker,
                reason: format!("exit {} precedes entry {}", exit_date, self.entry_date),
            });
        }
        Ok(ClosedPosition {
            pnl_ratio: self.pnl_ratio(exit_price),
            ticker: self.ticker,
            entry_price: self.entry_price,
            entry_date: self.entry_date,
            peak_price: self.peak_price.max(exit_price),
            exit_price,
            exit_date,
            exit_kind: action.kind,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub ticker: String,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub peak_price: f64,
    pub exit_price: f64,
    pub exit_date: NaiveDate,
    pub exit_kind: ExitKind,
    pub pnl_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn sample_position() -> Position {
        Position::open("2330", 100.0, date(2)).unwrap()
    }

    fn action(kind: ExitKind) -> ExitAction {
        ExitAction {
            kind,
            pnl_ratio: 0.0,
        }
    }

    #[test]
    fn open_rejects_non_positive_entry() {
        assert!(Position::open("2330", 0.0, date(2)).is_err());
        assert!(Position::open("2330", f64::NAN, date(2)).is_err());
    }

    #[test]
    fn peak_is_monotone() {
        let mut pos = sample_position();
        pos.mark(110.0);
        pos.mark(104.0);
        assert_eq!(pos.peak_price, 110.0);
        pos.mark(115.0);
        assert_eq!(pos.peak_price, 115.0);
    }

    #[test]
    fn pnl_and_drawdown() {
        let mut pos = sample_position();
        pos.mark(120.0);
        assert!((pos.pnl_ratio(108.0) - 0.08).abs() < 1e-12);
        assert!((pos.peak_gain() - 0.20).abs() < 1e-12);
        assert!((pos.drawdown_from_peak(108.0) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn close_on_exit_action() {
        let closed = sample_position()
            .close(&action(ExitKind::TakeProfit), date(20), 131.0)
            .unwrap();
        assert_eq!(closed.exit_kind, ExitKind::TakeProfit);
        assert!((closed.pnl_ratio - 0.31).abs() < 1e-12);
        assert_eq!(closed.peak_price, 131.0);
    }

    #[test]
    fn close_on_hold_is_an_error() {
        let err = sample_position()
            .close(&action(ExitKind::Hold), date(20), 101.0)
            .unwrap_err();
        assert!(matches!(err, ScreenerError::InvalidPosition { .. }));
    }

    #[test]
    fn close_before_entry_is_an_error() {
        assert!(sample_position()
            .close(&action(ExitKind::StopLoss), date(1), 90.0)
            .is_err());
    }
}
