//! Report persistence port.

use crate::domain::backtest::BacktestReport;
use crate::domain::error::ScreenerError;
use crate::domain::pipeline::ScanOutcome;
use std::path::Path;

/// Port for writing scan and backtest results.
pub trait ReportPort {
    fn write_scan(&self, outcome: &ScanOutcome, output_path: &Path) -> Result<(), ScreenerError>;

    fn write_backtest(
        &self,
        report: &BacktestReport,
        output_path: &Path,
    ) -> Result<(), ScreenerError>;

    /// Reads back a report written by [`ReportPort::write_backtest`].
    fn read_backtest(&self, path: &Path) -> Result<BacktestReport, ScreenerError>;
}
