//! JSON report adapter.
//!
//! Scan outcomes whose output path ends in `.csv` are written as a decision
//! table instead.

use crate::adapters::csv_adapter::write_decisions;
use crate::domain::backtest::BacktestReport;
use crate::domain::error::ScreenerError;
use crate::domain::pipeline::ScanOutcome;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    fn write_json<T: Serialize>(&self, value: &T, path: &Path) -> Result<(), ScreenerError> {
        self.write_json_to(value, BufWriter::new(File::create(path)?), path)
    }

    /// Serializes into `writer` and flushes it, so a short write is an error
    /// rather than a truncated report.
    fn write_json_to<T: Serialize, W: Write>(
        &self,
        value: &T,
        mut writer: W,
        path: &Path,
    ) -> Result<(), ScreenerError> {
        let result = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, value)
        } else {
            serde_json::to_writer(&mut writer, value)
        };
        result.map_err(|e| ScreenerError::Report {
            reason: format!("failed to write {}: {}", path.display(), e),
        })?;
        writer.flush()?;
        Ok(())
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_scan(&self, outcome: &ScanOutcome, output_path: &Path) -> Result<(), ScreenerError> {
        if output_path.extension().is_some_and(|ext| ext == "csv") {
            write_decisions(&outcome.decisions, File::create(output_path)?)?;
        } else {
            self.write_json(outcome, output_path)?;
        }
        info!(path = %output_path.display(), decisions = outcome.decisions.len(), "scan report written");
        Ok(())
    }

    fn write_backtest(
        &self,
        report: &BacktestReport,
        output_path: &Path,
    ) -> Result<(), ScreenerError> {
        self.write_json(report, output_path)?;
        info!(path = %output_path.display(), results = report.results.len(), "backtest report written");
        Ok(())
    }

    fn read_backtest(&self, path: &Path) -> Result<BacktestReport, ScreenerError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| ScreenerError::Report {
            reason: format!("failed to parse {}: {}", path.display(), e),
        })
    }
}
