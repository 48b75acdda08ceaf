//! Institutional order-flow and fundamental records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Net buy (positive) or sell (negative) per participant category for one day,
/// in board lots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionalFlowRecord {
    pub date: NaiveDate,
    pub foreign: i64,
    pub trust: i64,
    pub dealer: i64,
}

impl InstitutionalFlowRecord {
    pub fn net(&self) -> i64 {
        self.foreign + self.trust + self.dealer
    }
}

/// Flow records ordered most-recent-first.
///
/// This is the one series in the crate kept in descending order; price
/// histories are ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowHistory {
    records: Vec<InstitutionalFlowRecord>,
}

impl FlowHistory {
    /// Builds the history from records in any order, keeping those dated on or
    /// before `as_of`.
    pub fn from_records(mut records: Vec<InstitutionalFlowRecord>, as_of: NaiveDate) -> Self {
        records.retain(|r| r.date <= as_of);
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Self { records }
    }

    pub fn records(&self) -> &[InstitutionalFlowRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&InstitutionalFlowRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Valuation and growth figures known as of a date. Either may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRecord {
    pub as_of: NaiveDate,
    pub valuation_ratio: Option<f64>,
    pub revenue_yoy_pct: Option<f64>,
}
