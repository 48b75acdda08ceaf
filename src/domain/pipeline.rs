//! Daily screening pipeline.
//!
//! Per candidate, in order: Liquidity, Trend, Chips, Valuation, Sizing. The
//! first rejection ends the candidate; later stages, including their flow and
//! fundamentals lookups, never run. Candidates are independent and are
//! evaluated on the rayon pool.

use crate::domain::candidate::{Candidate, IndicatorSet};
use crate::domain::config::ScreenerConfig;
use crate::domain::decision::Decision;
use crate::domain::error::ScreenerError;
use crate::domain::flow::FlowHistory;
use crate::domain::gates::regime::{self, RegimeAssessment};
use crate::domain::gates::{chips, liquidity, sizing, trend, valuation, RejectReason, Stage};
use crate::domain::market::MarketSnapshot;
use crate::domain::ohlcv::clip_to_as_of;
use crate::domain::ranker;
use crate::domain::universe;
use crate::ports::data_port::Providers;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub ticker: String,
    pub stage: Stage,
    pub reason: RejectReason,
}

/// A candidate whose provider lookups failed. Other candidates are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFailure {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub date: NaiveDate,
    pub regime: RegimeAssessment,
    /// Ranked, at most `top_n`.
    pub decisions: Vec<Decision>,
    /// Candidates that passed every gate but fell outside `top_n`.
    pub unranked: usize,
    pub rejections: Vec<Rejection>,
    pub failures: Vec<CandidateFailure>,
}

enum Evaluation {
    Accepted(Box<Decision>),
    Rejected(Rejection),
    Failed(CandidateFailure),
}

pub fn scan(
    date: NaiveDate,
    config: &ScreenerConfig,
    providers: &Providers<'_>,
) -> Result<ScanOutcome, ScreenerError> {
    config.validate()?;
    let snapshot = providers
        .market
        .get_snapshot(date)?
        .ok_or_else(|| ScreenerError::ProviderGap {
            what: "snapshot".into(),
            date,
        })?;
    scan_snapshot(&snapshot, config, providers)
}

/// Scans an already fetched snapshot. `config` must be validated.
pub fn scan_snapshot(
    snapshot: &MarketSnapshot,
    config: &ScreenerConfig,
    providers: &Providers<'_>,
) -> Result<ScanOutcome, ScreenerError> {
    let date = snapshot.date;
    let index = providers
        .market
        .get_index_history(date, config.regime.index_ma_window)?;
    let regime = regime::assess(snapshot, &index, config);

    if regime.status.is_danger() {
        let reasons: Vec<String> = regime.reasons.iter().map(|r| r.to_string()).collect();
        info!(%date, reasons = ?reasons, "market regime DANGER, no candidates screened");
        return Ok(ScanOutcome {
            date,
            regime,
            decisions: Vec::new(),
            unranked: 0,
            rejections: Vec::new(),
            failures: Vec::new(),
        });
    }

    let selection = universe::select(snapshot, &config.universe);
    let mut rejections: Vec<Rejection> = selection
        .excluded
        .into_iter()
        .map(|e| Rejection {
            ticker: e.ticker,
            stage: Stage::Universe,
            reason: RejectReason::ExcludedPrefix { prefix: e.prefix },
        })
        .collect();

    let tickers = &selection.universe.tickers;
    let evaluations: Vec<Evaluation> = if config.parallel {
        tickers
            .par_iter()
            .map(|t| evaluate_ticker(t, snapshot, config, providers))
            .collect()
    } else {
        tickers
            .iter()
            .map(|t| evaluate_ticker(t, snapshot, config, providers))
            .collect()
    };

    let mut accepted = Vec::new();
    let mut failures = Vec::new();
    for evaluation in evaluations {
        match evaluation {
            Evaluation::Accepted(decision) => accepted.push(*decision),
            Evaluation::Rejected(rejection) => rejections.push(rejection),
            Evaluation::Failed(failure) => failures.push(failure),
        }
    }

    let passed = accepted.len();
    let decisions = ranker::rank(accepted, config.top_n);

    info!(
        %date,
        universe = tickers.len(),
        passed,
        ranked = decisions.len(),
        rejected = rejections.len(),
        failed = failures.len(),
        "scan complete"
    );

    Ok(ScanOutcome {
        date,
        regime,
        unranked: passed - decisions.len(),
        decisions,
        rejections,
        failures,
    })
}

fn evaluate_ticker(
    ticker: &str,
    snapshot: &MarketSnapshot,
    config: &ScreenerConfig,
    providers: &Providers<'_>,
) -> Evaluation {
    match run_gates(ticker, snapshot, config, providers) {
        Ok(Ok(decision)) => Evaluation::Accepted(Box::new(decision)),
        Ok(Err((stage, reason))) => {
            debug!(ticker, %stage, %reason, "candidate rejected");
            Evaluation::Rejected(Rejection {
                ticker: ticker.to_string(),
                stage,
                reason,
            })
        }
        Err(e) => {
            warn!(ticker, error = %e, "candidate evaluation failed");
            Evaluation::Failed(CandidateFailure {
                ticker: ticker.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

type GateResult = Result<Decision, (Stage, RejectReason)>;

fn run_gates(
    ticker: &str,
    snapshot: &MarketSnapshot,
    config: &ScreenerConfig,
    providers: &Providers<'_>,
) -> Result<GateResult, ScreenerError> {
    let date = snapshot.date;
    let quote = snapshot.quote(ticker).ok_or_else(|| ScreenerError::ProviderGap {
        what: format!("quote for {}", ticker),
        date,
    })?;

    let mut bars = providers
        .prices
        .get_history(ticker, date, config.history_lookback)?;
    let leaked = clip_to_as_of(&mut bars, date);
    if leaked > 0 {
        warn!(ticker, %date, leaked, "discarded bars dated after the scan date");
    }
    if bars.last().is_none_or(|b| b.date < date) {
        bars.push(quote.clone());
    }

    let indicators = IndicatorSet::compute(quote, &bars, config);
    let mut candidate = Candidate::new(ticker, date, indicators);

    let verdict = liquidity::evaluate(&candidate.indicators, &config.liquidity);
    if let Err(reason) = candidate.apply(verdict) {
        return Ok(Err((Stage::Liquidity, reason)));
    }
    let verdict = trend::evaluate(&candidate.indicators, config);
    if let Err(reason) = candidate.apply(verdict) {
        return Ok(Err((Stage::Trend, reason)));
    }

    let flow = providers
        .flows
        .get_flow(ticker, date, config.chips.lookback_days)?;
    let flow = FlowHistory::from_records(flow.records().to_vec(), date);
    let summary = chips::summarize(&flow);
    if let Err(reason) = candidate.apply(chips::evaluate(&summary, &config.chips)) {
        return Ok(Err((Stage::Chips, reason)));
    }
    candidate.chips = Some(summary);

    if config.valuation.enabled {
        candidate.fundamentals = providers
            .fundamentals
            .get_latest(ticker, date)?
            .filter(|f| f.as_of <= date);
    }
    let verdict = valuation::evaluate(candidate.fundamentals.as_ref(), &config.valuation);
    if let Err(reason) = candidate.apply(verdict) {
        return Ok(Err((Stage::Valuation, reason)));
    }

    let allocation = match sizing::size(candidate.score, &config.sizing) {
        Ok(allocation) => allocation,
        Err(reason) => return Ok(Err((Stage::Sizing, reason))),
    };

    Ok(Ok(Decision::from_candidate(candidate, allocation, &config.risk)))
}
