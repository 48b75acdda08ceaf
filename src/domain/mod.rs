//! Core domain types and logic.

pub mod backtest;
pub mod candidate;
pub mod config;
pub mod config_validation;
pub mod decision;
pub mod error;
pub mod exit;
pub mod flow;
pub mod gates;
pub mod indicator;
pub mod market;
pub mod metrics;
pub mod ohlcv;
pub mod pipeline;
pub mod position;
pub mod ranker;
pub mod universe;
