//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over data sources (Yahoo Finance, the
//! synthetic generator) so the loader can be exercised without a network.

use crate::domain::{FrameError, Ticker};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One adjusted closing price as delivered by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, adj_close: f64) -> Self {
        Self { date, adj_close }
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable in both CLI and HTTP contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} for {ticker}")]
    Http { ticker: Ticker, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {ticker}")]
    SymbolNotFound { ticker: Ticker },

    #[error("provider returned no usable rows for {ticker}")]
    EmptyResponse { ticker: Ticker },

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("validation error: {0}")]
    Validation(String),
}

impl From<FrameError> for DataError {
    fn from(e: FrameError) -> Self {
        DataError::Validation(e.to_string())
    }
}

/// Where the loaded data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    Snapshot,
    Synthetic,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::YahooFinance => "Yahoo Finance",
            DataSource::Snapshot => "local snapshot",
            DataSource::Synthetic => "synthetic (demo) data",
        }
    }
}

/// Trait for price providers.
///
/// Implementations handle the specifics of one source. The snapshot layer
/// sits above this trait; providers don't know about it.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Provenance tag recorded on data this provider produced.
    fn source(&self) -> DataSource;

    /// Fetch daily adjusted closes for one ticker over `[start, end]`.
    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError>;
}
