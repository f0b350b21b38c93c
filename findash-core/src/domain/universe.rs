//! Universe configuration: the fixed, ordered ticker list the dashboard serves.
//!
//! The universe is decided at startup (defaults or the config file) and is
//! never extended at runtime. Its order is the display order for "all tickers".

use super::ticker::{Ticker, TickerError};
use serde::Serialize;
use thiserror::Error;

/// Symbols shown when no configuration overrides them.
pub const DEFAULT_TICKERS: [&str; 6] = ["PG", "KO", "PEP", "MMM", "HON", "CAT"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniverseError {
    #[error("universe must contain at least one ticker")]
    Empty,

    #[error("duplicate ticker in universe: {0}")]
    Duplicate(Ticker),

    #[error(transparent)]
    InvalidTicker(#[from] TickerError),
}

/// The configured ticker set, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Universe {
    tickers: Vec<Ticker>,
}

impl Universe {
    pub fn new(tickers: Vec<Ticker>) -> Result<Self, UniverseError> {
        if tickers.is_empty() {
            return Err(UniverseError::Empty);
        }
        for (i, t) in tickers.iter().enumerate() {
            if tickers[..i].contains(t) {
                return Err(UniverseError::Duplicate(t.clone()));
            }
        }
        Ok(Self { tickers })
    }

    /// Parse and validate raw symbols.
    pub fn from_symbols<S: AsRef<str>>(symbols: &[S]) -> Result<Self, UniverseError> {
        let tickers = symbols
            .iter()
            .map(|s| Ticker::new(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tickers)
    }

    /// The six consumer/industrial names the dashboard ships with.
    pub fn default_dashboard() -> Self {
        Self {
            tickers: DEFAULT_TICKERS
                .iter()
                .map(|s| Ticker(s.to_string()))
                .collect(),
        }
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.tickers.contains(ticker)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Keep only members of the universe, de-duplicated, in the requested order.
    ///
    /// An empty request means "everything" and yields the full universe.
    pub fn resolve(&self, requested: &[Ticker]) -> Vec<Ticker> {
        if requested.is_empty() {
            return self.tickers.clone();
        }
        let mut out: Vec<Ticker> = Vec::with_capacity(requested.len());
        for t in requested {
            if self.contains(t) && !out.contains(t) {
                out.push(t.clone());
            }
        }
        out
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::default_dashboard()
    }
}
