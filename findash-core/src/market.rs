//! The loaded, immutable dashboard context.

use crate::data::provider::DataSource;
use crate::domain::{PriceSeries, ReturnSeries, Universe};
use crate::returns::compute_returns;
use chrono::NaiveDate;
use serde::Serialize;

/// Prices, the returns derived from them, and where they came from.
///
/// Built once at startup and shared read-only for the life of the process.
/// There are no setters: a new dataset means a new `MarketData`.
#[derive(Debug, Clone)]
pub struct MarketData {
    universe: Universe,
    prices: PriceSeries,
    returns: ReturnSeries,
    source: DataSource,
}

/// Summary used by status endpoints and log lines.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub source: DataSource,
    pub tickers: usize,
    pub price_rows: usize,
    pub return_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl MarketData {
    /// Derive returns from `prices`.
    pub fn new(universe: Universe, prices: PriceSeries, source: DataSource) -> Self {
        let returns = compute_returns(&prices);
        Self {
            universe,
            prices,
            returns,
            source,
        }
    }

    /// Assemble from a previously persisted price/return pair.
    ///
    /// The caller is responsible for the pair being consistent; the snapshot
    /// reader checks observation counts before calling this.
    pub fn from_parts(
        universe: Universe,
        prices: PriceSeries,
        returns: ReturnSeries,
        source: DataSource,
    ) -> Self {
        Self {
            universe,
            prices,
            returns,
            source,
        }
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    pub fn returns(&self) -> &ReturnSeries {
        &self.returns
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    /// Inclusive bounds of the price axis (returns start one session later).
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.prices.date_bounds()
    }

    pub fn summary(&self) -> MarketSummary {
        MarketSummary {
            source: self.source,
            tickers: self.universe.len(),
            price_rows: self.prices.len(),
            return_rows: self.returns.len(),
            first_date: self.prices.first_date(),
            last_date: self.prices.last_date(),
        }
    }
}
