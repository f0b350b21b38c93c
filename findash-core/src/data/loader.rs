//! Startup data loading.
//!
//! Resolves the dashboard's prices once per process:
//! 1. If a snapshot is configured, present, intact and covers the universe → use it
//! 2. Otherwise fetch every ticker from the provider (one attempt each)
//! 3. Write the fresh data back to the snapshot, if one is configured
//!
//! Any ticker that cannot be fetched, or comes back without a usable price,
//! fails the whole load: the dashboard never starts on partial data.

use super::align::align_points;
use super::provider::{DataError, PricePoint, PriceProvider};
use super::snapshot::{Snapshot, SnapshotMeta};
use crate::domain::{PriceSeries, Ticker, Universe};
use crate::market::MarketData;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from the startup load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data unavailable for {ticker}: {reason}")]
    DataUnavailable { ticker: Ticker, reason: DataError },

    #[error("invalid load window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Options controlling how prices are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// First date requested from the provider.
    pub start: NaiveDate,
    /// Last date requested from the provider.
    pub end: NaiveDate,
    /// Ignore an existing snapshot and fetch.
    pub refresh: bool,
}

/// Load prices for `universe` and derive returns.
pub fn load_market_data(
    universe: &Universe,
    provider: &dyn PriceProvider,
    snapshot: Option<&Snapshot>,
    opts: &LoadOptions,
) -> Result<MarketData, LoadError> {
    if opts.start > opts.end {
        return Err(LoadError::InvalidWindow {
            start: opts.start,
            end: opts.end,
        });
    }

    if let Some(snap) = snapshot.filter(|_| !opts.refresh) {
        match snap.load(universe) {
            Ok(Some(data)) => {
                let s = data.summary();
                info!(
                    dir = %snap.dir().display(),
                    rows = s.price_rows,
                    first = ?s.first_date,
                    last = ?s.last_date,
                    "loaded prices from snapshot"
                );
                return Ok(data);
            }
            Ok(None) => info!(dir = %snap.dir().display(), "no snapshot yet, fetching"),
            Err(e) => warn!(dir = %snap.dir().display(), error = %e, "snapshot unusable, fetching"),
        }
    }

    let data = fetch_market_data(universe, provider, opts)?;

    if let Some(snap) = snapshot {
        // The snapshot is a convenience; failing to write it doesn't stop startup
        if let Err(e) = snap.write(&data) {
            warn!(dir = %snap.dir().display(), error = %e, "failed to write snapshot");
        } else {
            info!(dir = %snap.dir().display(), "snapshot written");
        }
    }

    Ok(data)
}

/// Fetch every ticker and rewrite `snapshot`.
///
/// Unlike [`load_market_data`], a failed write is an error: the snapshot on
/// disk must be the one just fetched.
pub fn refresh_snapshot(
    universe: &Universe,
    provider: &dyn PriceProvider,
    snapshot: &Snapshot,
    opts: &LoadOptions,
) -> Result<(MarketData, SnapshotMeta), LoadError> {
    if opts.start > opts.end {
        return Err(LoadError::InvalidWindow {
            start: opts.start,
            end: opts.end,
        });
    }

    let data = fetch_market_data(universe, provider, opts)?;
    let meta = snapshot.write(&data)?;
    info!(dir = %snapshot.dir().display(), rows = meta.price_rows, "snapshot rewritten");
    Ok((data, meta))
}

/// Fetch every ticker from `provider`, ignoring any snapshot.
pub fn fetch_market_data(
    universe: &Universe,
    provider: &dyn PriceProvider,
    opts: &LoadOptions,
) -> Result<MarketData, LoadError> {
    if provider.source() == super::provider::DataSource::Synthetic {
        warn!("using synthetic prices; charts do not reflect real markets");
    }

    let total = universe.len();
    let mut series: Vec<(Ticker, Vec<PricePoint>)> = Vec::with_capacity(total);

    for (i, ticker) in universe.tickers().iter().enumerate() {
        info!(%ticker, "[{}/{}] fetching from {}", i + 1, total, provider.name());

        let points = provider
            .fetch(ticker, opts.start, opts.end)
            .map_err(|reason| LoadError::DataUnavailable {
                ticker: ticker.clone(),
                reason,
            })?;

        let points = clean_points(ticker, points);
        if points.is_empty() {
            return Err(LoadError::DataUnavailable {
                ticker: ticker.clone(),
                reason: DataError::EmptyResponse {
                    ticker: ticker.clone(),
                },
            });
        }
        series.push((ticker.clone(), points));
    }

    let prices = PriceSeries::new(align_points(&series).map_err(DataError::from)?);
    let data = MarketData::new(universe.clone(), prices, provider.source());

    let s = data.summary();
    info!(
        source = provider.name(),
        rows = s.price_rows,
        first = ?s.first_date,
        last = ?s.last_date,
        "prices loaded"
    );
    Ok(data)
}

/// Drop points that cannot be a price (non-finite or non-positive).
fn clean_points(ticker: &Ticker, points: Vec<PricePoint>) -> Vec<PricePoint> {
    let before = points.len();
    let kept: Vec<PricePoint> = points
        .into_iter()
        .filter(|p| p.adj_close.is_finite() && p.adj_close > 0.0)
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        warn!(%ticker, dropped, "dropped invalid prices");
    }
    kept
}
