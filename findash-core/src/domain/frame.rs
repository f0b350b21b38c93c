//! Wide, date-aligned value tables.
//!
//! A [`SeriesFrame`] holds one ascending date axis and, per ticker, one
//! optional value per date. `None` means the ticker has no observation on
//! that date (it was not trading yet, or the provider skipped the row).
//! Prices and returns share this layout; the [`PriceSeries`] and
//! [`ReturnSeries`] wrappers keep them from being mixed up.

use super::ticker::Ticker;
use chrono::NaiveDate;
use serde::Serialize;
use std::ops::{Deref, Range};
use thiserror::Error;

/// Header of the date column in every tabular rendering of a frame.
pub const DATE_COLUMN_LABEL: &str = "Date";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("column '{ticker}' has {actual} values but the frame has {expected} dates")]
    LengthMismatch {
        ticker: Ticker,
        expected: usize,
        actual: usize,
    },

    #[error("dates must be strictly ascending (found {next} after {prev})")]
    UnsortedDates { prev: NaiveDate, next: NaiveDate },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(Ticker),
}

/// One ticker's values along the frame's date axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesColumn {
    pub ticker: Ticker,
    pub values: Vec<Option<f64>>,
}

impl SeriesColumn {
    pub fn new(ticker: Ticker, values: Vec<Option<f64>>) -> Self {
        Self { ticker, values }
    }

    /// Number of dates that carry a value.
    pub fn observation_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Date-aligned table: `dates[i]` labels `column.values[i]` for every column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SeriesFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<SeriesColumn>,
}

impl SeriesFrame {
    /// Build a frame, checking that dates ascend strictly and every column
    /// matches the date axis.
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<SeriesColumn>) -> Result<Self, FrameError> {
        for w in dates.windows(2) {
            if w[0] >= w[1] {
                return Err(FrameError::UnsortedDates {
                    prev: w[0],
                    next: w[1],
                });
            }
        }
        for (i, col) in columns.iter().enumerate() {
            if col.values.len() != dates.len() {
                return Err(FrameError::LengthMismatch {
                    ticker: col.ticker.clone(),
                    expected: dates.len(),
                    actual: col.values.len(),
                });
            }
            if columns[..i].iter().any(|c| c.ticker == col.ticker) {
                return Err(FrameError::DuplicateColumn(col.ticker.clone()));
            }
        }
        Ok(Self { dates, columns })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[SeriesColumn] {
        &self.columns
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.columns.iter().map(|c| &c.ticker)
    }

    pub fn column(&self, ticker: &Ticker) -> Option<&SeriesColumn> {
        self.columns.iter().find(|c| &c.ticker == ticker)
    }

    /// Number of date rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Inclusive `(min, max)` of the date axis.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first_date()?, self.last_date()?))
    }

    /// Row indices whose dates fall inside `[start, end]`.
    pub fn row_range(&self, start: NaiveDate, end: NaiveDate) -> Range<usize> {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        lo..hi.max(lo)
    }

    /// Project onto `tickers` (in that order) and `rows`, then drop rows where
    /// none of the projected columns has a value. Tickers the frame does not
    /// carry are skipped.
    pub fn select(&self, tickers: &[Ticker], rows: Range<usize>) -> SeriesFrame {
        let rows = rows.start.min(self.len())..rows.end.min(self.len());
        let picked: Vec<&SeriesColumn> = tickers.iter().filter_map(|t| self.column(t)).collect();

        let keep: Vec<usize> = rows
            .filter(|&i| picked.iter().any(|c| c.values[i].is_some()))
            .collect();

        SeriesFrame {
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            columns: picked
                .into_iter()
                .map(|c| SeriesColumn {
                    ticker: c.ticker.clone(),
                    values: keep.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        }
    }

    /// Transform every column on the same date axis.
    ///
    /// `f` must return exactly one value per date.
    pub fn map_columns<F>(&self, f: F) -> SeriesFrame
    where
        F: Fn(&[Option<f64>]) -> Vec<Option<f64>>,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = f(&c.values);
                debug_assert_eq!(
                    values.len(),
                    self.dates.len(),
                    "map_columns changed column length"
                );
                SeriesColumn {
                    ticker: c.ticker.clone(),
                    values,
                }
            })
            .collect();
        SeriesFrame {
            dates: self.dates.clone(),
            columns,
        }
    }

    /// Drop rows on which every column is empty.
    pub fn compact(&self) -> SeriesFrame {
        let tickers: Vec<Ticker> = self.tickers().cloned().collect();
        self.select(&tickers, 0..self.len())
    }
}

/// Adjusted closing prices. Always the source the returns are derived from.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct PriceSeries(SeriesFrame);

impl PriceSeries {
    pub fn new(frame: SeriesFrame) -> Self {
        Self(frame)
    }

    pub fn frame(&self) -> &SeriesFrame {
        &self.0
    }
}

impl Deref for PriceSeries {
    type Target = SeriesFrame;

    fn deref(&self) -> &SeriesFrame {
        &self.0
    }
}

/// Simple daily returns derived from a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ReturnSeries(SeriesFrame);

impl ReturnSeries {
    pub fn new(frame: SeriesFrame) -> Self {
        Self(frame)
    }

    pub fn frame(&self) -> &SeriesFrame {
        &self.0
    }
}

impl Deref for ReturnSeries {
    type Target = SeriesFrame;

    fn deref(&self) -> &SeriesFrame {
        &self.0
    }
}
