//! Domain types for the dashboard

pub mod frame;
pub mod ticker;
pub mod universe;

pub use frame::{
    FrameError, DATE_COLUMN_LABEL, PriceSeries, ReturnSeries, SeriesColumn, SeriesFrame,
};
pub use ticker::{Ticker, TickerError};
pub use universe::{Universe, UniverseError, DEFAULT_TICKERS};
