//! FinDash Web: Axum HTTP surface over an immutable [`findash_core::MarketData`].
//!
//! # Routes
//!
//! - `GET /` - dashboard page (selectors, two Plotly charts, table, CSV link)
//! - `GET /api/options` - tickers, metrics, date bounds, provenance
//! - `GET /api/view` - rendered line chart, box plot and table
//! - `GET /api/table.csv` - the table as a CSV attachment
//! - `GET /health` - liveness and row counts
//!
//! Every request renders from the shared `Arc<MarketData>`; nothing is
//! written after startup, so handlers take no locks.

pub mod app;
pub mod error;
pub mod routes;
pub mod state;

pub use app::{create_app, serve};
pub use error::{AppError, AppResult};
pub use state::AppState;
