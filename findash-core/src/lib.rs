//! FinDash Core: market data loading, return derivation and view rendering.
//!
//! This crate holds everything the dashboard does that is not HTTP:
//! - Domain types (tickers, universe, date-aligned series frames)
//! - Price providers (Yahoo Finance chart API, deterministic synthetic walk)
//! - Snapshot persistence (CSV or Parquet tables with a BLAKE3 sidecar)
//! - Startup loader that builds the immutable [`market::MarketData`]
//! - Pure `render` from a selection to line, box-plot and table panels

pub mod config;
pub mod data;
pub mod domain;
pub mod market;
pub mod returns;
pub mod view;

pub use config::{ConfigError, DashboardConfig, ServerConfig};
pub use market::{MarketData, MarketSummary};
pub use view::{render, Metric, RenderedView, Selection, ViewOptions};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across request handlers is
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<MarketData>();
        require_sync::<MarketData>();
        require_send::<RenderedView>();
        require_sync::<RenderedView>();
        require_send::<DashboardConfig>();
        require_sync::<DashboardConfig>();
        require_send::<data::Snapshot>();
        require_sync::<data::Snapshot>();

        // Providers are used behind &dyn
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
    }
}
