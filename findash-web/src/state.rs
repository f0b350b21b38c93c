//! Shared, read-only handler state.

use findash_core::{MarketData, ViewOptions};
use std::sync::Arc;

/// Cloned into every handler; the market data itself is never copied or
/// mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<MarketData>,
    pub options: ViewOptions,
}

impl AppState {
    pub fn new(data: MarketData, options: ViewOptions) -> Self {
        Self {
            data: Arc::new(data),
            options,
        }
    }
}
