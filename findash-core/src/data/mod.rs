//! Data providers, alignment, snapshots and the startup loader

pub mod align;
pub mod loader;
pub mod provider;
pub mod snapshot;
pub mod synthetic;
pub mod yahoo;

pub use align::align_points;
pub use loader::{
    fetch_market_data, load_market_data, refresh_snapshot, LoadError, LoadOptions,
};
pub use provider::{DataError, DataSource, PricePoint, PriceProvider};
pub use snapshot::{Snapshot, SnapshotFormat, SnapshotMeta};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
