//! Route handlers.
//!
//! - [`page`]: the HTML dashboard
//! - [`view`]: options, rendered view and CSV export
//! - [`health`]: liveness with row counts

pub mod health;
pub mod page;
pub mod view;
