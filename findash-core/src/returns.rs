//! Daily simple returns.
//!
//! `r[t] = p[t] / p[prev] - 1` where `prev` is the ticker's previous observed
//! date. The first observation of every ticker has no return, so each column
//! ends up with exactly one fewer value than its price column. Date rows on
//! which no ticker has a return are dropped.

use crate::domain::{PriceSeries, ReturnSeries};

/// Derive the return series from prices. Pure; never fails.
pub fn compute_returns(prices: &PriceSeries) -> ReturnSeries {
    ReturnSeries::new(prices.map_columns(pct_change).compact())
}

/// Percentage change against the previous present value; gaps are skipped.
fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut prev: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            let v = (*v)?;
            let r = prev.map(|p| v / p - 1.0);
            prev = Some(v);
            r
        })
        .collect()
}
