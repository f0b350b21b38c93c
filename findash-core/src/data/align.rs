//! Multi-ticker time alignment.
//!
//! Given price points for several tickers, align them to the union of their
//! dates. A ticker without a point on some date gets `None` there; prices are
//! never forward-filled.

use super::provider::PricePoint;
use crate::domain::{FrameError, SeriesColumn, SeriesFrame, Ticker};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Align per-ticker points onto a common, ascending date axis.
///
/// Column order follows `series`. Points repeated on one date keep the last
/// value. Fails only when a ticker appears twice.
pub fn align_points(series: &[(Ticker, Vec<PricePoint>)]) -> Result<SeriesFrame, FrameError> {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .iter()
        .map(|(ticker, points)| {
            let by_date: HashMap<NaiveDate, f64> =
                points.iter().map(|p| (p.date, p.adj_close)).collect();
            SeriesColumn::new(
                ticker.clone(),
                dates.iter().map(|d| by_date.get(d).copied()).collect(),
            )
        })
        .collect();

    SeriesFrame::new(dates, columns)
}
