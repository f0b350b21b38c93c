//! Interactive view: selection in, three panels out.
//!
//! [`render`] is a pure function of the loaded [`MarketData`] and a
//! [`Selection`]. It never fails: a selection that leaves no rows renders
//! every panel as [`Panel::NoData`].

pub mod panel;
pub mod stats;
pub mod table;

pub use panel::{BoxCategory, BoxPlotSpec, LineChartSpec, LineSeries, Panel, NO_DATA_MESSAGE};
pub use stats::{percentile_sorted, BoxStats};
pub use table::{ExportError, TableRow, TableSpec};

use crate::domain::{SeriesFrame, Ticker};
use crate::market::MarketData;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

// ── Selection ──────────────────────────────────────────────────────

/// Which series the panels show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Price,
    Return,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Price, Metric::Return];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Price => "price",
            Metric::Return => "return",
        }
    }

    /// Label used in titles and axes.
    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Price => "Closing Price",
            Metric::Return => "Daily Returns",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric '{0}' (expected 'price' or 'return')")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" | "prices" => Ok(Metric::Price),
            "return" | "returns" => Ok(Metric::Return),
            _ => Err(UnknownMetric(s.to_string())),
        }
    }
}

/// What the user picked in the selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Empty means every ticker in the universe.
    pub tickers: Vec<Ticker>,
    pub metric: Metric,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Selection {
    /// Every ticker, full range.
    pub fn all(metric: Metric) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }
}

/// Render-time switches that come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// When false the selection's dates are ignored.
    pub enable_date_filter: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            enable_date_filter: true,
        }
    }
}

// ── Output ─────────────────────────────────────────────────────────

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One `(date, ticker, value)` observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    pub date: NaiveDate,
    pub ticker: Ticker,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedView {
    pub metric: Metric,
    /// Tickers the panels were built for, after resolution.
    pub tickers: Vec<Ticker>,
    /// Resolved date range; `None` when the range is empty.
    pub range: Option<DateRange>,
    pub line_chart: Panel<LineChartSpec>,
    pub box_plot: Panel<BoxPlotSpec>,
    pub table: Panel<TableSpec>,
}

impl RenderedView {
    fn no_data(metric: Metric, tickers: Vec<Ticker>, range: Option<DateRange>) -> Self {
        Self {
            metric,
            tickers,
            range,
            line_chart: Panel::no_data(),
            box_plot: Panel::no_data(),
            table: Panel::no_data(),
        }
    }

    /// True when the selection produced no rows.
    pub fn is_empty(&self) -> bool {
        !self.table.is_ready()
    }
}

// ── Render ─────────────────────────────────────────────────────────

/// Build the three panels for `selection`.
pub fn render(data: &MarketData, selection: &Selection, options: &ViewOptions) -> RenderedView {
    let metric = selection.metric;
    let tickers = data.universe().resolve(&selection.tickers);

    let source: &SeriesFrame = match metric {
        Metric::Price => data.prices(),
        Metric::Return => data.returns(),
    };

    let range = resolve_range(source, selection, options);
    let frame = match range {
        Some(r) => source.select(&tickers, source.row_range(r.start, r.end)),
        None => SeriesFrame::default(),
    };

    if frame.is_empty() {
        debug!(metric = metric.as_str(), tickers = tickers.len(), "render: no data");
        return RenderedView::no_data(metric, tickers, range);
    }

    let names: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();
    let title = format!("{} for {}", metric.display_name(), names.join(", "));
    let box_title = format!("Distribution of {} by Ticker", metric.display_name());
    let y_label = metric.display_name().to_string();

    debug!(
        metric = metric.as_str(),
        tickers = tickers.len(),
        rows = frame.len(),
        "render"
    );

    RenderedView {
        metric,
        line_chart: Panel::Ready(LineChartSpec::from_frame(title, y_label.clone(), &frame)),
        box_plot: Panel::Ready(BoxPlotSpec::from_frame(box_title, y_label, &frame)),
        table: Panel::Ready(TableSpec::from_frame(&frame)),
        tickers,
        range,
    }
}

/// Clamp the requested dates to what `source` covers.
///
/// With the date filter off the full range is used. Returns `None` when the
/// source is empty or the clamped range is inverted (which also covers a
/// request entirely outside the data).
fn resolve_range(
    source: &SeriesFrame,
    selection: &Selection,
    options: &ViewOptions,
) -> Option<DateRange> {
    let (min, max) = source.date_bounds()?;
    if !options.enable_date_filter {
        return Some(DateRange { start: min, end: max });
    }
    let start = selection.start.unwrap_or(min).max(min);
    let end = selection.end.unwrap_or(max).min(max);
    (start <= end).then_some(DateRange { start, end })
}

/// Reshape a wide frame into `(date, ticker, value)` records, date-major,
/// skipping missing values.
pub fn long_form(frame: &SeriesFrame) -> Vec<LongRecord> {
    frame
        .dates()
        .iter()
        .enumerate()
        .flat_map(|(i, &date)| {
            frame.columns().iter().filter_map(move |col| {
                col.values[i].map(|value| LongRecord {
                    date,
                    ticker: col.ticker.clone(),
                    value,
                })
            })
        })
        .collect()
}
