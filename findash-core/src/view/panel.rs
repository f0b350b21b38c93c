//! Chart panel specs handed to the front end.

use super::stats::BoxStats;
use crate::domain::{SeriesFrame, Ticker};
use chrono::NaiveDate;
use serde::Serialize;

/// Placeholder text shown when a selection produces no rows.
pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters";

/// A panel is either ready to draw or an explicit empty placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Panel<T> {
    Ready(T),
    NoData { message: String },
}

impl<T> Panel<T> {
    pub fn no_data() -> Self {
        Panel::NoData {
            message: NO_DATA_MESSAGE.to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Panel::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(spec) => Some(spec),
            Panel::NoData { .. } => None,
        }
    }
}

/// One line per ticker; dates without a value are left out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: Ticker,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChartSpec {
    pub title: String,
    pub y_label: String,
    pub series: Vec<LineSeries>,
}

impl LineChartSpec {
    pub fn from_frame(title: String, y_label: String, frame: &SeriesFrame) -> Self {
        let series = frame
            .columns()
            .iter()
            .map(|col| {
                let (x, y) = frame
                    .dates()
                    .iter()
                    .zip(&col.values)
                    .filter_map(|(d, v)| v.map(|v| (*d, v)))
                    .unzip();
                LineSeries {
                    name: col.ticker.clone(),
                    x,
                    y,
                }
            })
            .collect();
        Self {
            title,
            y_label,
            series,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxCategory {
    pub name: Ticker,
    pub values: Vec<f64>,
    pub stats: Option<BoxStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotSpec {
    pub title: String,
    pub y_label: String,
    pub categories: Vec<BoxCategory>,
}

impl BoxPlotSpec {
    pub fn from_frame(title: String, y_label: String, frame: &SeriesFrame) -> Self {
        let categories = frame
            .columns()
            .iter()
            .map(|col| {
                let values: Vec<f64> = col.values.iter().flatten().copied().collect();
                BoxCategory {
                    name: col.ticker.clone(),
                    stats: BoxStats::from_values(&values),
                    values,
                }
            })
            .collect();
        Self {
            title,
            y_label,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesColumn;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn t(s: &str) -> Ticker {
        Ticker::new(s).unwrap()
    }

    fn frame() -> SeriesFrame {
        SeriesFrame::new(
            vec![d(1), d(4), d(5)],
            vec![
                SeriesColumn::new(t("HON"), vec![Some(1.0), None, Some(3.0)]),
                SeriesColumn::new(t("CAT"), vec![Some(2.0), Some(2.5), Some(2.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn line_series_skip_gaps() {
        let spec = LineChartSpec::from_frame("t".into(), "y".into(), &frame());
        assert_eq!(spec.series.len(), 2);
        assert_eq!(spec.series[0].x, vec![d(1), d(5)]);
        assert_eq!(spec.series[0].y, vec![1.0, 3.0]);
        assert_eq!(spec.series[1].y.len(), 3);
    }

    #[test]
    fn box_categories_carry_stats() {
        let spec = BoxPlotSpec::from_frame("t".into(), "y".into(), &frame());
        assert_eq!(spec.categories[0].values, vec![1.0, 3.0]);
        let stats = spec.categories[1].stats.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.median, 2.0);
    }

    #[test]
    fn panel_serializes_with_status_tag() {
        let empty: Panel<LineChartSpec> = Panel::no_data();
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json["status"], "no_data");
        assert_eq!(json["message"], NO_DATA_MESSAGE);

        let ready = Panel::Ready(LineChartSpec::from_frame("T".into(), "Y".into(), &frame()));
        let json = serde_json::to_value(&ready).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["title"], "T");
        assert_eq!(json["series"][0]["name"], "HON");
        assert_eq!(json["series"][0]["x"][0], "2024-03-01");
    }
}
