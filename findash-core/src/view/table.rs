//! Tabular panel and its CSV export.

use crate::domain::{SeriesFrame, DATE_COLUMN_LABEL};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One date row; `values` follows the table's ticker columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// `Date` followed by one column per selected ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSpec {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl TableSpec {
    pub fn from_frame(frame: &SeriesFrame) -> Self {
        let mut columns = Vec::with_capacity(frame.columns().len() + 1);
        columns.push(DATE_COLUMN_LABEL.to_string());
        columns.extend(frame.tickers().map(|t| t.to_string()));

        let rows = frame
            .dates()
            .iter()
            .enumerate()
            .map(|(i, &date)| TableRow {
                date,
                values: frame.columns().iter().map(|c| c.values[i]).collect(),
            })
            .collect();

        Self { columns, rows }
    }

    /// Export as CSV: `%Y-%m-%d` dates, shortest round-trip floats, empty
    /// cell for a missing value.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(&self.columns)?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.date.format("%Y-%m-%d").to_string());
            record.extend(
                row.values
                    .iter()
                    .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }

        let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}
