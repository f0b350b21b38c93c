//! On-disk snapshot of the loaded prices and returns.
//!
//! Layout: `{dir}/prices.{csv|parquet}`, `{dir}/returns.{csv|parquet}` and a
//! `{dir}/meta.json` sidecar. Each table has a `Date` column followed by one
//! column per ticker; an empty cell means "no observation".
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - BLAKE3 hash of each table in the sidecar, checked on load
//! - Coverage check: a snapshot missing a configured ticker is not used
//!
//! There is no staleness policy. Once written, a snapshot is served until it
//! is deleted or a refresh is forced.

use super::provider::{DataError, DataSource};
use crate::domain::{
    PriceSeries, ReturnSeries, SeriesColumn, SeriesFrame, Ticker, Universe, DATE_COLUMN_LABEL,
};
use crate::market::MarketData;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File format of the two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Csv,
    Parquet,
}

impl SnapshotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SnapshotFormat::Csv => "csv",
            SnapshotFormat::Parquet => "parquet",
        }
    }
}

impl std::str::FromStr for SnapshotFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(SnapshotFormat::Csv),
            "parquet" => Ok(SnapshotFormat::Parquet),
            other => Err(format!("unknown snapshot format '{other}' (expected csv or parquet)")),
        }
    }
}

/// Metadata sidecar written next to the tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub tickers: Vec<Ticker>,
    pub format: SnapshotFormat,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub price_rows: usize,
    pub return_rows: usize,
    pub prices_hash: String,
    pub returns_hash: String,
    pub source: DataSource,
    pub written_at: chrono::NaiveDateTime,
}

/// A snapshot directory.
#[derive(Debug, Clone)]
pub struct Snapshot {
    dir: PathBuf,
    format: SnapshotFormat,
}

impl Snapshot {
    pub fn new(dir: impl Into<PathBuf>, format: SnapshotFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    pub fn prices_path(&self) -> PathBuf {
        self.dir.join(format!("prices.{}", self.format.extension()))
    }

    pub fn returns_path(&self) -> PathBuf {
        self.dir.join(format!("returns.{}", self.format.extension()))
    }

    pub fn meta_path(&self) -> PathBuf {
        self.dir.join("meta.json")
    }

    /// True when both tables and the sidecar are present.
    pub fn exists(&self) -> bool {
        self.meta_path().is_file() && self.prices_path().is_file() && self.returns_path().is_file()
    }

    /// Read the sidecar, if any.
    pub fn meta(&self) -> Result<Option<SnapshotMeta>, DataError> {
        let path = self.meta_path();
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| DataError::Snapshot(format!("read {}: {e}", path.display())))?;
        let meta = serde_json::from_str(&content)
            .map_err(|e| DataError::Snapshot(format!("parse {}: {e}", path.display())))?;
        Ok(Some(meta))
    }

    /// Open whatever snapshot is in `dir`, taking the format from its sidecar.
    pub fn from_sidecar(
        dir: impl Into<PathBuf>,
    ) -> Result<Option<(Self, SnapshotMeta)>, DataError> {
        let probe = Self::new(dir, SnapshotFormat::default());
        let Some(meta) = probe.meta()? else {
            return Ok(None);
        };
        let snapshot = Self::new(probe.dir, meta.format);
        Ok(Some((snapshot, meta)))
    }

    /// Persist both tables and the sidecar.
    pub fn write(&self, data: &MarketData) -> Result<SnapshotMeta, DataError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| DataError::Snapshot(format!("failed to create dir: {e}")))?;

        let prices_path = self.prices_path();
        let returns_path = self.returns_path();
        self.write_table(data.prices(), &prices_path)?;
        self.write_table(data.returns(), &returns_path)?;

        let meta = SnapshotMeta {
            tickers: data.universe().tickers().to_vec(),
            format: self.format,
            first_date: data.prices().first_date(),
            last_date: data.prices().last_date(),
            price_rows: data.prices().len(),
            return_rows: data.returns().len(),
            prices_hash: hash_file(&prices_path)?,
            returns_hash: hash_file(&returns_path)?,
            source: data.source(),
            written_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::Snapshot(format!("meta serialization: {e}")))?;
        atomic_write(&self.meta_path(), |path| {
            fs::write(path, &meta_json).map_err(|e| DataError::Snapshot(format!("meta write: {e}")))
        })?;

        debug!(dir = %self.dir.display(), rows = meta.price_rows, "snapshot written");
        Ok(meta)
    }

    /// Load the snapshot for `universe`.
    ///
    /// `Ok(None)` when there is nothing on disk. An `Err` means a snapshot is
    /// present but unusable (hash mismatch, missing ticker, unreadable table,
    /// inconsistent returns); callers fall back to fetching.
    pub fn load(&self, universe: &Universe) -> Result<Option<MarketData>, DataError> {
        if !self.exists() {
            return Ok(None);
        }
        let Some(meta) = self.meta()? else {
            return Ok(None);
        };
        if meta.format != self.format {
            return Err(DataError::Snapshot(format!(
                "sidecar says {:?} but {:?} was requested",
                meta.format, self.format
            )));
        }
        if let Some(missing) = universe.tickers().iter().find(|t| !meta.tickers.contains(t)) {
            return Err(DataError::Snapshot(format!("snapshot does not cover {missing}")));
        }

        let prices_path = self.prices_path();
        let returns_path = self.returns_path();
        verify_hash(&prices_path, &meta.prices_hash)?;
        verify_hash(&returns_path, &meta.returns_hash)?;

        let prices = read_table(&prices_path, self.format)?;
        let returns = read_table(&returns_path, self.format)?;

        let tickers = universe.tickers();
        let prices = project(&prices, tickers, &prices_path)?;
        let returns = project(&returns, tickers, &returns_path)?;

        for t in tickers {
            let p = prices.column(t).map(|c| c.observation_count()).unwrap_or(0);
            let r = returns.column(t).map(|c| c.observation_count()).unwrap_or(0);
            if p == 0 || r + 1 != p {
                return Err(DataError::Snapshot(format!(
                    "{t}: {p} prices but {r} returns in snapshot"
                )));
            }
        }

        Ok(Some(MarketData::from_parts(
            universe.clone(),
            PriceSeries::new(prices),
            ReturnSeries::new(returns),
            DataSource::Snapshot,
        )))
    }

    fn write_table(&self, frame: &SeriesFrame, path: &Path) -> Result<(), DataError> {
        let mut df = frame_to_dataframe(frame)?;
        let format = self.format;
        atomic_write(path, |tmp| {
            let file = fs::File::create(tmp)
                .map_err(|e| DataError::Snapshot(format!("create file: {e}")))?;
            match format {
                SnapshotFormat::Csv => {
                    CsvWriter::new(file)
                        .include_header(true)
                        .finish(&mut df)
                        .map_err(|e| DataError::Snapshot(format!("write csv: {e}")))?;
                }
                SnapshotFormat::Parquet => {
                    ParquetWriter::new(file)
                        .finish(&mut df)
                        .map_err(|e| DataError::Snapshot(format!("write parquet: {e}")))?;
                }
            }
            Ok(())
        })
    }
}

/// Write through `{path}.tmp` and rename into place.
fn atomic_write<F>(path: &Path, write: F) -> Result<(), DataError>
where
    F: FnOnce(&Path) -> Result<(), DataError>,
{
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Err(e) = write(&tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::Snapshot(format!("atomic rename failed: {e}"))
    })
}

fn hash_file(path: &Path) -> Result<String, DataError> {
    let bytes = fs::read(path)
        .map_err(|e| DataError::Snapshot(format!("read {}: {e}", path.display())))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn verify_hash(path: &Path, expected: &str) -> Result<(), DataError> {
    let actual = hash_file(path)?;
    if actual != expected {
        return Err(DataError::Snapshot(format!(
            "{} changed since it was written (hash mismatch)",
            path.display()
        )));
    }
    Ok(())
}

/// Keep the universe's columns in universe order.
fn project(frame: &SeriesFrame, tickers: &[Ticker], path: &Path) -> Result<SeriesFrame, DataError> {
    if let Some(missing) = tickers.iter().find(|t| frame.column(t).is_none()) {
        return Err(DataError::Snapshot(format!(
            "{} has no column for {missing}",
            path.display()
        )));
    }
    Ok(frame.select(tickers, 0..frame.len()))
}

// ── DataFrame conversion ────────────────────────────────────────────

fn epoch() -> NaiveDate {
    // NaiveDate's default is 1970-01-01
    NaiveDate::default()
}

/// Convert a frame to a Polars DataFrame (`Date` + one f64 column per ticker).
pub fn frame_to_dataframe(frame: &SeriesFrame) -> Result<DataFrame, DataError> {
    let epoch = epoch();
    let days: Vec<i32> = frame
        .dates()
        .iter()
        .map(|d| (*d - epoch).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(frame.columns().len() + 1);
    columns.push(
        Column::new(DATE_COLUMN_LABEL.into(), days)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Snapshot(format!("date cast: {e}")))?,
    );
    for col in frame.columns() {
        columns.push(Column::new(col.ticker.as_str().into(), col.values.clone()));
    }

    DataFrame::new(columns).map_err(|e| DataError::Snapshot(format!("dataframe creation: {e}")))
}

/// Convert a DataFrame with a `Date` column back into a frame.
pub fn dataframe_to_frame(df: &DataFrame) -> Result<SeriesFrame, DataError> {
    let map_err = |e: PolarsError| DataError::Snapshot(format!("column read: {e}"));

    let date_col = df.column(DATE_COLUMN_LABEL).map_err(map_err)?;
    let n = df.height();
    let epoch = epoch();

    let mut dates = Vec::with_capacity(n);
    match date_col.dtype() {
        DataType::Date => {
            let ca = date_col.date().map_err(map_err)?;
            for i in 0..n {
                let days = ca
                    .get(i)
                    .ok_or_else(|| DataError::Snapshot(format!("null date at row {i}")))?;
                dates.push(epoch + chrono::Duration::days(i64::from(days)));
            }
        }
        DataType::String => {
            let ca = date_col.as_materialized_series().str().map_err(map_err)?;
            for i in 0..n {
                let raw = ca
                    .get(i)
                    .ok_or_else(|| DataError::Snapshot(format!("null date at row {i}")))?;
                let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                    DataError::Snapshot(format!("bad date '{raw}' at row {i}: {e}"))
                })?;
                dates.push(date);
            }
        }
        other => {
            return Err(DataError::Snapshot(format!(
                "unexpected {DATE_COLUMN_LABEL} column type {other:?}"
            )))
        }
    }

    let mut columns = Vec::new();
    for name in df.get_column_names() {
        if name.as_str() == DATE_COLUMN_LABEL {
            continue;
        }
        let ticker = Ticker::new(name.as_str())
            .map_err(|e| DataError::Snapshot(format!("column header: {e}")))?;
        let values = df
            .column(name.as_str())
            .and_then(|c| c.cast(&DataType::Float64))
            .map_err(map_err)?;
        let ca = values.f64().map_err(map_err)?;
        columns.push(SeriesColumn::new(ticker, ca.into_iter().collect()));
    }

    Ok(SeriesFrame::new(dates, columns)?)
}

fn read_table(path: &Path, format: SnapshotFormat) -> Result<SeriesFrame, DataError> {
    let df = match format {
        SnapshotFormat::Csv => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| DataError::Snapshot(format!("read {}: {e}", path.display())))?,
        SnapshotFormat::Parquet => {
            let file = fs::File::open(path)
                .map_err(|e| DataError::Snapshot(format!("open {}: {e}", path.display())))?;
            ParquetReader::new(file)
                .finish()
                .map_err(|e| DataError::Snapshot(format!("read {}: {e}", path.display())))?
        }
    };
    dataframe_to_frame(&df)
}
