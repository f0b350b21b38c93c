//! Snapshot persistence through the real loader, in both table formats.

use chrono::NaiveDate;
use findash_core::data::{
    load_market_data, DataError, DataSource, LoadOptions, PricePoint, PriceProvider, Snapshot,
    SnapshotFormat, SyntheticProvider,
};
use findash_core::domain::{Ticker, Universe};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn opts() -> LoadOptions {
    LoadOptions {
        start: d("2023-01-01"),
        end: d("2023-06-30"),
        refresh: false,
    }
}

/// Synthetic prices, counting how often the network would have been hit.
#[derive(Default)]
struct CountingProvider {
    inner: SyntheticProvider,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn source(&self) -> DataSource {
        self.inner.source()
    }

    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(ticker, start, end)
    }
}

fn round_trip(format: SnapshotFormat) {
    let dir = tempfile::tempdir().unwrap();
    let snap = Snapshot::new(dir.path(), format);
    let universe = Universe::default_dashboard();
    let provider = CountingProvider::default();

    let fetched = load_market_data(&universe, &provider, Some(&snap), &opts()).unwrap();
    assert_eq!(provider.calls(), universe.len());
    assert!(snap.prices_path().ends_with(format!("prices.{}", format.extension())));
    assert!(snap.exists());

    let meta = snap.meta().unwrap().unwrap();
    assert_eq!(meta.tickers, universe.tickers());
    assert_eq!(meta.price_rows, fetched.prices().len());
    assert_eq!(meta.return_rows, fetched.prices().len() - 1);
    assert_eq!(meta.source, DataSource::Synthetic);

    let loaded = load_market_data(&universe, &provider, Some(&snap), &opts()).unwrap();
    assert_eq!(provider.calls(), universe.len(), "second load must not fetch");
    assert_eq!(loaded.source(), DataSource::Snapshot);
    assert_eq!(loaded.prices(), fetched.prices());
    assert_eq!(loaded.returns().dates(), fetched.returns().dates());

    for (a, b) in loaded.returns().columns().iter().zip(fetched.returns().columns()) {
        assert_eq!(a.ticker, b.ticker);
        for (x, y) in a.values.iter().zip(&b.values) {
            match (x, y) {
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-12),
                (None, None) => {}
                other => panic!("cell mismatch for {}: {other:?}", a.ticker),
            }
        }
    }
}

#[test]
fn csv_round_trip() {
    round_trip(SnapshotFormat::Csv);
}

#[test]
fn parquet_round_trip() {
    round_trip(SnapshotFormat::Parquet);
}

#[test]
fn csv_snapshot_has_date_and_ticker_columns() {
    let dir = tempfile::tempdir().unwrap();
    let snap = Snapshot::new(dir.path(), SnapshotFormat::Csv);
    let universe = Universe::from_symbols(&["PG", "KO"]).unwrap();
    load_market_data(&universe, &SyntheticProvider::new(), Some(&snap), &opts()).unwrap();

    let prices = fs::read_to_string(snap.prices_path()).unwrap();
    assert_eq!(prices.lines().next().unwrap(), "Date,PG,KO");
    assert!(prices.lines().nth(1).unwrap().starts_with("2023-01-02,"));
}

#[test]
fn tampered_snapshot_is_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let snap = Snapshot::new(dir.path(), SnapshotFormat::Csv);
    let universe = Universe::from_symbols(&["PG", "KO"]).unwrap();
    let provider = CountingProvider::default();

    load_market_data(&universe, &provider, Some(&snap), &opts()).unwrap();
    assert_eq!(provider.calls(), 2);

    let mut prices = fs::read_to_string(snap.prices_path()).unwrap();
    prices.push_str("2099-01-01,1.0,1.0\n");
    fs::write(snap.prices_path(), prices).unwrap();
    assert!(snap.load(&universe).is_err());

    let data = load_market_data(&universe, &provider, Some(&snap), &opts()).unwrap();
    assert_eq!(provider.calls(), 4);
    assert_eq!(data.source(), DataSource::Synthetic);

    // The refetch rewrote a consistent snapshot
    assert!(snap.load(&universe).unwrap().is_some());
}

#[test]
fn snapshot_missing_a_ticker_is_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let snap = Snapshot::new(dir.path(), SnapshotFormat::Csv);
    let provider = CountingProvider::default();

    let narrow = Universe::from_symbols(&["PG"]).unwrap();
    load_market_data(&narrow, &provider, Some(&snap), &opts()).unwrap();

    let wide = Universe::from_symbols(&["PG", "KO"]).unwrap();
    assert!(snap.load(&wide).is_err());
    let data = load_market_data(&wide, &provider, Some(&snap), &opts()).unwrap();
    assert_eq!(provider.calls(), 3);
    assert_eq!(data.universe().len(), 2);
}

#[test]
fn subset_universe_reads_existing_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snap = Snapshot::new(dir.path(), SnapshotFormat::Csv);
    let provider = CountingProvider::default();

    load_market_data(&Universe::default_dashboard(), &provider, Some(&snap), &opts()).unwrap();
    let calls = provider.calls();

    let subset = Universe::from_symbols(&["CAT", "KO"]).unwrap();
    let data = load_market_data(&subset, &provider, Some(&snap), &opts()).unwrap();
    assert_eq!(provider.calls(), calls);
    let names: Vec<&str> = data.prices().tickers().map(|t| t.as_str()).collect();
    assert_eq!(names, vec!["CAT", "KO"]);
}

#[test]
fn format_mismatch_is_not_used() {
    let dir = tempfile::tempdir().unwrap();
    let universe = Universe::from_symbols(&["PG"]).unwrap();
    let csv = Snapshot::new(dir.path(), SnapshotFormat::Csv);
    load_market_data(&universe, &SyntheticProvider::new(), Some(&csv), &opts()).unwrap();

    let parquet = Snapshot::new(dir.path(), SnapshotFormat::Parquet);
    assert!(parquet.load(&universe).unwrap().is_none());
}

#[test]
fn sidecar_decides_table_format() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Snapshot::from_sidecar(dir.path()).unwrap().is_none());

    let universe = Universe::from_symbols(&["PG", "KO"]).unwrap();
    let parquet = Snapshot::new(dir.path(), SnapshotFormat::Parquet);
    load_market_data(&universe, &SyntheticProvider::new(), Some(&parquet), &opts()).unwrap();

    let (found, meta) = Snapshot::from_sidecar(dir.path()).unwrap().unwrap();
    assert_eq!(meta.format, SnapshotFormat::Parquet);
    assert_eq!(found.format(), SnapshotFormat::Parquet);
    assert_eq!(found.prices_path(), parquet.prices_path());
    assert!(found.prices_path().is_file());
    assert!(found.returns_path().is_file());
    assert!(found.load(&universe).unwrap().is_some());
}
