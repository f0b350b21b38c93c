//! End-to-end view scenarios on the six-ticker synthetic dashboard.

use chrono::NaiveDate;
use findash_core::data::{fetch_market_data, LoadOptions, SyntheticProvider};
use findash_core::domain::{Ticker, Universe};
use findash_core::view::{long_form, render, Metric, Panel, Selection, ViewOptions, NO_DATA_MESSAGE};
use findash_core::MarketData;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn t(s: &str) -> Ticker {
    Ticker::new(s).unwrap()
}

fn dashboard() -> MarketData {
    let opts = LoadOptions {
        start: d("2024-01-01"),
        end: d("2024-12-31"),
        refresh: false,
    };
    fetch_market_data(&Universe::default_dashboard(), &SyntheticProvider::new(), &opts).unwrap()
}

#[test]
fn pg_ko_price_full_range() {
    let data = dashboard();
    let selection = Selection {
        tickers: vec![t("PG"), t("KO")],
        metric: Metric::Price,
        ..Selection::default()
    };
    let view = render(&data, &selection, &ViewOptions::default());

    let table = view.table.ready().expect("table");
    assert_eq!(table.columns, vec!["Date", "PG", "KO"]);
    assert_eq!(table.rows.len(), data.prices().len());

    let line = view.line_chart.ready().expect("line chart");
    assert_eq!(line.series.len(), 2);
    assert_eq!(line.title, "Closing Price for PG, KO");
    assert_eq!(line.y_label, "Closing Price");

    let boxes = view.box_plot.ready().expect("box plot");
    assert_eq!(boxes.categories.len(), 2);
    assert_eq!(boxes.categories[0].name, t("PG"));
    assert_eq!(boxes.categories[0].stats.unwrap().count, data.prices().len());
}

#[test]
fn empty_tickers_return_is_full_universe() {
    let data = dashboard();
    let opts = ViewOptions::default();

    let empty = render(&data, &Selection::all(Metric::Return), &opts);
    let full = render(
        &data,
        &Selection {
            tickers: Universe::default_dashboard().tickers().to_vec(),
            metric: Metric::Return,
            ..Selection::default()
        },
        &opts,
    );
    assert_eq!(empty, full);

    let line = empty.line_chart.ready().unwrap();
    assert_eq!(line.title, "Daily Returns for PG, KO, PEP, MMM, HON, CAT");
    assert_eq!(
        empty.box_plot.ready().unwrap().title,
        "Distribution of Daily Returns by Ticker"
    );
    assert_eq!(empty.table.ready().unwrap().rows.len(), data.prices().len() - 1);
}

#[test]
fn date_picker_bounds_clamp() {
    let data = dashboard();
    let (min, max) = data.date_bounds().unwrap();
    let selection = Selection {
        start: Some(d("2000-01-01")),
        end: Some(d("2100-01-01")),
        ..Selection::all(Metric::Price)
    };
    let view = render(&data, &selection, &ViewOptions::default());
    let range = view.range.unwrap();
    assert_eq!((range.start, range.end), (min, max));
}

#[test]
fn weekend_only_range_is_no_data() {
    let data = dashboard();
    // 2024-06-08/09 is a weekend; the synthetic calendar skips it
    let selection = Selection {
        start: Some(d("2024-06-08")),
        end: Some(d("2024-06-09")),
        ..Selection::all(Metric::Price)
    };
    let view = render(&data, &selection, &ViewOptions::default());
    match &view.line_chart {
        Panel::NoData { message } => assert_eq!(message, NO_DATA_MESSAGE),
        Panel::Ready(_) => panic!("line chart should be empty"),
    }
    assert!(!view.table.is_ready());
    assert!(!view.box_plot.is_ready());
}

#[test]
fn table_csv_matches_rendered_rows() {
    let data = dashboard();
    let selection = Selection {
        tickers: vec![t("MMM")],
        start: Some(d("2024-03-01")),
        end: Some(d("2024-03-31")),
        metric: Metric::Return,
    };
    let view = render(&data, &selection, &ViewOptions::default());
    let table = view.table.ready().unwrap();
    let csv = table.to_csv().unwrap();

    assert_eq!(csv.lines().count(), table.rows.len() + 1);
    assert_eq!(csv.lines().next().unwrap(), "Date,MMM");
    assert!(csv.lines().nth(1).unwrap().starts_with("2024-03-01,"));
}

#[test]
fn long_form_counts_observations() {
    let data = dashboard();
    let records = long_form(data.prices());
    let expected: usize = data.prices().columns().iter().map(|c| c.observation_count()).sum();
    assert_eq!(records.len(), expected);
    assert_eq!(expected, data.prices().len() * 6);
}
