//! Handler tests against a synthetic six-ticker dataset.

use axum::body::to_bytes;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use findash_core::data::{fetch_market_data, LoadOptions, SyntheticProvider};
use findash_core::domain::Universe;
use findash_core::ViewOptions;
use findash_web::routes::view::{get_options, get_table_csv, get_view, ViewQuery};
use findash_web::routes::{health, page};
use findash_web::{create_app, AppState};
use serde_json::Value;

fn state(enable_date_filter: bool) -> AppState {
    let opts = LoadOptions {
        start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        refresh: false,
    };
    let universe = Universe::default_dashboard();
    let data = fetch_market_data(&universe, &SyntheticProvider::new(), &opts).unwrap();
    AppState::new(data, ViewOptions { enable_date_filter })
}

fn q(pairs: &[(&str, &str)]) -> Query<ViewQuery> {
    let mut query = ViewQuery::default();
    for (k, v) in pairs {
        let v = Some(v.to_string());
        match *k {
            "tickers" => query.tickers = v,
            "metric" => query.metric = v,
            "start" => query.start = v,
            "end" => query.end = v,
            other => panic!("unknown key {other}"),
        }
    }
    Query(query)
}

async fn body_json(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ── /api/view ──

#[tokio::test]
async fn view_renders_selected_tickers() {
    let resp = get_view(State(state(true)), q(&[("tickers", "PG,KO"), ("metric", "price")]))
        .await
        .into_response();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["metric"], "price");
    assert_eq!(json["line_chart"]["status"], "ready");
    assert_eq!(json["line_chart"]["title"], "Closing Price for PG, KO");
    assert_eq!(json["line_chart"]["series"].as_array().unwrap().len(), 2);
    assert_eq!(json["box_plot"]["categories"].as_array().unwrap().len(), 2);
    assert_eq!(json["table"]["columns"], serde_json::json!(["Date", "PG", "KO"]));
}

#[tokio::test]
async fn view_without_query_is_everything() {
    let resp = get_view(State(state(true)), q(&[])).await.into_response();
    let json = body_json(resp).await;
    assert_eq!(json["tickers"].as_array().unwrap().len(), 6);
    assert_eq!(json["metric"], "price");
}

#[tokio::test]
async fn view_empty_range_is_no_data_not_error() {
    let resp = get_view(
        State(state(true)),
        q(&[("start", "2024-05-01"), ("end", "2024-04-01")]),
    )
    .await
    .into_response();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    for panel in ["line_chart", "box_plot", "table"] {
        assert_eq!(json[panel]["status"], "no_data");
        assert_eq!(json[panel]["message"], "No data available for the selected filters");
    }
}

#[tokio::test]
async fn view_ignores_dates_when_filter_disabled() {
    let resp = get_view(
        State(state(false)),
        q(&[("start", "2024-05-01"), ("end", "2024-04-01")]),
    )
    .await
    .into_response();
    let json = body_json(resp).await;
    assert_eq!(json["table"]["status"], "ready");
}

#[tokio::test]
async fn bad_parameters_are_400_json() {
    for pairs in [
        vec![("tickers", "PG,AAPL")],
        vec![("metric", "volume")],
        vec![("start", "yesterday")],
        vec![("tickers", "P G")],
    ] {
        let resp = get_view(State(state(true)), q(&pairs)).await.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{pairs:?}");
        let json = body_json(resp).await;
        assert_eq!(json["status"], 400);
        assert!(json["error"].is_string());
    }
}

// ── /api/table.csv ──

#[tokio::test]
async fn csv_export_is_attachment() {
    let resp = get_table_csv(State(state(true)), q(&[("tickers", "HON"), ("metric", "return")]))
        .await
        .into_response();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    assert!(resp.headers()[CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("findash_return.csv"));

    let text = body_text(resp).await;
    assert_eq!(text.lines().next().unwrap(), "Date,HON");
    assert!(text.lines().count() > 100);
}

#[tokio::test]
async fn csv_of_empty_selection_is_404() {
    let resp = get_table_csv(State(state(true)), q(&[("start", "2030-01-01")]))
        .await
        .into_response();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let json = body_json(resp).await;
    assert_eq!(json["status"], 404);
}

// ── /api/options, /health, / ──

#[tokio::test]
async fn options_describe_selectors() {
    let resp = get_options(State(state(true))).await.into_response();
    let json = body_json(resp).await;
    assert_eq!(json["tickers"], serde_json::json!(["PG", "KO", "PEP", "MMM", "HON", "CAT"]));
    assert_eq!(json["metrics"][0]["value"], "price");
    assert_eq!(json["metrics"][1]["label"], "Daily Returns");
    assert_eq!(json["default_metric"], "price");
    assert_eq!(json["date_filter_enabled"], true);
    assert_eq!(json["min_date"], "2024-01-01");
    assert_eq!(json["source"], "synthetic");
}

#[tokio::test]
async fn health_reports_rows() {
    let resp = health::health(State(state(true))).await.into_response();
    let json = body_json(resp).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["tickers"], 6);
    assert_eq!(
        json["return_rows"].as_u64().unwrap() + 1,
        json["price_rows"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn index_page_loads_plotly() {
    let resp = page::index().await.into_response();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("plotly"));
    assert!(html.contains("/api/view"));
}

#[test]
fn router_builds() {
    let _app = create_app(state(true));
}
