//! Selection endpoints.
//!
//! - `GET /api/options` - selector contents and date bounds
//! - `GET /api/view` - rendered panels as JSON
//! - `GET /api/table.csv` - the table panel as a CSV download

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use findash_core::data::DataSource;
use findash_core::domain::Ticker;
use findash_core::view::{render, Metric, RenderedView, Selection, NO_DATA_MESSAGE};
use findash_core::MarketData;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Raw query string. Everything is optional and parsed by hand so that bad
/// values come back as JSON 400s.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ViewQuery {
    /// Comma-separated symbols; empty or absent means all.
    pub tickers: Option<String>,
    /// `price` or `return`.
    pub metric: Option<String>,
    /// `YYYY-MM-DD`
    pub start: Option<String>,
    /// `YYYY-MM-DD`
    pub end: Option<String>,
}

impl ViewQuery {
    /// Validate against the loaded universe.
    pub fn to_selection(&self, data: &MarketData) -> AppResult<Selection> {
        let mut tickers = Vec::new();
        for raw in self.tickers.as_deref().unwrap_or("").split(',') {
            if raw.trim().is_empty() {
                continue;
            }
            let ticker = Ticker::new(raw).map_err(|e| AppError::BadRequest(e.to_string()))?;
            if !data.universe().contains(&ticker) {
                return Err(AppError::BadRequest(format!("unknown ticker '{ticker}'")));
            }
            tickers.push(ticker);
        }

        let metric = match non_empty(&self.metric) {
            Some(m) => m
                .parse::<Metric>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
            None => Metric::default(),
        };

        Ok(Selection {
            tickers,
            metric,
            start: parse_date("start", &self.start)?,
            end: parse_date("end", &self.end)?,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(name: &str, value: &Option<String>) -> AppResult<Option<NaiveDate>> {
    non_empty(value)
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                AppError::BadRequest(format!("{name} must be YYYY-MM-DD, got '{s}'"))
            })
        })
        .transpose()
}

#[derive(Debug, Serialize)]
pub struct MetricOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Everything the page needs to build its selectors.
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub tickers: Vec<Ticker>,
    pub metrics: Vec<MetricOption>,
    pub default_metric: Metric,
    pub date_filter_enabled: bool,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub source: DataSource,
}

/// `GET /api/options`
pub async fn get_options(State(state): State<AppState>) -> Json<OptionsResponse> {
    let bounds = state.data.date_bounds();
    Json(OptionsResponse {
        tickers: state.data.universe().tickers().to_vec(),
        metrics: Metric::ALL
            .iter()
            .map(|m| MetricOption {
                value: m.as_str(),
                label: m.display_name(),
            })
            .collect(),
        default_metric: Metric::default(),
        date_filter_enabled: state.options.enable_date_filter,
        min_date: bounds.map(|(lo, _)| lo),
        max_date: bounds.map(|(_, hi)| hi),
        source: state.data.source(),
    })
}

/// `GET /api/view?tickers=PG,KO&metric=price&start=…&end=…`
pub async fn get_view(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> AppResult<Json<RenderedView>> {
    let selection = query.to_selection(&state.data)?;
    Ok(Json(render(&state.data, &selection, &state.options)))
}

/// `GET /api/table.csv?…`
pub async fn get_table_csv(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> AppResult<Response> {
    let selection = query.to_selection(&state.data)?;
    let view = render(&state.data, &selection, &state.options);

    let Some(table) = view.table.ready() else {
        return Err(AppError::NotFound(NO_DATA_MESSAGE.into()));
    };
    let csv = table.to_csv().map_err(|e| AppError::Internal(e.to_string()))?;
    debug!(rows = table.rows.len(), "csv export");

    let disposition = format!(
        "attachment; filename=\"findash_{}.csv\"",
        view.metric.as_str()
    );
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
