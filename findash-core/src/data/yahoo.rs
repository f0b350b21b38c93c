//! Yahoo Finance price provider.
//!
//! Fetches daily adjusted closes from Yahoo's v8 chart API. One request per
//! ticker, no retries: a failed ticker fails the whole startup load.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; the snapshot path lets a dashboard keep running from disk.

use super::provider::{DataError, DataSource, PricePoint, PriceProvider};
use crate::domain::Ticker;
use chrono::{Days, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance price provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at another host serving the same API shape.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        Self::with_client_builder(base_url, reqwest::blocking::Client::builder())
    }

    fn with_client_builder(
        base_url: impl Into<String>,
        builder: reqwest::blocking::ClientBuilder,
    ) -> Result<Self, DataError> {
        let client = builder
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| {
                DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the chart API URL for a ticker and date range.
    fn chart_url(&self, ticker: &Ticker, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive, so ask for midnight after `end`
        let end_ts = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{}/{ticker}?period1={start_ts}&period2={end_ts}&interval=1d&includeAdjustedClose=true",
            self.base_url
        )
    }
}

/// Parse a chart API body into price points, sorted by date.
///
/// Prefers the `adjclose` series and falls back to raw `close` when Yahoo
/// omits adjustments. Rows without a price are skipped.
pub fn parse_chart(ticker: &Ticker, body: &str) -> Result<Vec<PricePoint>, DataError> {
    let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
        DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
    })?;

    let result = match (resp.chart.result, resp.chart.error) {
        (Some(result), _) => result,
        (None, Some(err)) if err.code == "Not Found" => {
            return Err(DataError::SymbolNotFound {
                ticker: ticker.clone(),
            })
        }
        (None, Some(err)) => {
            return Err(DataError::ResponseFormatChanged(format!(
                "{}: {}",
                err.code, err.description
            )))
        }
        (None, None) => {
            return Err(DataError::ResponseFormatChanged(
                "empty result with no error".into(),
            ))
        }
    };

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

    let Some(timestamps) = data.timestamp else {
        return Err(DataError::EmptyResponse {
            ticker: ticker.clone(),
        });
    };

    let adj_closes = data
        .indicators
        .adjclose
        .and_then(|v| v.into_iter().next())
        .map(|a| a.adjclose);
    let closes = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

        let price = adj_closes
            .as_ref()
            .and_then(|v| v.get(i).copied().flatten())
            .or_else(|| closes.get(i).copied().flatten());

        // Holidays and halted sessions come back as nulls
        if let Some(adj_close) = price {
            points.push(PricePoint { date, adj_close });
        }
    }

    points.sort_by_key(|p| p.date);
    // Yahoo occasionally repeats the last session with an intraday stamp
    points.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            *earlier = *later;
            true
        } else {
            false
        }
    });

    if points.is_empty() {
        return Err(DataError::EmptyResponse {
            ticker: ticker.clone(),
        });
    }

    Ok(points)
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn source(&self) -> DataSource {
        DataSource::YahooFinance
    }

    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let url = self.chart_url(ticker, start, end);
        debug!(%ticker, %url, "requesting chart");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                ticker: ticker.clone(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Http {
                ticker: ticker.clone(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        parse_chart(ticker, &body)
    }
}
