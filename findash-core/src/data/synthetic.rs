//! Deterministic synthetic prices for offline demos and tests.
//!
//! Each ticker gets a random walk seeded from the BLAKE3 hash of its symbol,
//! so the same ticker and window always produce the same series. Data from
//! this provider is tagged [`DataSource::Synthetic`].

use super::provider::{DataError, DataSource, PricePoint, PriceProvider};
use crate::domain::Ticker;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

impl PriceProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(
        &self,
        ticker: &Ticker,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let points = random_walk(ticker, start, end);
        if points.is_empty() {
            return Err(DataError::EmptyResponse {
                ticker: ticker.clone(),
            });
        }
        Ok(points)
    }
}

/// Weekday-only random walk starting between 40 and 295.
fn random_walk(ticker: &Ticker, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
    let seed: [u8; 32] = *blake3::hash(ticker.as_str().as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut price = 40.0 + f64::from(seed[0]);
    let mut points = Vec::new();

    for date in start.iter_days().take_while(|d| *d <= end) {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        points.push(PricePoint::new(date, price));
        let daily_return: f64 = rng.gen_range(-0.02..0.02);
        price *= 1.0 + daily_return;
    }

    points
}
