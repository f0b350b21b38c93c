use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An equity symbol, normalised to upper case (e.g. `PG`, `BRK-B`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(pub(super) String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("ticker symbol is empty")]
    Empty,

    #[error("ticker '{0}' contains characters outside [A-Z0-9.-^=]")]
    InvalidCharacters(String),
}

impl Ticker {
    pub fn new(symbol: &str) -> Result<Self, TickerError> {
        let trimmed = symbol.trim();
        if trimmed.is_empty() {
            return Err(TickerError::Empty);
        }
        let upper = trimmed.to_ascii_uppercase();
        let valid = upper
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
        if !valid {
            return Err(TickerError::InvalidCharacters(trimmed.to_string()));
        }
        Ok(Self(upper))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Ticker> for String {
    fn from(t: Ticker) -> Self {
        t.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
