//! Dashboard configuration.
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file at all) gives the stock six-ticker dashboard on port 8053.
//!
//! ```toml
//! tickers = ["PG", "KO", "PEP", "MMM", "HON", "CAT"]
//! lookback_days = 1825
//! enable_date_filter = true
//! snapshot_dir = "data"
//! snapshot_format = "csv"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8053
//! ```

use crate::data::snapshot::SnapshotFormat;
use crate::domain::{Universe, UniverseError, DEFAULT_TICKERS};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Roughly five calendar years.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 5 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid ticker list: {0}")]
    Universe(#[from] UniverseError),

    #[error("lookback_days must be positive")]
    ZeroLookback,

    #[error("server.host must not be empty")]
    EmptyHost,
}

/// HTTP bind settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8053,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Everything the dashboard needs to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Configured universe, in display order.
    pub tickers: Vec<String>,
    /// Size of the fetch window ending today.
    pub lookback_days: u32,
    /// Whether the view honours a date sub-range.
    pub enable_date_filter: bool,
    /// Where to keep the price/return snapshot. `None` disables it.
    pub snapshot_dir: Option<PathBuf>,
    pub snapshot_format: SnapshotFormat,
    pub server: ServerConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            enable_date_filter: true,
            snapshot_dir: None,
            snapshot_format: SnapshotFormat::Csv,
            server: ServerConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.universe()?;
        if self.lookback_days == 0 {
            return Err(ConfigError::ZeroLookback);
        }
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        Ok(())
    }

    pub fn universe(&self) -> Result<Universe, ConfigError> {
        Ok(Universe::from_symbols(&self.tickers)?)
    }

    /// Inclusive fetch window `[today - lookback_days, today]`.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }
}
