//! FinDash CLI: serve the dashboard and manage its price snapshot.
//!
//! Commands:
//! - `serve`: load prices once, then serve the dashboard over HTTP
//! - `fetch`: fetch fresh prices and (re)write the snapshot
//! - `snapshot status`: report what the snapshot holds
//! - `render`: print one rendered view as JSON, or its table as CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use findash_core::data::{
    load_market_data, refresh_snapshot, LoadOptions, PriceProvider, Snapshot, SyntheticProvider,
    YahooProvider,
};
use findash_core::domain::Ticker;
use findash_core::view::{render, Metric, Selection, ViewOptions};
use findash_core::{DashboardConfig, MarketData};
use findash_web::AppState;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "findash",
    about = "FinDash: stock price and daily return dashboard"
)]
struct Cli {
    /// TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where prices come from.
#[derive(Args, Clone)]
struct DataArgs {
    /// Snapshot directory (overrides `snapshot_dir` in the config).
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Use deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load prices, then serve the dashboard.
    Serve {
        #[command(flatten)]
        data: DataArgs,

        /// Port to listen on (overrides the config).
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind (overrides the config).
        #[arg(long)]
        host: Option<String>,

        /// Ignore an existing snapshot and fetch.
        #[arg(long, default_value_t = false)]
        refresh: bool,

        /// Hide the date range picker and always show the full range.
        #[arg(long, default_value_t = false)]
        no_date_filter: bool,
    },
    /// Fetch fresh prices and write the snapshot.
    Fetch {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Snapshot management commands.
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },
    /// Render one view to stdout.
    Render {
        #[command(flatten)]
        data: DataArgs,

        /// Comma-separated tickers. Defaults to all.
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,

        /// `price` or `return`.
        #[arg(long, default_value = "price")]
        metric: Metric,

        /// First date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Print the table as CSV instead of the full view as JSON.
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Show the snapshot's sidecar and file sizes.
    Status {
        /// Snapshot directory (overrides the config).
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            data,
            port,
            host,
            refresh,
            no_date_filter,
        } => {
            let mut config = with_data_args(config, &data);
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if no_date_filter {
                config.enable_date_filter = false;
            }
            config.validate()?;
            run_serve(&config, &data, refresh)
        }
        Commands::Fetch { data } => run_fetch(&with_data_args(config, &data), &data),
        Commands::Snapshot { action } => match action {
            SnapshotAction::Status { snapshot_dir } => {
                let dir = snapshot_dir.or(config.snapshot_dir);
                run_snapshot_status(dir.as_deref())
            }
        },
        Commands::Render {
            data,
            tickers,
            metric,
            start,
            end,
            csv,
        } => {
            let config = with_data_args(config, &data);
            let selection = Selection {
                tickers: parse_tickers(&tickers)?,
                metric,
                start,
                end,
            };
            run_render(&config, &data, &selection, csv)
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`. Logs go to stderr so stdout stays
/// clean for `render`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("invalid config {}", path.display())),
        None => Ok(DashboardConfig::default()),
    }
}

fn with_data_args(mut config: DashboardConfig, data: &DataArgs) -> DashboardConfig {
    if let Some(dir) = &data.snapshot_dir {
        config.snapshot_dir = Some(dir.clone());
    }
    config
}

fn parse_tickers(raw: &[String]) -> Result<Vec<Ticker>> {
    raw.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| Ticker::new(s).with_context(|| format!("invalid ticker '{s}'")))
        .collect()
}

fn make_provider(synthetic: bool) -> Result<Box<dyn PriceProvider>> {
    if synthetic {
        Ok(Box::new(SyntheticProvider::new()))
    } else {
        Ok(Box::new(YahooProvider::new()?))
    }
}

fn load_options(config: &DashboardConfig, refresh: bool) -> LoadOptions {
    let (start, end) = config.window(chrono::Local::now().date_naive());
    LoadOptions {
        start,
        end,
        refresh,
    }
}

/// Synchronous startup load. Must run outside the Tokio runtime because the
/// Yahoo client is blocking.
fn load(config: &DashboardConfig, data: &DataArgs, refresh: bool) -> Result<MarketData> {
    let universe = config.universe()?;
    let opts = load_options(config, refresh);
    let provider = make_provider(data.synthetic)?;
    let snapshot = config
        .snapshot_dir
        .as_ref()
        .map(|dir| Snapshot::new(dir, config.snapshot_format));

    info!(
        tickers = universe.len(),
        start = %opts.start,
        end = %opts.end,
        provider = provider.name(),
        "loading prices"
    );
    load_market_data(&universe, provider.as_ref(), snapshot.as_ref(), &opts)
        .context("startup data load failed")
}

fn run_serve(config: &DashboardConfig, data: &DataArgs, refresh: bool) -> Result<()> {
    let market = load(config, data, refresh)?;
    let state = AppState::new(
        market,
        ViewOptions {
            enable_date_filter: config.enable_date_filter,
        },
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime
        .block_on(findash_web::serve(state, &config.server))
        .with_context(|| format!("server on {} failed", config.server.bind_addr()))
}

fn run_fetch(config: &DashboardConfig, data: &DataArgs) -> Result<()> {
    let Some(dir) = &config.snapshot_dir else {
        bail!("no snapshot directory: pass --snapshot-dir or set snapshot_dir in the config");
    };
    let universe = config.universe()?;
    let provider = make_provider(data.synthetic)?;
    let snapshot = Snapshot::new(dir, config.snapshot_format);
    let (market, _meta) = refresh_snapshot(
        &universe,
        provider.as_ref(),
        &snapshot,
        &load_options(config, true),
    )
    .with_context(|| format!("failed to refresh snapshot in {}", dir.display()))?;

    let s = market.summary();
    println!("Snapshot: {}", dir.display());
    println!("Source:   {}", s.source.label());
    println!("Tickers:  {}", s.tickers);
    println!("Prices:   {} rows", s.price_rows);
    println!("Returns:  {} rows", s.return_rows);
    if let (Some(first), Some(last)) = (s.first_date, s.last_date) {
        println!("Range:    {first} to {last}");
    }
    Ok(())
}

fn run_snapshot_status(dir: Option<&Path>) -> Result<()> {
    let Some(dir) = dir else {
        bail!("no snapshot directory: pass --snapshot-dir or set snapshot_dir in the config");
    };
    let Some((snapshot, meta)) = Snapshot::from_sidecar(dir)? else {
        println!("No snapshot in {}", dir.display());
        return Ok(());
    };

    println!("{}", serde_json::to_string_pretty(&meta)?);
    println!();
    for path in [snapshot.prices_path(), snapshot.returns_path(), snapshot.meta_path()] {
        match std::fs::metadata(&path) {
            Ok(m) => println!("{:<40} {:>10}", path.display(), format_size(m.len())),
            Err(_) => println!("{:<40} {:>10}", path.display(), "(missing)"),
        }
    }
    Ok(())
}

fn run_render(
    config: &DashboardConfig,
    data: &DataArgs,
    selection: &Selection,
    csv: bool,
) -> Result<()> {
    let market = load(config, data, false)?;
    for t in &selection.tickers {
        if !market.universe().contains(t) {
            warn!(ticker = %t, "not in the configured universe; ignored");
        }
    }

    let options = ViewOptions {
        enable_date_filter: config.enable_date_filter,
    };
    let view = render(&market, selection, &options);

    if csv {
        match view.table.ready() {
            Some(table) => print!("{}", table.to_csv()?),
            None => bail!("no data available for the selected filters"),
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
