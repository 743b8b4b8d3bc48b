//! AKS Market CLI.
//!
//! Commands:
//! - `enrich` - label every ticker with its industry and write the universe file
//! - `snapshot` - fetch one industry's table and print it

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aksmarket_core::constants::{normalize_days, DEFAULT_COMPARISON_DAYS};
use aksmarket_core::universe::{EnrichOptions, IndustryEnricher};
use aksmarket_core::{
    fetch_rows, BatchDelay, BatchOptions, IndustryFilter, MarketDataService, ServiceConfig,
    SortColumn, SortDirection, SortState, StockRow, SymbolUniverse,
};
use aksmarket_market_data::{NseProvider, RateLimiter, TokioSleeper, YahooProvider};
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aksmarket", about = "AKS Market CLI: NIFTY100 industry screener")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the industry of every ticker and write the symbol/industry file.
    Enrich {
        /// CSV with a `ticker` column (`NSE:SYMBOL`).
        #[arg(long, default_value = "nifty100.csv")]
        input: PathBuf,

        /// Output CSV with `ticker,symbol,industry` columns.
        #[arg(long, default_value = "nifty100_with_industries.csv")]
        output: PathBuf,
    },
    /// Fetch the dashboard table once and print it.
    Snapshot {
        /// Industry label, or ALL.
        #[arg(long, default_value = "ALL")]
        industry: String,

        /// Days for the N-day comparison (1-365).
        #[arg(long, default_value_t = DEFAULT_COMPARISON_DAYS)]
        days: u32,

        /// Column key to sort by (e.g. MARKET_CAP, 1D_CHANGE_PCT).
        #[arg(long)]
        sort: Option<SortColumn>,

        /// Sort direction: asc or desc.
        #[arg(long, default_value = "desc")]
        dir: SortDirection,

        /// Symbol/industry file produced by `enrich`.
        #[arg(long, default_value = "nifty100_with_industries.csv")]
        symbols_file: PathBuf,

        #[arg(long, default_value_t = 10)]
        batch_size: usize,

        #[arg(long, default_value_t = 2)]
        workers: usize,

        /// Pause between batches in milliseconds.
        #[arg(long, default_value_t = 2000)]
        batch_delay_ms: u64,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Enrich { input, output } => run_enrich(input, output).await,
        Commands::Snapshot {
            industry,
            days,
            sort,
            dir,
            symbols_file,
            batch_size,
            workers,
            batch_delay_ms,
            json,
        } => {
            let options = BatchOptions {
                batch_size,
                workers,
                delay: BatchDelay::Fixed(Duration::from_millis(batch_delay_ms)),
                days: normalize_days(days),
            };
            let sort = SortState {
                column: sort,
                direction: dir,
            };
            run_snapshot(&industry, &symbols_file, options, sort, json).await
        }
    }
}

async fn run_enrich(input: PathBuf, output: PathBuf) -> Result<()> {
    let provider = Arc::new(NseProvider::new()?);
    let enricher = IndustryEnricher::new(
        provider,
        Arc::new(RateLimiter::new()),
        Arc::new(TokioSleeper),
        EnrichOptions::default(),
    );

    let summary = enricher.run(&input, &output).await?;
    println!("{summary}");
    Ok(())
}

async fn run_snapshot(
    industry: &str,
    symbols_file: &Path,
    options: BatchOptions,
    sort: SortState,
    json: bool,
) -> Result<()> {
    let universe = SymbolUniverse::load(symbols_file)?;
    let filter = IndustryFilter::from_selection(industry);
    let symbols = universe.symbols_for(&filter);
    if symbols.is_empty() {
        bail!(
            "No symbols for '{}'. Known industries: {}",
            filter,
            universe.industries().join(", ")
        );
    }

    let service = MarketDataService::new(
        Arc::new(NseProvider::new()?),
        Arc::new(YahooProvider::new()?),
        ServiceConfig::default(),
    );
    let report = fetch_rows(&service, &symbols, &options, &TokioSleeper).await;

    let mut rows = report.rows;
    sort.apply(&mut rows);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_table(&rows, options.days);
    }

    for dropped in &report.dropped {
        eprintln!("No data for {}: {}", dropped.symbol, dropped.reason);
    }
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn print_table(rows: &[StockRow], days: u32) {
    println!(
        "{:<12} {:<28} {:>10} {:>9} {:>10} {:>9} {:>14} {:>8}",
        "SYMBOL",
        "INDUSTRY",
        "CURRENT",
        "1D %",
        format!("{days}D PRICE"),
        format!("{days}D %"),
        "MCAP (Cr)",
        "P/E"
    );
    for row in rows {
        println!(
            "{:<12} {:<28} {:>10} {:>9} {:>10} {:>9} {:>14} {:>8}",
            row.symbol,
            row.industry.chars().take(28).collect::<String>(),
            cell(row.current),
            cell(row.day_change_pct),
            cell(row.past_price),
            cell(row.past_change_pct),
            cell(row.market_cap.map(|v| v / 1e7)),
            cell(row.pe)
        );
    }
    println!("{} stocks", rows.len());
}
