//! Reading the symbol files.
//!
//! Two layouts are accepted: the raw index list with a `ticker` column of
//! `EXCHANGE:SYMBOL` values, and the enriched file that adds `symbol` and
//! `industry` columns.

use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::info;

use super::universe_model::{SymbolUniverse, UniverseEntry};
use crate::constants::UNKNOWN_INDUSTRY;
use crate::errors::{Error, Result};

/// `NSE:TCS` -> `TCS`. Values without a prefix are returned trimmed.
pub fn strip_exchange_prefix(ticker: &str) -> &str {
    let ticker = ticker.trim();
    match ticker.split_once(':') {
        Some((_, symbol)) => symbol.trim(),
        None => ticker,
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::UniverseNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn require_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    column(headers, name).ok_or_else(|| Error::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source)
}

/// Unique bare symbols from a file with a `ticker` column, in file order.
pub fn load_tickers(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut rdr = reader(open(path)?);
    let ticker_col = require_column(rdr.headers()?, "ticker", path)?;

    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let symbol = strip_exchange_prefix(record.get(ticker_col).unwrap_or_default());
        if !symbol.is_empty() && seen.insert(symbol.to_string()) {
            symbols.push(symbol.to_string());
        }
    }

    info!("Loaded {} tickers from {}", symbols.len(), path.display());
    Ok(symbols)
}

impl SymbolUniverse {
    /// Load the enriched symbol file.
    ///
    /// Symbols come from the `symbol` column, or from `ticker` with the
    /// exchange prefix stripped. The `industry` column is required.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = reader(open(path)?);
        let headers = rdr.headers()?.clone();

        let symbol_col = match column(&headers, "symbol") {
            Some(col) => col,
            None => require_column(&headers, "ticker", path)?,
        };
        let industry_col = require_column(&headers, "industry", path)?;

        let mut entries = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let symbol = strip_exchange_prefix(record.get(symbol_col).unwrap_or_default());
            let industry = record.get(industry_col).unwrap_or(UNKNOWN_INDUSTRY);
            entries.push(UniverseEntry {
                symbol: symbol.to_string(),
                industry: industry.to_string(),
            });
        }

        let universe = Self::from_entries(entries);
        info!(
            "Loaded {} symbols with industries from {}",
            universe.len(),
            path.display()
        );
        Ok(universe)
    }
}
