use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub symbols_file: PathBuf,
    pub refresh_interval: Duration,
    pub batch_size: usize,
    pub workers: usize,
    pub batch_delay: Duration,
    pub default_days: u32,
    pub request_timeout: Duration,
    pub yahoo_suffix: String,
}

/// Parse `key` from `get`, falling back to `default` when unset or unparseable.
fn parsed<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let listen_addr: SocketAddr = match get("AKS_LISTEN_ADDR") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("Invalid AKS_LISTEN_ADDR: {addr}"))?,
            None => {
                let port: u16 = parsed(&get, "PORT", 8051);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };
        let symbols_file = get("AKS_SYMBOLS_FILE")
            .unwrap_or_else(|| "nifty100_with_industries.csv".into())
            .into();
        let refresh_secs: u64 = parsed(&get, "AKS_REFRESH_SECS", 300);
        let batch_delay_ms: u64 = parsed(&get, "AKS_BATCH_DELAY_MS", 2000);
        let timeout_ms: u64 = parsed(&get, "AKS_REQUEST_TIMEOUT_MS", 30000);
        let yahoo_suffix = get("AKS_YAHOO_SUFFIX").unwrap_or_else(|| ".NS".into());

        Ok(Self {
            listen_addr,
            symbols_file,
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
            batch_size: parsed(&get, "AKS_BATCH_SIZE", 10),
            workers: parsed(&get, "AKS_WORKERS", 2),
            batch_delay: Duration::from_millis(batch_delay_ms),
            default_days: aksmarket_core::constants::normalize_days(parsed(
                &get,
                "AKS_DEFAULT_DAYS",
                10,
            )),
            request_timeout: Duration::from_millis(timeout_ms),
            yahoo_suffix,
        })
    }
}
