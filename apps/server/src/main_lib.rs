use std::sync::Arc;
use std::time::Duration;

use aksmarket_core::{BatchDelay, BatchOptions, MarketDataService, ServiceConfig, SymbolUniverse};
use aksmarket_market_data::{NseProvider, TokioSleeper, YahooProvider};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::render::PageRenderer;

pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub renderer: PageRenderer,
    pub refresh_interval: Duration,
}

impl AppState {
    pub fn new(dashboard: Dashboard, refresh_interval: Duration) -> tera::Result<Arc<Self>> {
        Ok(Arc::new(Self {
            dashboard: Arc::new(dashboard),
            renderer: PageRenderer::new()?,
            refresh_interval,
        }))
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("AKS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let universe = match SymbolUniverse::load(&config.symbols_file) {
        Ok(universe) => {
            tracing::info!(
                "Loaded {} symbols in {} industries from {}",
                universe.len(),
                universe.industries().len(),
                config.symbols_file.display()
            );
            universe
        }
        Err(e) => {
            tracing::warn!("{}. Run `aksmarket-cli enrich` to create it.", e);
            SymbolUniverse::default()
        }
    };

    let quote_provider = Arc::new(NseProvider::with_timeout(config.request_timeout)?);
    let history_provider = Arc::new(YahooProvider::with_suffix(config.yahoo_suffix.clone())?);
    let service = Arc::new(MarketDataService::new(
        quote_provider,
        history_provider,
        ServiceConfig::default(),
    ));

    let batch = BatchOptions {
        batch_size: config.batch_size,
        workers: config.workers,
        delay: BatchDelay::Fixed(config.batch_delay),
        days: config.default_days,
    };

    let dashboard = Dashboard::new(
        universe,
        service,
        batch,
        Arc::new(TokioSleeper),
        config.refresh_interval,
    );
    Ok(AppState::new(dashboard, config.refresh_interval)?)
}
