use std::sync::Arc;

use aksmarket_core::constants::{normalize_days, DEFAULT_COMPARISON_DAYS};
use aksmarket_core::IndustryFilter;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::dashboard::Selection;
use crate::main_lib::AppState;

mod health;
mod pages;
mod stocks;

/// Days from a query string; anything that isn't a number reads as the default.
pub(crate) fn parse_days(raw: Option<&str>) -> u32 {
    let days = raw
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_COMPARISON_DAYS);
    normalize_days(days)
}

/// Selection from the `industry` / `days` pair, `None` when no industry was chosen.
pub(crate) fn parse_selection(industry: Option<&str>, days: Option<&str>) -> Option<Selection> {
    let industry = industry.map(str::trim).filter(|v| !v.is_empty())?;
    Some(Selection {
        filter: IndustryFilter::from_selection(industry),
        days: parse_days(days),
    })
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(pages::router())
        .nest("/api", stocks::router())
        .merge(health::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
