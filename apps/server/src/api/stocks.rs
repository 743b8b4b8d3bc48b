use std::sync::Arc;

use aksmarket_core::{
    DroppedSymbol, IndustryFilter, SortColumn, SortDirection, SortState, StockRow,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{parse_days, parse_selection};
use crate::dashboard::{RefreshTrigger, Selection};
use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

#[derive(Deserialize)]
struct StocksQuery {
    industry: Option<String>,
    days: Option<String>,
    sort: Option<SortColumn>,
    dir: Option<SortDirection>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StocksResponse {
    industry: String,
    days: u32,
    trigger: RefreshTrigger,
    updated_at: DateTime<Local>,
    rows: Vec<StockRow>,
    dropped: Vec<DroppedSymbol>,
}

async fn get_industries(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.dashboard.industries())
}

async fn get_stocks(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StocksQuery>, QueryRejection>,
) -> ApiResult<Json<StocksResponse>> {
    let Query(query) = query?;
    let selection = parse_selection(query.industry.as_deref(), query.days.as_deref())
        .unwrap_or_else(|| Selection {
            filter: IndustryFilter::All,
            days: parse_days(query.days.as_deref()),
        });
    if let IndustryFilter::Industry(name) = &selection.filter {
        if !state.dashboard.industries().contains(name) {
            return Err(ApiError::NotFound);
        }
    }

    let snapshot = state.dashboard.snapshot_or_refresh(selection).await;
    let mut rows = snapshot.rows.clone();
    SortState {
        column: query.sort,
        direction: query.dir.unwrap_or_default(),
    }
    .apply(&mut rows);

    Ok(Json(StocksResponse {
        industry: snapshot.selection.filter.selection_value().to_string(),
        days: snapshot.selection.days,
        trigger: snapshot.trigger,
        updated_at: snapshot.updated_at,
        rows,
        dropped: snapshot.dropped.clone(),
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/industries", get(get_industries))
        .route("/stocks", get(get_stocks))
}
