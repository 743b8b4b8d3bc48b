use std::sync::Arc;

use aksmarket_core::{SortColumn, SortDirection, SortState};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use urlencoding::encode;

use super::parse_selection;
use crate::dashboard::RefreshTrigger;
use crate::error::ApiResult;
use crate::main_lib::AppState;
use crate::render::PageView;

#[derive(Deserialize)]
struct PageQuery {
    industry: Option<String>,
    days: Option<String>,
    sort: Option<SortColumn>,
    dir: Option<SortDirection>,
}

#[derive(Deserialize)]
struct RefreshForm {
    industry: Option<String>,
    days: Option<String>,
}

async fn dashboard_page(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Html<String>> {
    let Query(query) = query?;
    let industries = state.dashboard.industries();
    let selection = parse_selection(query.industry.as_deref(), query.days.as_deref());
    let sort = SortState {
        column: query.sort,
        direction: query.dir.unwrap_or_default(),
    };

    let snapshot = match &selection {
        Some(selection) => Some(state.dashboard.snapshot_or_refresh(selection.clone()).await),
        None => None,
    };
    let mut rows = snapshot.as_ref().map(|s| s.rows.clone()).unwrap_or_default();
    sort.apply(&mut rows);

    let html = state.renderer.render(&PageView {
        industries: &industries,
        selection: selection.as_ref(),
        sort,
        rows: &rows,
        snapshot: snapshot.as_deref(),
        refresh_interval: state.refresh_interval,
    })?;
    Ok(Html(html))
}

async fn manual_refresh(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RefreshForm>,
) -> Redirect {
    match parse_selection(form.industry.as_deref(), form.days.as_deref()) {
        Some(selection) => {
            let target = format!(
                "/?industry={}&days={}",
                encode(selection.filter.selection_value()),
                selection.days
            );
            state
                .dashboard
                .refresh(selection, RefreshTrigger::ManualRefresh)
                .await;
            Redirect::to(&target)
        }
        None => Redirect::to("/"),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/refresh", post(manual_refresh))
}
