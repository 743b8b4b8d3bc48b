//! Background auto-refresh of the most recently viewed selection.

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::dashboard::RefreshTrigger;
use crate::main_lib::AppState;

/// Starts the auto-refresh loop.
pub fn start_auto_refresh(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!(
            "Auto-refresh scheduler started ({}s interval)",
            state.refresh_interval.as_secs()
        );

        let mut ticker = interval(state.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_auto_refresh(&state).await;
        }
    });
}

/// Refetch the last selection, if any page has been viewed.
pub async fn run_auto_refresh(state: &AppState) {
    match state.dashboard.last_selection().await {
        Some(selection) => {
            let snapshot = state
                .dashboard
                .refresh(selection, RefreshTrigger::AutoRefresh)
                .await;
            info!(
                "Auto refresh finished: {} rows, {} dropped",
                snapshot.rows.len(),
                snapshot.dropped.len()
            );
        }
        None => debug!("Auto refresh skipped: nothing selected yet"),
    }
}
