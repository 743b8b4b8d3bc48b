//! Dashboard state shared by the page handlers and the auto-refresh task.
//!
//! One snapshot is kept per industry filter. Every fetch is tagged with the
//! [`RefreshTrigger`] that caused it and serialized behind a single lock so
//! a manual refresh and the scheduler never hit the providers at once.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use aksmarket_core::{
    fetch_rows, BatchOptions, DroppedSymbol, IndustryFilter, MarketDataServiceTrait, StockRow,
    SymbolUniverse,
};
use aksmarket_market_data::Sleeper;
use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// What started a fetch.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshTrigger {
    InitialLoad,
    ManualRefresh,
    AutoRefresh,
    DaysChanged,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RefreshTrigger::InitialLoad => "Initial Load",
            RefreshTrigger::ManualRefresh => "Manual Refresh",
            RefreshTrigger::AutoRefresh => "Auto Refresh",
            RefreshTrigger::DaysChanged => "Days Changed",
        };
        f.write_str(label)
    }
}

/// Industry and comparison window chosen in the page.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Selection {
    pub filter: IndustryFilter,
    pub days: u32,
}

/// Rows fetched for one selection.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub selection: Selection,
    pub rows: Vec<StockRow>,
    pub dropped: Vec<DroppedSymbol>,
    pub updated_at: DateTime<Local>,
    pub trigger: RefreshTrigger,
}

pub struct Dashboard {
    universe: SymbolUniverse,
    service: Arc<dyn MarketDataServiceTrait>,
    batch: BatchOptions,
    sleeper: Arc<dyn Sleeper>,
    max_age: Duration,
    snapshots: RwLock<HashMap<IndustryFilter, Arc<Snapshot>>>,
    last_selection: RwLock<Option<Selection>>,
    refresh_lock: Mutex<()>,
}

impl Dashboard {
    pub fn new(
        universe: SymbolUniverse,
        service: Arc<dyn MarketDataServiceTrait>,
        batch: BatchOptions,
        sleeper: Arc<dyn Sleeper>,
        max_age: Duration,
    ) -> Self {
        Self {
            universe,
            service,
            batch,
            sleeper,
            max_age,
            snapshots: RwLock::new(HashMap::new()),
            last_selection: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn universe(&self) -> &SymbolUniverse {
        &self.universe
    }

    pub fn industries(&self) -> Vec<String> {
        self.universe.industries()
    }

    /// The selection the page showed most recently.
    pub async fn last_selection(&self) -> Option<Selection> {
        self.last_selection.read().await.clone()
    }

    /// Fetch rows for `selection` and store them as its snapshot.
    ///
    /// A manual refresh empties every cache first.
    pub async fn refresh(&self, selection: Selection, trigger: RefreshTrigger) -> Arc<Snapshot> {
        let _guard = self.refresh_lock.lock().await;

        if trigger == RefreshTrigger::ManualRefresh {
            self.service.clear_caches();
        }

        let symbols = self.universe.symbols_for(&selection.filter);
        info!(
            "[FETCHING DATA - {}] Loading {} stocks for: {} (comparing {} days)",
            trigger,
            symbols.len(),
            selection.filter,
            selection.days
        );

        let options = BatchOptions {
            days: selection.days,
            ..self.batch.clone()
        };
        let report = fetch_rows(
            self.service.as_ref(),
            &symbols,
            &options,
            self.sleeper.as_ref(),
        )
        .await;

        if !report.dropped.is_empty() {
            warn!(
                "{} of {} symbols produced no row: {}",
                report.dropped.len(),
                symbols.len(),
                report.dropped_symbols().join(", ")
            );
        }

        let snapshot = Arc::new(Snapshot {
            selection: selection.clone(),
            rows: report.rows,
            dropped: report.dropped,
            updated_at: Local::now(),
            trigger,
        });

        self.snapshots
            .write()
            .await
            .insert(selection.filter.clone(), snapshot.clone());
        *self.last_selection.write().await = Some(selection);
        snapshot
    }

    /// Serve the stored snapshot for `selection` while it is still current.
    ///
    /// Fetches when there is none, when it was built for a different window,
    /// when the page switches back from another filter, or when it is older
    /// than the refresh interval.
    pub async fn snapshot_or_refresh(&self, selection: Selection) -> Arc<Snapshot> {
        let existing = self.snapshots.read().await.get(&selection.filter).cloned();
        let Some(snapshot) = existing else {
            return self.refresh(selection, RefreshTrigger::InitialLoad).await;
        };

        if snapshot.selection.days != selection.days {
            return self.refresh(selection, RefreshTrigger::DaysChanged).await;
        }

        let switched = self
            .last_selection
            .read()
            .await
            .as_ref()
            .is_some_and(|last| last.filter != selection.filter);
        if switched {
            return self.refresh(selection, RefreshTrigger::InitialLoad).await;
        }

        if self.is_stale(&snapshot) {
            return self.refresh(selection, RefreshTrigger::AutoRefresh).await;
        }

        debug!("Serving stored snapshot for {}", selection.filter);
        *self.last_selection.write().await = Some(selection);
        snapshot
    }

    fn is_stale(&self, snapshot: &Snapshot) -> bool {
        match chrono::Duration::from_std(self.max_age) {
            Ok(max_age) => Local::now() - snapshot.updated_at >= max_age,
            Err(_) => false,
        }
    }
}
