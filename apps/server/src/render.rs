//! Server-rendered dashboard page.
//!
//! The markup lives in `templates/dashboard.html.tera`. This module turns a
//! snapshot into display strings and hands them to tera, which escapes
//! every value.

use std::fmt::Write;
use std::time::Duration;

use aksmarket_core::constants::{
    DEFAULT_COMPARISON_DAYS, MAX_COMPARISON_DAYS, MIN_COMPARISON_DAYS,
};
use aksmarket_core::{IndustryFilter, SortColumn, SortDirection, SortState, StockRow};
use serde::Serialize;
use tera::{Context, Tera};
use urlencoding::encode;

use crate::dashboard::{Selection, Snapshot};

const PLACEHOLDER: &str = "-";
const TEMPLATE_NAME: &str = "dashboard.html";

/// Everything the page needs.
pub struct PageView<'a> {
    pub industries: &'a [String],
    pub selection: Option<&'a Selection>,
    pub sort: SortState,
    /// Rows already sorted for display.
    pub rows: &'a [StockRow],
    pub snapshot: Option<&'a Snapshot>,
    pub refresh_interval: Duration,
}

/// `1234567.891` with 2 decimals → `1,234,567.89`.
fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(v) if v < 0.0 => format!("-₹{}", group_thousands(-v, 2)),
        Some(v) => format!("₹{}", group_thousands(v, 2)),
        None => PLACEHOLDER.to_string(),
    }
}

/// Market cap in crores (1 Cr = 10^7).
pub fn format_market_cap(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("₹{}Cr", group_thousands(v / 1e7, 2)),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_volume(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| group_thousands(v, 0))
}

pub fn format_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{v:.2}"))
}

/// Arrow-prefixed percentage and its CSS class.
pub fn format_percent(value: Option<f64>) -> (String, &'static str) {
    match value {
        Some(v) if v >= 0.0 => (format!("▲ {v:.2}%"), "up"),
        Some(v) => (format!("▼ {:.2}%", v.abs()), "down"),
        None => (PLACEHOLDER.to_string(), ""),
    }
}

fn change_class(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v >= 0.0 => "up",
        Some(_) => "down",
        None => "",
    }
}

fn page_href(selection: &Selection, sort: Option<(SortColumn, SortDirection)>) -> String {
    let mut href = format!(
        "/?industry={}&days={}",
        encode(selection.filter.selection_value()),
        selection.days
    );
    if let Some((column, direction)) = sort {
        let _ = write!(href, "&sort={}&dir={}", column.key(), direction.as_str());
    }
    href
}

#[derive(Serialize)]
struct IndustryOption {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Serialize)]
struct StatusLine {
    updated_at: String,
    count: usize,
    days: u32,
    next_refresh_min: u64,
}

#[derive(Serialize)]
struct HeaderCell {
    href: String,
    label: String,
    indicator: &'static str,
}

#[derive(Serialize)]
struct Cell {
    css: &'static str,
    text: String,
}

impl Cell {
    fn plain(text: String) -> Self {
        Self { css: "", text }
    }

    fn change(value: Option<f64>) -> Self {
        Self {
            css: change_class(value),
            text: format_currency(value),
        }
    }

    fn percent(value: Option<f64>) -> Self {
        let (text, css) = format_percent(value);
        Self { css, text }
    }
}

#[derive(Serialize)]
struct PageContext {
    industry_options: Vec<IndustryOption>,
    has_selection: bool,
    selection_value: String,
    days: u32,
    min_days: u32,
    max_days: u32,
    refresh_secs: u64,
    waiting: bool,
    status: Option<StatusLine>,
    headers: Vec<HeaderCell>,
    rows: Vec<Vec<Cell>>,
}

fn row_cells(row: &StockRow) -> Vec<Cell> {
    vec![
        Cell {
            css: "symbol",
            text: row.symbol.clone(),
        },
        Cell::plain(row.industry.clone()),
        Cell::plain(format_currency(row.last_close)),
        Cell::plain(format_currency(row.open)),
        Cell::plain(format_currency(row.current)),
        Cell::change(row.day_change),
        Cell::percent(row.day_change_pct),
        Cell::plain(format_currency(row.past_price)),
        Cell::change(row.past_change),
        Cell::percent(row.past_change_pct),
        Cell::plain(format_currency(row.week52_high)),
        Cell::plain(format_currency(row.week52_low)),
        Cell::plain(format_market_cap(row.market_cap)),
        Cell::plain(format_ratio(row.pe)),
        Cell::plain(format_ratio(row.eps)),
        Cell::plain(format_volume(row.avg_volume)),
        Cell::plain(format_volume(row.todays_volume)),
        Cell::percent(row.volume_change_pct),
    ]
}

fn industry_options(view: &PageView<'_>) -> Vec<IndustryOption> {
    let selected = view.selection.map(|s| &s.filter);
    std::iter::once(IndustryFilter::All)
        .chain(
            view.industries
                .iter()
                .map(|name| IndustryFilter::Industry(name.clone())),
        )
        .map(|filter| IndustryOption {
            value: filter.selection_value().to_string(),
            label: filter.to_string(),
            selected: selected == Some(&filter),
        })
        .collect()
}

fn headers(sort: SortState, selection: &Selection) -> Vec<HeaderCell> {
    SortColumn::ALL
        .into_iter()
        .map(|column| {
            let next = sort.toggle(column);
            let indicator = match sort.column {
                Some(c) if c == column => match sort.direction {
                    SortDirection::Asc => " ▲",
                    SortDirection::Desc => " ▼",
                },
                _ => "",
            };
            HeaderCell {
                href: page_href(selection, Some((column, next.direction))),
                label: column.label(selection.days),
                indicator,
            }
        })
        .collect()
}

fn page_context(view: &PageView<'_>) -> PageContext {
    let refresh_secs = view.refresh_interval.as_secs().max(1);
    let loaded = view
        .selection
        .zip(view.snapshot)
        .filter(|(_, snapshot)| !snapshot.rows.is_empty());

    let (status, headers, rows) = match loaded {
        Some((selection, snapshot)) => (
            Some(StatusLine {
                updated_at: snapshot.updated_at.format("%H:%M:%S").to_string(),
                count: view.rows.len(),
                days: selection.days,
                next_refresh_min: (refresh_secs / 60).max(1),
            }),
            headers(view.sort, selection),
            view.rows.iter().map(row_cells).collect(),
        ),
        None => (None, Vec::new(), Vec::new()),
    };

    PageContext {
        industry_options: industry_options(view),
        has_selection: view.selection.is_some(),
        selection_value: view
            .selection
            .map(|s| s.filter.selection_value().to_string())
            .unwrap_or_default(),
        days: view.selection.map_or(DEFAULT_COMPARISON_DAYS, |s| s.days),
        min_days: MIN_COMPARISON_DAYS,
        max_days: MAX_COMPARISON_DAYS,
        refresh_secs,
        waiting: status.is_none(),
        status,
        headers,
        rows,
    }
}

/// Compiled dashboard template.
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            TEMPLATE_NAME,
            include_str!("../templates/dashboard.html.tera"),
        )?;
        Ok(Self { tera })
    }

    /// Render the whole dashboard page.
    pub fn render(&self, view: &PageView<'_>) -> tera::Result<String> {
        let context = Context::from_serialize(page_context(view))?;
        self.tera.render(TEMPLATE_NAME, &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::RefreshTrigger;
    use chrono::Local;

    fn row(symbol: &str, current: Option<f64>) -> StockRow {
        StockRow {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            industry: "IT".to_string(),
            last_close: Some(1000.0),
            open: None,
            current,
            day_change: None,
            day_change_pct: Some(-1.234),
            past_price: None,
            past_change: None,
            past_change_pct: None,
            week52_high: None,
            week52_low: None,
            market_cap: Some(1.2345e11),
            pe: None,
            eps: None,
            avg_volume: Some(1234567.0),
            todays_volume: None,
            volume_change_pct: None,
        }
    }

    fn it(days: u32) -> Selection {
        Selection {
            filter: IndustryFilter::Industry("IT".to_string()),
            days,
        }
    }

    #[test]
    fn test_currency_and_market_cap() {
        assert_eq!(format_currency(Some(1234.5)), "₹1,234.50");
        assert_eq!(format_currency(Some(999.999)), "₹1,000.00");
        assert_eq!(format_currency(Some(-12.5)), "-₹12.50");
        assert_eq!(format_currency(None), "-");
        assert_eq!(format_market_cap(Some(1.2345567e11)), "₹12,345.57Cr");
    }

    #[test]
    fn test_percent_and_volume() {
        assert_eq!(format_percent(Some(1.234)), ("▲ 1.23%".to_string(), "up"));
        assert_eq!(format_percent(Some(0.0)), ("▲ 0.00%".to_string(), "up"));
        assert_eq!(format_percent(Some(-1.234)), ("▼ 1.23%".to_string(), "down"));
        assert_eq!(format_volume(Some(1234567.4)), "1,234,567");
        assert_eq!(format_volume(Some(999.0)), "999");
    }

    fn render(view: &PageView<'_>) -> String {
        PageRenderer::new().unwrap().render(view).unwrap()
    }

    #[test]
    fn test_values_are_escaped() {
        let industries = vec!["M&M <Auto>".to_string()];
        let html = render(&PageView {
            industries: &industries,
            selection: None,
            sort: SortState::default(),
            rows: &[],
            snapshot: None,
            refresh_interval: Duration::from_secs(300),
        });
        assert!(html.contains(">M&amp;M &lt;Auto&gt;</option>"));
        assert!(!html.contains("<Auto>"));
    }

    #[test]
    fn test_prompt_without_selection() {
        let industries = vec!["IT".to_string()];
        let html = render(&PageView {
            industries: &industries,
            selection: None,
            sort: SortState::default(),
            rows: &[],
            snapshot: None,
            refresh_interval: Duration::from_secs(300),
        });
        assert!(html.contains("Please select an industry"));
        assert!(!html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("All Industries"));
    }

    #[test]
    fn test_empty_snapshot_shows_waiting() {
        let selection = it(10);
        let snapshot = Snapshot {
            selection: selection.clone(),
            rows: vec![],
            dropped: vec![],
            updated_at: Local::now(),
            trigger: RefreshTrigger::InitialLoad,
        };
        let html = render(&PageView {
            industries: &[],
            selection: Some(&selection),
            sort: SortState::default(),
            rows: &[],
            snapshot: Some(&snapshot),
            refresh_interval: Duration::from_secs(300),
        });
        assert!(html.contains("No data loaded yet. Please wait..."));
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"300\">"));
    }

    #[test]
    fn test_table_with_sort_links() {
        let selection = it(30);
        let rows = vec![row("TCS", Some(3500.0)), row("INFY", None)];
        let snapshot = Snapshot {
            selection: selection.clone(),
            rows: rows.clone(),
            dropped: vec![],
            updated_at: Local::now(),
            trigger: RefreshTrigger::AutoRefresh,
        };
        let sort = SortState {
            column: Some(SortColumn::Current),
            direction: SortDirection::Desc,
        };
        let html = render(&PageView {
            industries: &[],
            selection: Some(&selection),
            sort,
            rows: &rows,
            snapshot: Some(&snapshot),
            refresh_interval: Duration::from_secs(300),
        });

        assert!(html.contains("| 2 stocks | 30D comparison | Next refresh: 5 min"));
        assert!(html.contains("30D CHANGE %"));
        // The sorted column flips, every other column starts descending.
        assert!(html.contains("sort=CURRENT&amp;dir=asc\">CURRENT ▼</a>"));
        assert!(html.contains("sort=PE&amp;dir=desc\">P&#x2F;E</a>"));
        assert!(html.contains("<td>₹3,500.00</td>"));
        assert!(html.contains("<td class=\"down\">▼ 1.23%</td>"));
        assert!(html.contains("₹12,345.00Cr"));
        assert!(html.contains("1,234,567"));
    }
}
