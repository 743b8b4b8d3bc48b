//! Column sorting for the dashboard table.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::stocks::StockRow;

/// A sortable table column.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum SortColumn {
    #[serde(rename = "SYMBOL")]
    Symbol,
    #[serde(rename = "INDUSTRIES")]
    Industry,
    #[serde(rename = "LAST_CLOSE")]
    LastClose,
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "CURRENT")]
    Current,
    #[serde(rename = "1D_CHANGE")]
    DayChange,
    #[serde(rename = "1D_CHANGE_PCT")]
    DayChangePct,
    #[serde(rename = "ND_PRICE")]
    PastPrice,
    #[serde(rename = "ND_CHANGE")]
    PastChange,
    #[serde(rename = "ND_CHANGE_PCT")]
    PastChangePct,
    #[serde(rename = "52W_HIGH")]
    Week52High,
    #[serde(rename = "52W_LOW")]
    Week52Low,
    #[serde(rename = "MARKET_CAP")]
    MarketCap,
    #[serde(rename = "PE")]
    Pe,
    #[serde(rename = "EPS")]
    Eps,
    #[serde(rename = "AVG_VOLUME")]
    AvgVolume,
    #[serde(rename = "TODAY_VOLUME")]
    TodayVolume,
    #[serde(rename = "VOL_CHANGE_PCT")]
    VolumeChangePct,
}

impl SortColumn {
    /// Every column, in table order.
    pub const ALL: [SortColumn; 18] = [
        SortColumn::Symbol,
        SortColumn::Industry,
        SortColumn::LastClose,
        SortColumn::Open,
        SortColumn::Current,
        SortColumn::DayChange,
        SortColumn::DayChangePct,
        SortColumn::PastPrice,
        SortColumn::PastChange,
        SortColumn::PastChangePct,
        SortColumn::Week52High,
        SortColumn::Week52Low,
        SortColumn::MarketCap,
        SortColumn::Pe,
        SortColumn::Eps,
        SortColumn::AvgVolume,
        SortColumn::TodayVolume,
        SortColumn::VolumeChangePct,
    ];

    /// Query-string key, identical to the serde name.
    pub fn key(&self) -> &'static str {
        match self {
            SortColumn::Symbol => "SYMBOL",
            SortColumn::Industry => "INDUSTRIES",
            SortColumn::LastClose => "LAST_CLOSE",
            SortColumn::Open => "OPEN",
            SortColumn::Current => "CURRENT",
            SortColumn::DayChange => "1D_CHANGE",
            SortColumn::DayChangePct => "1D_CHANGE_PCT",
            SortColumn::PastPrice => "ND_PRICE",
            SortColumn::PastChange => "ND_CHANGE",
            SortColumn::PastChangePct => "ND_CHANGE_PCT",
            SortColumn::Week52High => "52W_HIGH",
            SortColumn::Week52Low => "52W_LOW",
            SortColumn::MarketCap => "MARKET_CAP",
            SortColumn::Pe => "PE",
            SortColumn::Eps => "EPS",
            SortColumn::AvgVolume => "AVG_VOLUME",
            SortColumn::TodayVolume => "TODAY_VOLUME",
            SortColumn::VolumeChangePct => "VOL_CHANGE_PCT",
        }
    }

    /// Header label; the N-day columns carry the comparison window.
    pub fn label(&self, days: u32) -> String {
        match self {
            SortColumn::Symbol => "SYMBOL".to_string(),
            SortColumn::Industry => "INDUSTRIES".to_string(),
            SortColumn::LastClose => "LAST CLOSE".to_string(),
            SortColumn::Open => "OPEN".to_string(),
            SortColumn::Current => "CURRENT".to_string(),
            SortColumn::DayChange => "1D CHANGE".to_string(),
            SortColumn::DayChangePct => "1D CHANGE %".to_string(),
            SortColumn::PastPrice => format!("{days}D PRICE"),
            SortColumn::PastChange => format!("{days}D CHANGE"),
            SortColumn::PastChangePct => format!("{days}D CHANGE %"),
            SortColumn::Week52High => "52W HIGH".to_string(),
            SortColumn::Week52Low => "52W LOW".to_string(),
            SortColumn::MarketCap => "MARKET CAP (Cr)".to_string(),
            SortColumn::Pe => "P/E".to_string(),
            SortColumn::Eps => "EPS".to_string(),
            SortColumn::AvgVolume => "AVG VOLUME".to_string(),
            SortColumn::TodayVolume => "TODAY VOLUME".to_string(),
            SortColumn::VolumeChangePct => "VOL CHANGE %".to_string(),
        }
    }

    fn value<'a>(&self, row: &'a StockRow) -> Option<SortValue<'a>> {
        let number = match self {
            SortColumn::Symbol => return Some(SortValue::Text(&row.symbol)),
            SortColumn::Industry => return Some(SortValue::Text(&row.industry)),
            SortColumn::LastClose => row.last_close,
            SortColumn::Open => row.open,
            SortColumn::Current => row.current,
            SortColumn::DayChange => row.day_change,
            SortColumn::DayChangePct => row.day_change_pct,
            SortColumn::PastPrice => row.past_price,
            SortColumn::PastChange => row.past_change,
            SortColumn::PastChangePct => row.past_change_pct,
            SortColumn::Week52High => row.week52_high,
            SortColumn::Week52Low => row.week52_low,
            SortColumn::MarketCap => row.market_cap,
            SortColumn::Pe => row.pe,
            SortColumn::Eps => row.eps,
            SortColumn::AvgVolume => row.avg_volume,
            SortColumn::TodayVolume => row.todays_volume,
            SortColumn::VolumeChangePct => row.volume_change_pct,
        };
        number.map(SortValue::Number)
    }
}

impl FromStr for SortColumn {
    type Err = Error;

    /// Accepts the column key in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortColumn::ALL
            .into_iter()
            .find(|column| column.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown sort column: {s}")))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(Error::InvalidInput(format!("Unknown sort direction: {other}"))),
        }
    }
}

/// Current sort selection of the table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub direction: SortDirection,
}

impl SortState {
    /// Header click: the current column flips, a new column starts descending.
    pub fn toggle(self, column: SortColumn) -> Self {
        let direction = if self.column == Some(column) {
            self.direction.flipped()
        } else {
            SortDirection::Desc
        };
        Self {
            column: Some(column),
            direction,
        }
    }

    pub fn apply(&self, rows: &mut [StockRow]) {
        if let Some(column) = self.column {
            sort_rows(rows, column, self.direction);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum SortValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            // A column is either all text or all numbers.
            _ => Ordering::Equal,
        }
    }
}

/// Stable sort by `column`. Rows without a value go last in both directions.
pub fn sort_rows(rows: &mut [StockRow], column: SortColumn, direction: SortDirection) {
    rows.sort_by(|a, b| match (column.value(a), column.value(b)) {
        (Some(x), Some(y)) => match direction {
            SortDirection::Asc => x.compare(&y),
            SortDirection::Desc => y.compare(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
