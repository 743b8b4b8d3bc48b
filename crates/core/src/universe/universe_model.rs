use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_INDUSTRY;

/// Industry selection in the dashboard.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum IndustryFilter {
    All,
    Industry(String),
}

impl IndustryFilter {
    /// Selection value used by the industry selector and query strings.
    pub const ALL_KEY: &'static str = "ALL";

    pub fn from_selection(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case(Self::ALL_KEY) {
            IndustryFilter::All
        } else {
            IndustryFilter::Industry(value.to_string())
        }
    }

    pub fn selection_value(&self) -> &str {
        match self {
            IndustryFilter::All => Self::ALL_KEY,
            IndustryFilter::Industry(name) => name,
        }
    }
}

impl fmt::Display for IndustryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndustryFilter::All => f.write_str("All Industries"),
            IndustryFilter::Industry(name) => f.write_str(name),
        }
    }
}

/// One symbol with its industry label.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub symbol: String,
    pub industry: String,
}

/// The symbols the dashboard covers, in file order.
#[derive(Clone, Debug, Default)]
pub struct SymbolUniverse {
    entries: Vec<UniverseEntry>,
    index: HashMap<String, usize>,
}

impl SymbolUniverse {
    /// Build from `(symbol, industry)` pairs.
    ///
    /// A repeated symbol keeps its first position and takes the later label.
    /// Blank labels become `"N/A"`.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = UniverseEntry>,
    {
        let mut universe = Self::default();
        for mut entry in entries {
            entry.symbol = entry.symbol.trim().to_string();
            if entry.symbol.is_empty() {
                continue;
            }
            if entry.industry.trim().is_empty() {
                entry.industry = UNKNOWN_INDUSTRY.to_string();
            }
            match universe.index.get(&entry.symbol) {
                Some(&pos) => universe.entries[pos].industry = entry.industry,
                None => {
                    universe
                        .index
                        .insert(entry.symbol.clone(), universe.entries.len());
                    universe.entries.push(entry);
                }
            }
        }
        universe
    }

    pub fn entries(&self) -> &[UniverseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn industry_of(&self, symbol: &str) -> Option<&str> {
        self.index
            .get(symbol)
            .map(|&pos| self.entries[pos].industry.as_str())
    }

    /// Distinct industry labels, sorted, without `"N/A"`.
    pub fn industries(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.industry.as_str())
            .filter(|i| *i != UNKNOWN_INDUSTRY)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Symbols matching `filter`, in file order.
    pub fn symbols_for(&self, filter: &IndustryFilter) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| match filter {
                IndustryFilter::All => true,
                IndustryFilter::Industry(name) => &e.industry == name,
            })
            .map(|e| e.symbol.clone())
            .collect()
    }
}
