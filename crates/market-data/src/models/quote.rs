use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::coerce::{first_f64, first_str};

/// Raw quote record returned by the exchange-quote endpoint.
///
/// Only the four sections the dashboard reads are kept. A section that is
/// missing, `null`, or not an object deserializes as an empty map so field
/// lookups never need to care about the shape of the response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Listing metadata (`pdSymbolPe`, `pdSectorPe`, ...)
    #[serde(default, deserialize_with = "object_or_empty")]
    pub metadata: Map<String, Value>,

    /// Share capital (`issuedSize`, ...)
    #[serde(default, deserialize_with = "object_or_empty")]
    pub security_info: Map<String, Value>,

    /// Prices for the current session and the 52-week range
    #[serde(default, deserialize_with = "object_or_empty")]
    pub price_info: Map<String, Value>,

    /// Sector / industry labels
    #[serde(default, deserialize_with = "object_or_empty")]
    pub industry_info: Map<String, Value>,
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

impl QuoteRecord {
    /// Symbol P/E, falling back to the sector P/E.
    pub fn pe(&self) -> Option<f64> {
        first_f64(&self.metadata, &["pdSymbolPe", "pdSectorPe"])
    }

    /// Last traded price, falling back to the close.
    pub fn last_price(&self) -> Option<f64> {
        first_f64(&self.price_info, &["lastPrice", "close"])
    }

    /// Previous session close, falling back to the close.
    pub fn previous_close(&self) -> Option<f64> {
        first_f64(&self.price_info, &["previousClose", "close"])
    }

    /// Today's open.
    pub fn open(&self) -> Option<f64> {
        first_f64(&self.price_info, &["open"])
    }

    /// Number of issued shares.
    pub fn issued_shares(&self) -> Option<f64> {
        first_f64(
            &self.security_info,
            &["issuedSize", "issuedShares", "issuedCapital"],
        )
    }

    /// 52-week `(high, low)`.
    pub fn week_high_low(&self) -> (Option<f64>, Option<f64>) {
        match self.price_info.get("weekHighLow") {
            Some(Value::Object(week)) => (first_f64(week, &["max"]), first_f64(week, &["min"])),
            _ => (None, None),
        }
    }

    /// Sector label shown in the table (`industry`, then `sector`).
    pub fn sector(&self) -> Option<&str> {
        first_str(&self.industry_info, &["industry", "sector"])
    }

    /// Industry label used when building the static symbol mapping
    /// (`industry`, then `sector`, then `basicIndustry`).
    pub fn industry_label(&self) -> Option<&str> {
        first_str(
            &self.industry_info,
            &["industry", "sector", "basicIndustry"],
        )
    }

    /// Whether the endpoint returned anything useful for the symbol.
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
            && self.security_info.is_empty()
            && self.price_info.is_empty()
            && self.industry_info.is_empty()
    }
}
