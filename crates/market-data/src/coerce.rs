//! Lenient conversion of provider fields into numbers.
//!
//! The quote endpoint mixes JSON numbers, numeric strings with thousands
//! separators, and sentinel strings such as `"NA"` or `"-"` in the same
//! field across symbols. Every conversion here is total: anything that
//! isn't a clean number becomes `None`.

use serde_json::{Map, Value};

/// Parse a numeric string, stripping whitespace and thousands separators.
///
/// Blank strings and case-insensitive `"NA"` are absent.
pub fn parse_f64(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("NA") {
        return None;
    }
    s.replace(',', "").parse::<f64>().ok()
}

/// Convert a JSON value into an `f64`.
///
/// Numbers pass through, strings go through [`parse_f64`]; `null`, booleans,
/// arrays and objects are absent.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_f64(s),
        _ => None,
    }
}

/// Whether a value counts as "set" when choosing between fallback keys.
///
/// Empty strings, zero, `false`, `null` and empty containers are unset, so a
/// `lastPrice` of `0` falls through to `close`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Return the first value under `keys` that is set.
///
/// When none is set the value under the last key is returned as is, so a
/// P/E of `0` under both keys still reads as zero rather than absent.
pub fn first_truthy<'a>(section: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| section.get(*k))
        .find(|v| is_truthy(v))
        .or_else(|| keys.last().and_then(|k| section.get(*k)))
}

/// [`first_truthy`] followed by [`coerce_f64`].
pub fn first_f64(section: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    first_truthy(section, keys).and_then(coerce_f64)
}

/// [`first_truthy`] as a non-empty string.
pub fn first_str<'a>(section: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    first_truthy(section, keys)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
