// kiln/src/core/metadata.rs

//! Metadata maps and the ordering used when stages sort records by a metadata key.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::cmp::Ordering;

/// String-keyed metadata. Backed by an ordered map, so iteration and
/// serialization are deterministic.
pub type Metadata = serde_json::Map<String, Value>;

/// Parses the date formats front matter commonly carries.
///
/// Accepted: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
/// and RFC 3339 (normalized to UTC).
pub fn parse_date(value: &Value) -> Option<NaiveDateTime> {
  let s = value.as_str()?.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.naive_utc());
  }
  for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(dt);
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn rank(value: Option<&Value>) -> u8 {
  match value {
    None => 0,
    Some(Value::Null) => 1,
    Some(Value::Bool(_)) => 2,
    Some(Value::Number(_)) => 3,
    Some(v @ Value::String(_)) if parse_date(v).is_some() => 4,
    Some(Value::String(_)) => 5,
    Some(Value::Array(_)) => 6,
    Some(Value::Object(_)) => 7,
  }
}

/// Total order over optional metadata values:
/// absent < null < bool < number < date < string < array < object.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
  let (ra, rb) = (rank(a), rank(b));
  if ra != rb {
    return ra.cmp(&rb);
  }
  match (a, b) {
    (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
    (Some(Value::Number(x)), Some(Value::Number(y))) => {
      let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
      x.partial_cmp(&y).unwrap_or(Ordering::Equal)
    }
    (Some(x @ Value::String(sx)), Some(y @ Value::String(sy))) => match (parse_date(x), parse_date(y)) {
      (Some(dx), Some(dy)) => dx.cmp(&dy),
      _ => sx.cmp(sy),
    },
    // Arrays and objects have no natural order; compare their JSON text.
    (Some(x), Some(y)) if ra >= 6 => x.to_string().cmp(&y.to_string()),
    _ => Ordering::Equal,
  }
}

/// Reads a list-ish metadata value: arrays yield their string items,
/// strings are split on commas. Empty entries are dropped.
pub fn string_list(value: &Value) -> Vec<String> {
  match value {
    Value::Array(items) => items
      .iter()
      .filter_map(|item| match item {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
      })
      .filter(|s| !s.is_empty())
      .collect(),
    Value::String(s) => s
      .split(',')
      .map(|part| part.trim().to_string())
      .filter(|s| !s.is_empty())
      .collect(),
    _ => Vec::new(),
  }
}

/// Appends `item` to the array stored under `key`, creating it (or
/// promoting a scalar into a one-element array) as needed. Duplicates are
/// not added twice.
pub fn push_unique(metadata: &mut Metadata, key: &str, item: Value) {
  let slot = metadata.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new()));
  if !slot.is_array() {
    let previous = std::mem::take(slot);
    *slot = match previous {
      Value::Null => Value::Array(Vec::new()),
      scalar => Value::Array(vec![scalar]),
    };
  }
  if let Value::Array(items) = slot {
    if !items.contains(&item) {
      items.push(item);
    }
  }
}
