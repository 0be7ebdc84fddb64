//! Record lookup over untyped JSON documents
//!
//! A lookup document is an object whose members are arrays of record
//! objects. Only the first member holding a non-empty array is searched.

use serde_json::{Map, Value};

/// Outcome of a by-ID lookup
#[derive(Debug, Clone, PartialEq)]
pub enum RecordLookup {
    /// A record in the selected collection carried the requested id
    Found(Map<String, Value>),
    /// The selected collection had no record with the requested id
    NoMatch,
    /// No member of the document held a non-empty array
    NoCollection,
}

impl RecordLookup {
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// The matched record, or an empty object for either kind of miss.
    pub fn into_record(self) -> Map<String, Value> {
        match self {
            Self::Found(record) => record,
            Self::NoMatch | Self::NoCollection => Map::new(),
        }
    }
}

/// Check that `value` is an object of record arrays and hand back its members.
///
/// `null` members count as empty collections and `null` array items as
/// records without fields; any other shape is rejected with a reason.
pub fn validate_collections(value: Value) -> Result<Map<String, Value>, String> {
    let members = match value {
        Value::Object(members) => members,
        other => {
            return Err(format!(
                "expected an object of record arrays, found {}",
                kind_of(&other)
            ))
        }
    };

    for (key, member) in &members {
        match member {
            Value::Null => {}
            Value::Array(items) => {
                if let Some((index, item)) = items
                    .iter()
                    .enumerate()
                    .find(|(_, item)| !matches!(item, Value::Object(_) | Value::Null))
                {
                    return Err(format!(
                        "item {index} of '{key}' is {}, expected an object",
                        kind_of(item)
                    ));
                }
            }
            other => {
                return Err(format!(
                    "member '{key}' is {}, expected an array",
                    kind_of(other)
                ))
            }
        }
    }

    Ok(members)
}

/// Pick the first member (in document order) whose array is non-empty.
///
/// Later members are never inspected or merged, even when they also hold
/// records.
pub fn first_collection(members: Map<String, Value>) -> Option<Vec<Value>> {
    members.into_iter().find_map(|(_, member)| match member {
        Value::Array(items) if !items.is_empty() => Some(items),
        _ => None,
    })
}

/// Find the first record whose stringified `id` equals `id`.
pub fn find_record(records: Vec<Value>, id: &str) -> Option<Map<String, Value>> {
    records.into_iter().find_map(|record| match record {
        Value::Object(fields)
            if fields.get("id").and_then(record_id_string).as_deref() == Some(id) =>
        {
            Some(fields)
        }
        _ => None,
    })
}

/// Run the whole lookup over an already parsed document.
pub fn lookup(value: Value, id: &str) -> Result<RecordLookup, String> {
    let members = validate_collections(value)?;
    let Some(records) = first_collection(members) else {
        return Ok(RecordLookup::NoCollection);
    };
    Ok(find_record(records, id).map_or(RecordLookup::NoMatch, RecordLookup::Found))
}

/// String form of an `id` value used for comparison.
///
/// Numbers print without a fractional part when they have none, so `3`,
/// `3.0` and `"3"` all compare equal to `"3"`. Null, arrays and objects
/// have no string form and never match.
pub fn record_id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(format_float)
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{f:.0}")
    } else {
        f.to_string()
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
