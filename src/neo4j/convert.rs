//! JSON record to Bolt value conversion

use crate::storage::Record;
use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType};
use serde_json::Value;

/// Convert one JSON value to its Bolt counterpart.
///
/// Integers that fit in i64 stay integers; every other number becomes a float.
pub fn json_to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(v) => BoltType::Boolean(BoltBoolean::new(*v)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => BoltType::String(BoltString::new(s)),
        Value::Array(items) => BoltType::List(BoltList {
            value: items.iter().map(json_to_bolt).collect(),
        }),
        Value::Object(map) => record_to_bolt(map),
    }
}

pub fn record_to_bolt(record: &Record) -> BoltType {
    BoltType::Map(BoltMap {
        value: record
            .iter()
            .map(|(k, v)| (BoltString::new(k), json_to_bolt(v)))
            .collect(),
    })
}

/// Bind a whole chunk as one Bolt list.
pub fn chunk_to_bolt(chunk: &[Record]) -> BoltType {
    BoltType::List(BoltList {
        value: chunk.iter().map(record_to_bolt).collect(),
    })
}
