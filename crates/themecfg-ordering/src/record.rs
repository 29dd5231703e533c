//! Grouped configuration records.
//!
//! A record is a JSON object with a mandatory string `group` key. Every other
//! key is carried through untouched, in its original order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{MalformedReason, OrderingError, OrderingResult};

/// Key every record must carry.
pub const GROUP_KEY: &str = "group";

/// A single custom config object.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    group: String,
    object: Map<String, Value>,
}

impl Record {
    /// Validate a JSON value as a record.
    ///
    /// Fails with [`OrderingError::MalformedRecord`] when the value is not an
    /// object or its `group` key is absent or not a string. The offending
    /// value is logged before the error is returned.
    pub fn from_value(value: Value) -> OrderingResult<Self> {
        let object = match value {
            Value::Object(object) => object,
            other => return Err(malformed(MalformedReason::NotAnObject, &other)),
        };

        let group = match object.get(GROUP_KEY) {
            Some(Value::String(group)) => Ok(group.clone()),
            Some(_) => Err(MalformedReason::GroupNotString),
            None => Err(MalformedReason::MissingGroup),
        };

        match group {
            Ok(group) => Ok(Self { group, object }),
            Err(reason) => Err(malformed(reason, &Value::Object(object))),
        }
    }

    /// Group this record belongs to.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Look up a field by key (including `group`).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.object.get(key)
    }
}

fn malformed(reason: MalformedReason, value: &Value) -> OrderingError {
    let content = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    tracing::error!(
        "Malformed custom config object - {}:\n{}",
        reason,
        content
    );
    OrderingError::MalformedRecord { reason, content }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.object)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.object.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Record::from_value(value).map_err(serde::de::Error::custom)
    }
}
