//! Conversions between `Value` and `serde_json::Value`.
//!
//! `serde_json::Number` merges integers and floats into one representation;
//! we preserve the distinction by checking `is_i64()` before `is_f64()` on
//! the way in, and by always emitting the tag the `Value` variant names on
//! the way out.

use crate::Value;
use indexmap::IndexMap;
use serde_json::Number;

/// Error converting a `serde_json::Value` into a `Value`.
///
/// The only case this can happen is a JSON number that fits in neither
/// `i64` nor `f64` (e.g. an out-of-range `u64`), which `serde_json` itself
/// can produce from arbitrary-precision input.
#[derive(Debug, Clone, thiserror::Error)]
#[error("json number out of range: {0}")]
pub struct NumberRangeError(pub String);

impl TryFrom<serde_json::Value> for Value {
    type Error = NumberRangeError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => number_to_value(&n),
            serde_json::Value::String(s) => Ok(Self::String(s)),
            serde_json::Value::Array(items) => {
                let converted = items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Array(converted))
            }
            serde_json::Value::Object(map) => {
                let mut converted = IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    converted.insert(k, Value::try_from(v)?);
                }
                Ok(Self::Object(converted))
            }
        }
    }
}

fn number_to_value(n: &Number) -> Result<Value, NumberRangeError> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Integer(i))
    } else if let Some(f) = n.as_f64() {
        Ok(Value::Float(f))
    } else {
        Err(NumberRangeError(n.to_string()))
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(Number::from(i)),
            Value::Float(f) => Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k, v.into());
                }
                serde_json::Value::Object(out)
            }
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let json: serde_json::Value = self.clone().into();
        json.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::try_from(json).map_err(serde::de::Error::custom)
    }
}
