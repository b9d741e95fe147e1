//! Wire-format helpers shared by the record and leaf types.
//!
//! Every field type is bound to JSON with serde. The helpers here cover the
//! places where the wire format is looser than a plain derive: list fields
//! that also accept a single bare value, integers written as strings, and
//! compact textual forms of object-shaped leaves.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{TypeError, TypeResult};

/// Fields present in the source but outside the known schema, in input order.
pub type Extensions = Map<String, Value>;

/// Human-readable JSON type name, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decode `raw`, the value found under `field`, reporting failures against
/// that field.
pub fn decode_field<T: DeserializeOwned>(field: &str, raw: Value) -> TypeResult<T> {
    T::deserialize(raw).map_err(|err| TypeError::invalid(field, err.to_string()))
}

pub(crate) fn unexpected<E: serde::de::Error>(what: &str, found: &Value) -> E {
    E::custom(format_args!("expected {what}, found {}", json_type_name(found)))
}

/// `deserialize_with` for list fields. A single bare value reads as a
/// one-element list and `null` as an empty one.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| T::deserialize(item).map_err(D::Error::custom))
            .collect(),
        single => T::deserialize(single)
            .map(|one| vec![one])
            .map_err(D::Error::custom),
    }
}

/// `deserialize_with` for optional integers that may arrive as numeric text.
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format_args!("{n} is not an integer"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format_args!("{s:?} is not an integer"))),
        other => Err(unexpected("integer", &other)),
    }
}
