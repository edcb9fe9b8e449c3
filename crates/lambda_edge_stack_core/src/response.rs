//! Response `Data` payloads.
//!
//! CloudFormation rejects a SUCCESS response whose `Data` values are not
//! strings, so binary values are rewritten to base64 before sending. FAILED
//! payloads are sent as-is.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseData {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Binary(Vec<u8>),
    List(Vec<ResponseData>),
    Map(BTreeMap<String, ResponseData>),
}

impl ResponseData {
    pub fn empty() -> Self {
        Self::Map(BTreeMap::new())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Map(BTreeMap::from([(
            "Error".to_string(),
            Self::String(message.into()),
        )]))
    }
}

impl From<Value> for ResponseData {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => Self::Number(number),
            Value::String(text) => Self::String(text),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<BTreeMap<String, String>> for ResponseData {
    fn from(outputs: BTreeMap<String, String>) -> Self {
        Self::Map(
            outputs
                .into_iter()
                .map(|(key, value)| (key, Self::String(value)))
                .collect(),
        )
    }
}

impl Serialize for ResponseData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Number(number) => number.serialize(serializer),
            Self::String(text) => serializer.serialize_str(text),
            Self::Binary(bytes) => bytes.serialize(serializer),
            Self::List(items) => items.serialize(serializer),
            Self::Map(entries) => entries.serialize(serializer),
        }
    }
}

/// Rewrites every binary value as a base64 string, at any depth.
pub fn normalize_response_data(data: &ResponseData) -> Value {
    match data {
        ResponseData::Null => Value::Null,
        ResponseData::Bool(flag) => Value::Bool(*flag),
        ResponseData::Number(number) => Value::Number(number.clone()),
        ResponseData::String(text) => Value::String(text.clone()),
        ResponseData::Binary(bytes) => Value::String(STANDARD.encode(bytes)),
        ResponseData::List(items) => Value::Array(items.iter().map(normalize_response_data).collect()),
        ResponseData::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), normalize_response_data(value)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

/// Serializes a payload without normalization, as done for FAILED responses.
pub fn raw_response_data(data: &ResponseData) -> Value {
    serde_json::to_value(data).unwrap_or(Value::Null)
}
