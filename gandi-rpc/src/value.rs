//! XML-RPC value model
//!
//! Values bridge to `serde_json::Value` so request payloads and response
//! records can be handled with ordinary `serde` types.

use gandi_core::{GandiError, Result};
use serde_json::{Map, Number};
use std::collections::BTreeMap;

/// A single XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    Double(f64),
    /// `dateTime.iso8601`, kept in the textual form the provider sent
    DateTime(String),
    /// Base64 payload, kept encoded
    Base64(String),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    /// Convert into JSON. Date-times and base64 payloads become strings.
    ///
    /// # Errors
    ///
    /// Returns a codec error for non-finite doubles, which JSON cannot hold.
    pub fn into_json(self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::String(s) | Value::DateTime(s) | Value::Base64(s) => {
                serde_json::Value::String(s)
            }
            Value::Double(d) => Number::from_f64(d)
                .map(serde_json::Value::Number)
                .ok_or_else(|| GandiError::Codec(format!("Non-finite double: {}", d)))?,
            Value::Array(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(Value::into_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Struct(members) => {
                let mut map = Map::with_capacity(members.len());
                for (name, value) in members {
                    map.insert(name, value.into_json()?);
                }
                serde_json::Value::Object(map)
            }
            Value::Nil => serde_json::Value::Null,
        })
    }

    /// Build from a JSON value. Integral numbers become `Int`, others `Double`.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Struct(
                map.into_iter()
                    .map(|(name, value)| (name, Value::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Member lookup for struct values
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(name),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
