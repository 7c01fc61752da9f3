//! Typed access to Move object content.
//!
//! The JSON-RPC node renders Move struct fields as loosely typed JSON: `u64`
//! values arrive as decimal strings, `vector<u8>` as arrays of numbers and
//! nested structs as `{ "type": ..., "fields": { ... } }`. [`MoveFields`]
//! hides those quirks behind "require a known field" accessors so decoding
//! failures surface at the client boundary with the field name attached.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Field '{field}' is required")]
    Missing { field: String },

    #[error("Field '{field}' has an unexpected shape: expected {expected}")]
    WrongShape { field: String, expected: &'static str },
}

impl FieldError {
    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    #[must_use]
    pub fn wrong_shape(field: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongShape {
            field: field.into(),
            expected,
        }
    }
}

/// The `fields` map of a Move object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveFields(Map<String, Value>);

impl MoveFields {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Builds fields from an arbitrary JSON value; non-objects yield an
    /// empty map.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    fn require(&self, field: &str) -> Result<&Value, FieldError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Err(FieldError::missing(field)),
            Some(value) => Ok(value),
        }
    }

    /// A `u64` rendered either as a JSON number or a decimal string.
    pub fn require_u64(&self, field: &str) -> Result<u64, FieldError> {
        match self.require(field)? {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| FieldError::wrong_shape(field, "unsigned integer")),
            Value::String(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| FieldError::wrong_shape(field, "unsigned integer")),
            _ => Err(FieldError::wrong_shape(field, "unsigned integer")),
        }
    }

    pub fn require_bool(&self, field: &str) -> Result<bool, FieldError> {
        self.require(field)?
            .as_bool()
            .ok_or_else(|| FieldError::wrong_shape(field, "boolean"))
    }

    pub fn require_str(&self, field: &str) -> Result<&str, FieldError> {
        self.require(field)?
            .as_str()
            .ok_or_else(|| FieldError::wrong_shape(field, "string"))
    }

    /// A `vector<u8>` rendered as an array of numbers or as a hex string.
    pub fn require_bytes(&self, field: &str) -> Result<Vec<u8>, FieldError> {
        match self.require(field)? {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| FieldError::wrong_shape(field, "byte array"))
                })
                .collect(),
            Value::String(s) => hex::decode(crate::codec::strip_hex_prefix(s))
                .map_err(|_| FieldError::wrong_shape(field, "byte array")),
            _ => Err(FieldError::wrong_shape(field, "byte array")),
        }
    }

    /// Nested struct fields, unwrapping the `{ "fields": ... }` envelope.
    pub fn nested(&self, field: &str) -> Result<MoveFields, FieldError> {
        match self.require(field)? {
            Value::Object(map) => match map.get("fields") {
                Some(Value::Object(inner)) => Ok(Self(inner.clone())),
                _ => Ok(Self(map.clone())),
            },
            _ => Err(FieldError::wrong_shape(field, "struct")),
        }
    }
}

impl From<Map<String, Value>> for MoveFields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
