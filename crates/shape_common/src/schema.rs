//! Column schema and value coercion.
//!
//! The shape endpoint sends every column value as text. The
//! `electric-schema` header describes the Postgres type of each column so
//! the client can turn `"1"` into `1` and `"t"` into `true` before handing
//! rows to typed deserialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Row;
use crate::error::ProtocolError;

/// Type information for one column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    #[serde(rename = "type")]
    pub pg_type: String,
    /// Array dimensions; absent for scalar columns.
    #[serde(default)]
    pub dims: Option<u32>,
    #[serde(default)]
    pub pk_index: Option<u32>,
    #[serde(default)]
    pub not_null: Option<bool>,
}

/// Column name to column type, as advertised by the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(HashMap<String, ColumnInfo>);

impl Schema {
    /// Parse the JSON value of the `electric-schema` header.
    pub fn from_header(raw: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(raw).map_err(|e| ProtocolError::MalformedSchema(e.to_string()))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Coerce every value of `row` according to its column type.
    ///
    /// Columns missing from the schema are passed through untouched.
    pub fn parse_row(&self, row: Row) -> Row {
        row.into_iter()
            .map(|(column, value)| {
                let parsed = match self.column(&column) {
                    Some(info) => parse_value(info, value),
                    None => value,
                };
                (column, parsed)
            })
            .collect()
    }
}

/// Coerce a single value.
///
/// Values that are already typed JSON (not strings) are accepted as-is.
/// Text that does not parse as its declared type is kept as text, so the
/// mismatch surfaces when the row is decoded into its target type.
pub fn parse_value(info: &ColumnInfo, value: Value) -> Value {
    let text = match value {
        Value::String(text) => text,
        other => return other,
    };

    // Array literals are left as text.
    if info.dims.unwrap_or(0) > 0 {
        return Value::String(text);
    }

    match info.pg_type.as_str() {
        "int2" | "int4" | "int8" | "oid" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::String(text)),
        "float4" | "float8" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::String(text)),
        "bool" => match text.as_str() {
            "t" | "true" => Value::Bool(true),
            "f" | "false" => Value::Bool(false),
            _ => Value::String(text),
        },
        "json" | "jsonb" => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        _ => Value::String(text),
    }
}
