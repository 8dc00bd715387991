use serde::de::DeserializeOwned;
use shape_common::Row;

use crate::error::ShapeError;

/// Trait for types a shape's rows can be decoded into.
///
/// This trait is **automatically implemented** for all types that are
/// `DeserializeOwned + Clone + Send + Sync + 'static`. Rows arrive already
/// coerced by the column schema, so field types map the usual serde way
/// (`int4` to integers, `bool` to `bool`, text to `String`).
///
/// # Example
///
/// ```rust,ignore
/// use serde::Deserialize;
///
/// #[derive(Deserialize, Clone, Debug)]
/// struct Todo {
///     id: i64,
///     task: String,
///     completed: bool,
/// }
///
/// // ShapeRow is automatically implemented.
/// ```
pub trait ShapeRow: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Short type name (no module path) used in error messages.
    fn type_name() -> &'static str {
        let full_name = std::any::type_name::<Self>();
        let base = full_name.split('<').next().unwrap_or(full_name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Decode one row.
    fn from_row(row: &Row) -> Result<Self, ShapeError> {
        serde_json::from_value(serde_json::Value::Object(row.clone())).map_err(|e| {
            ShapeError::Decode {
                type_name: Self::type_name(),
                message: e.to_string(),
            }
        })
    }

    /// Decode a whole snapshot; fails if any row fails.
    fn decode_snapshot(rows: &[Row]) -> Result<Vec<Self>, ShapeError> {
        rows.iter().map(Self::from_row).collect()
    }
}

impl<T> ShapeRow for T where T: DeserializeOwned + Clone + Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, Clone, Debug, PartialEq)]
    struct Item {
        id: i64,
        name: String,
    }

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn short_type_name() {
        assert_eq!(Item::type_name(), "Item");

        mod inner {
            #[allow(dead_code)]
            #[derive(serde::Deserialize, Clone)]
            pub struct Nested {
                pub value: u32,
            }
        }
        assert_eq!(inner::Nested::type_name(), "Nested");
    }

    #[test]
    fn decodes_matching_rows() {
        let rows = vec![
            row(json!({"id": 1, "name": "a"})),
            row(json!({"id": 2, "name": "b", "ignored": true})),
        ];
        let items = Item::decode_snapshot(&rows).unwrap();
        assert_eq!(
            items,
            vec![
                Item { id: 1, name: "a".into() },
                Item { id: 2, name: "b".into() }
            ]
        );
    }

    #[test]
    fn one_bad_row_fails_the_snapshot() {
        let rows = vec![
            row(json!({"id": 1, "name": "a"})),
            row(json!({"id": "two", "name": "b"})),
        ];
        match Item::decode_snapshot(&rows) {
            Err(ShapeError::Decode { type_name, .. }) => assert_eq!(type_name, "Item"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }
}
