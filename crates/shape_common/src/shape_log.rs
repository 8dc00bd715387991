use std::collections::HashMap;

use crate::Row;
use crate::messages::{ChangeMessage, Control, Offset, Operation, ShapeHandle, ShapeMessage};
use crate::schema::Schema;

/// Full set of rows at an up-to-date point of the log.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeSnapshot {
    pub handle: Option<ShapeHandle>,
    pub offset: Offset,
    pub rows: Vec<Row>,
}

impl ShapeSnapshot {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of applying a batch of messages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Applied {
    /// Number of change messages applied.
    pub changes: usize,
    /// An `up-to-date` control message was seen.
    pub up_to_date: bool,
    /// A `must-refetch` control message was seen; the log was cleared.
    pub must_refetch: bool,
}

/// Materialized shape log.
///
/// Rows are kept in the order their keys were first inserted. Updates merge
/// into the existing row in place; a delete drops the key, so a later insert
/// of the same key is appended at the end.
#[derive(Debug, Default)]
pub struct ShapeLog {
    schema: Schema,
    order: Vec<String>,
    rows: HashMap<String, Row>,
}

impl ShapeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    pub fn set_schema(&mut self, schema: Schema) {
        self.schema = schema;
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop all rows and the schema.
    pub fn reset(&mut self) {
        self.schema = Schema::default();
        self.order.clear();
        self.rows.clear();
    }

    /// Apply a batch in order.
    ///
    /// A `must-refetch` clears the log and discards the rest of the batch,
    /// since it belongs to the invalidated shape.
    pub fn apply(&mut self, messages: impl IntoIterator<Item = ShapeMessage>) -> Applied {
        let mut applied = Applied::default();

        for message in messages {
            match message {
                ShapeMessage::Change(change) => {
                    self.apply_change(change);
                    applied.changes += 1;
                }
                ShapeMessage::Control(Control::UpToDate) => applied.up_to_date = true,
                ShapeMessage::Control(Control::MustRefetch) => {
                    log::debug!("shape log invalidated, dropping {} rows", self.len());
                    self.reset();
                    applied.must_refetch = true;
                    applied.up_to_date = false;
                    break;
                }
                ShapeMessage::Control(Control::SnapshotEnd) => {}
                ShapeMessage::Control(Control::Other(control)) => {
                    log::debug!("ignoring unknown control message '{}'", control);
                }
            }
        }

        applied
    }

    fn apply_change(&mut self, change: ChangeMessage) {
        let ChangeMessage { key, operation, value } = change;

        match operation {
            Operation::Insert => {
                let value = self.schema.parse_row(value);
                if self.rows.insert(key.clone(), value).is_none() {
                    self.order.push(key);
                }
            }
            Operation::Update => {
                let value = self.schema.parse_row(value);
                match self.rows.get_mut(&key) {
                    Some(existing) => existing.extend(value),
                    None => {
                        self.rows.insert(key.clone(), value);
                        self.order.push(key);
                    }
                }
            }
            Operation::Delete => {
                if self.rows.remove(&key).is_some() {
                    self.order.retain(|k| k != &key);
                }
            }
        }
    }

    /// Rows in log order.
    pub fn rows(&self) -> Vec<Row> {
        self.order
            .iter()
            .filter_map(|key| self.rows.get(key).cloned())
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn snapshot(&self, handle: Option<ShapeHandle>, offset: Offset) -> ShapeSnapshot {
        ShapeSnapshot {
            handle,
            offset,
            rows: self.rows(),
        }
    }
}
