//! # Shape Common
//!
//! Wire-level types shared by everything that reads an HTTP shape log.
//!
//! A *shape* is a server-defined, filtered view of a single table. The
//! server streams it as an ordered log of change messages (`insert`,
//! `update`, `delete`) interleaved with control messages (`up-to-date`,
//! `must-refetch`). This crate is IO-free: it knows how to parse that log,
//! how to coerce row values with the column schema, and how to fold the
//! log into an ordered set of rows. The transport lives in `shape_client`.

pub mod error;
pub mod messages;
pub mod params;
pub mod schema;
pub mod shape_log;

pub use error::ProtocolError;
pub use messages::{ChangeMessage, Control, Offset, Operation, ShapeHandle, ShapeMessage};
pub use params::{Replica, ShapeParams, ShapeRequest};
pub use schema::{ColumnInfo, Schema};
pub use shape_log::{Applied, ShapeLog, ShapeSnapshot};

/// A single materialized row: column name to (schema-parsed) JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;
