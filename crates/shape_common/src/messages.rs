use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Row;
use crate::error::ProtocolError;

/// Response header carrying the shape handle.
pub const HANDLE_HEADER: &str = "electric-handle";
/// Response header carrying the offset to resume from.
pub const OFFSET_HEADER: &str = "electric-offset";
/// Response header carrying the column schema as JSON.
pub const SCHEMA_HEADER: &str = "electric-schema";
/// Response header carrying the live-mode cache buster.
pub const CURSOR_HEADER: &str = "electric-cursor";
/// Response header present when the response ends at the head of the log.
pub const UP_TO_DATE_HEADER: &str = "electric-up-to-date";

/// Position in a shape log.
///
/// Offsets are opaque to the client; the only one it ever constructs is
/// [`Offset::BEFORE_ALL`], which requests the log from the beginning.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offset(String);

impl Offset {
    /// Offset that asks the server for the full log.
    pub const BEFORE_ALL: &'static str = "-1";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn before_all() -> Self {
        Self(Self::BEFORE_ALL.to_string())
    }

    pub fn is_before_all(&self) -> bool {
        self.0 == Self::BEFORE_ALL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Offset {
    fn default() -> Self {
        Self::before_all()
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned identity of one shape instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeHandle(String);

impl ShapeHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of change carried by a change message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

/// Control messages interleaved with the change log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Control {
    /// Everything up to the head of the log has been delivered.
    UpToDate,
    /// The shape was invalidated server-side; start over from `-1`.
    MustRefetch,
    /// End of the initial snapshot portion of the log.
    SnapshotEnd,
    /// A control value this client does not know about.
    Other(String),
}

impl From<&str> for Control {
    fn from(raw: &str) -> Self {
        match raw {
            "up-to-date" => Control::UpToDate,
            "must-refetch" => Control::MustRefetch,
            "snapshot-end" => Control::SnapshotEnd,
            other => Control::Other(other.to_string()),
        }
    }
}

/// One change to a row, identified by its shape key.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeMessage {
    pub key: String,
    pub operation: Operation,
    pub value: Row,
}

/// An entry of the shape log.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "WireMessage")]
pub enum ShapeMessage {
    Change(ChangeMessage),
    Control(Control),
}

impl ShapeMessage {
    /// Parse a response body: a JSON array of messages.
    ///
    /// An empty body is treated as an empty batch.
    pub fn parse_batch(body: &str) -> Result<Vec<ShapeMessage>, ProtocolError> {
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(body).map_err(|e| ProtocolError::MalformedLog(e.to_string()))
    }

    pub fn is_up_to_date(&self) -> bool {
        matches!(self, ShapeMessage::Control(Control::UpToDate))
    }
}

#[derive(Deserialize)]
struct WireHeaders {
    #[serde(default)]
    operation: Option<Operation>,
    #[serde(default)]
    control: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<Row>,
    headers: WireHeaders,
}

impl TryFrom<WireMessage> for ShapeMessage {
    type Error = String;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        if let Some(control) = wire.headers.control {
            return Ok(ShapeMessage::Control(Control::from(control.as_str())));
        }

        let operation = wire
            .headers
            .operation
            .ok_or_else(|| "message has neither an operation nor a control header".to_string())?;
        let key = wire
            .key
            .ok_or_else(|| format!("{:?} message without a key", operation))?;

        Ok(ShapeMessage::Change(ChangeMessage {
            key,
            operation,
            value: wire.value.unwrap_or_default(),
        }))
    }
}
