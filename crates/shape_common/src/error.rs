use thiserror::Error;

/// Errors raised while interpreting data received from a shape endpoint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// The response body was not a JSON array of shape messages.
    #[error("malformed shape log: {0}")]
    MalformedLog(String),

    /// The `electric-schema` header could not be parsed.
    #[error("malformed column schema: {0}")]
    MalformedSchema(String),
}
