use shape_common::ProtocolError;
use shape_common::messages::SCHEMA_HEADER;
use thiserror::Error;

/// Errors that can occur while following a shape.
///
/// `Clone` so the last error can be held in a signal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    /// The endpoint answered with a status the client cannot continue from.
    #[error("shape endpoint returned HTTP {status}")]
    Http {
        /// HTTP status code
        status: u16,
    },

    /// The request never produced a response (network down, CORS, ...).
    #[error("shape request failed: {message}")]
    Transport {
        /// Error message from the HTTP layer
        message: String,
    },

    /// The response body was not a valid shape log.
    #[error("malformed shape response: {message}")]
    MalformedBody {
        /// Parser error message
        message: String,
    },

    /// A required response header was missing or unreadable.
    #[error("malformed '{header}' header: {message}")]
    MalformedHeader {
        /// Header name
        header: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// A row did not match the type it was decoded into.
    #[error("failed to decode rows as '{type_name}': {message}")]
    Decode {
        /// Short name of the target row type
        type_name: &'static str,
        /// Error message from the deserializer
        message: String,
    },
}

impl From<ProtocolError> for ShapeError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::MalformedLog(message) => ShapeError::MalformedBody { message },
            ProtocolError::MalformedSchema(message) => ShapeError::MalformedHeader {
                header: SCHEMA_HEADER,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ShapeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ShapeError::Http {
                status: status.as_u16(),
            },
            None => ShapeError::Transport {
                message: err.to_string(),
            },
        }
    }
}
