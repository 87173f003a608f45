//! Error types for the wire layer.

use std::io;

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the wire layer.
#[derive(Debug, Error)]
pub enum WireError {
    /// The address spec did not match any supported transport.
    #[error("invalid address `{0}` (expected unix:PATH, unix:@NAME or tcp:HOST:PORT)")]
    InvalidAddress(String),

    /// The peer closed the connection while a message was outstanding.
    ///
    /// This is the "expected disconnection" kind: killing a mock process
    /// mid-call surfaces here, and callers that provoked the kill are
    /// entitled to ignore it.
    #[error("connection closed by peer")]
    Disconnected,

    /// Any other transport-level I/O failure.
    #[error("wire i/o error: {0}")]
    Io(#[from] io::Error),

    /// A frame that was not a well-formed message.
    #[error("malformed wire message: {0}")]
    Protocol(String),

    /// The remote service replied with an error.
    #[error("call failed with `{error}`")]
    Call {
        /// Error name, e.g. `org.varlink.service.MethodNotFound`.
        error: String,
        /// Error parameters as sent by the service.
        parameters: Value,
    },
}

impl WireError {
    /// Map an I/O error, folding the broken-pipe class into [`WireError::Disconnected`].
    pub(crate) fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => WireError::Disconnected,
            _ => WireError::Io(err),
        }
    }

    /// Whether this error is the expected-disconnection kind.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, WireError::Disconnected)
    }
}

/// Errors a [`crate::CallHandler`] can report back to the client.
///
/// Each variant maps to one of the standard service error names on the
/// wire, so handlers never deal with error-name strings directly.
#[derive(Debug, Error)]
pub enum CallError {
    /// The requested method is not part of the bound interface.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// A parameter was missing or had the wrong shape.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The handler itself failed.
    #[error("call failed: {0}")]
    Failed(String),
}

impl CallError {
    /// The wire-level error name for this variant.
    pub fn wire_name(&self) -> &'static str {
        match self {
            CallError::MethodNotFound(_) => "org.varlink.service.MethodNotFound",
            CallError::InvalidParameter(_) => "org.varlink.service.InvalidParameter",
            CallError::Failed(_) => "org.varlink.service.InternalError",
        }
    }

    /// The detail string carried in the error parameters.
    pub fn detail(&self) -> &str {
        match self {
            CallError::MethodNotFound(s) | CallError::InvalidParameter(s) | CallError::Failed(s) => s,
        }
    }
}
