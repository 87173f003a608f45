//! Message framing: one JSON object per message, NUL-terminated.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, WireError};

/// A call request as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Fully qualified method name, e.g. `org.service.com.Test1`.
    pub method: String,
    /// Call arguments; an absent field means no arguments.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
}

/// A call reply as it appears on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reply {
    /// Error name, present only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Result fields on success, error detail fields on failure.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parameters: Value,
}

impl Reply {
    /// A successful reply carrying the given result fields.
    pub fn ok(parameters: Value) -> Self {
        Reply {
            error: None,
            parameters,
        }
    }

    /// An error reply with a wire error name and detail fields.
    pub fn error(name: impl Into<String>, parameters: Value) -> Self {
        Reply {
            error: Some(name.into()),
            parameters,
        }
    }
}

/// Read one NUL-terminated frame and decode it.
///
/// Returns `Ok(None)` on a clean end of stream (the peer hung up between
/// messages). A stream that ends mid-frame is reported as
/// [`WireError::Disconnected`].
pub fn read_frame<T, R>(reader: &mut R) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
    R: BufRead,
{
    let mut buf = Vec::new();
    let n = reader.read_until(0, &mut buf).map_err(WireError::from_io)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&0) {
        return Err(WireError::Disconnected);
    }
    buf.pop();
    let value = serde_json::from_slice(&buf).map_err(|e| WireError::Protocol(e.to_string()))?;
    Ok(Some(value))
}

/// Encode one message and write it as a NUL-terminated frame.
pub fn write_frame<T, W>(writer: &mut W, message: &T) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    let mut bytes = serde_json::to_vec(message).map_err(|e| WireError::Protocol(e.to_string()))?;
    bytes.push(0);
    writer.write_all(&bytes).map_err(WireError::from_io)?;
    writer.flush().map_err(WireError::from_io)?;
    Ok(())
}
