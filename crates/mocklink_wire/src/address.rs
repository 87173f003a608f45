//! Transport address specs.
//!
//! Addresses use the varlink string convention:
//!
//! - `unix:/run/mock.sock` - filesystem unix socket
//! - `unix:@mock` - abstract-namespace unix socket (Linux only)
//! - `tcp:127.0.0.1:12345` - TCP socket

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::WireError;

/// A parsed transport address.
///
/// Parsing keeps enough of the spec string that [`Display`](fmt::Display)
/// round-trips it verbatim into generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// `unix:<path>` - socket file on disk.
    UnixPath(PathBuf),
    /// `unix:@<name>` - abstract namespace, no filesystem entry.
    UnixAbstract(String),
    /// `tcp:<host>:<port>`.
    Tcp(String),
}

impl Address {
    /// Parse an address spec string.
    pub fn parse(spec: &str) -> Result<Self, WireError> {
        if let Some(rest) = spec.strip_prefix("unix:") {
            if rest.is_empty() {
                return Err(WireError::InvalidAddress(spec.to_string()));
            }
            if let Some(name) = rest.strip_prefix('@') {
                if name.is_empty() {
                    return Err(WireError::InvalidAddress(spec.to_string()));
                }
                return Ok(Address::UnixAbstract(name.to_string()));
            }
            return Ok(Address::UnixPath(PathBuf::from(rest)));
        }
        if let Some(rest) = spec.strip_prefix("tcp:") {
            // Needs at least host:port.
            if rest.rsplit_once(':').is_none_or(|(h, p)| h.is_empty() || p.parse::<u16>().is_err()) {
                return Err(WireError::InvalidAddress(spec.to_string()));
            }
            return Ok(Address::Tcp(rest.to_string()));
        }
        Err(WireError::InvalidAddress(spec.to_string()))
    }
}

impl FromStr for Address {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::UnixPath(path) => write!(f, "unix:{}", path.display()),
            Address::UnixAbstract(name) => write!(f, "unix:@{}", name),
            Address::Tcp(hostport) => write!(f, "tcp:{}", hostport),
        }
    }
}
