//! Byte-stream abstraction over the supported transports.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::unix::net::UnixStream;

use crate::{Address, Result, WireError};

/// A connected stream on any supported transport.
pub(crate) enum StreamKind {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl StreamKind {
    /// Connect to the given address.
    pub(crate) fn connect(address: &Address) -> Result<StreamKind> {
        match address {
            Address::UnixPath(path) => Ok(StreamKind::Unix(
                UnixStream::connect(path).map_err(WireError::from_io)?,
            )),
            Address::UnixAbstract(name) => {
                use std::os::linux::net::SocketAddrExt;
                let addr = std::os::unix::net::SocketAddr::from_abstract_name(name.as_bytes())
                    .map_err(WireError::from_io)?;
                Ok(StreamKind::Unix(
                    UnixStream::connect_addr(&addr).map_err(WireError::from_io)?,
                ))
            }
            Address::Tcp(hostport) => Ok(StreamKind::Tcp(
                TcpStream::connect(hostport.as_str()).map_err(WireError::from_io)?,
            )),
        }
    }

    pub(crate) fn try_clone(&self) -> std::io::Result<StreamKind> {
        match self {
            StreamKind::Unix(s) => s.try_clone().map(StreamKind::Unix),
            StreamKind::Tcp(s) => s.try_clone().map(StreamKind::Tcp),
        }
    }
}

impl Read for StreamKind {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            StreamKind::Unix(s) => s.read(buf),
            StreamKind::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for StreamKind {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            StreamKind::Unix(s) => s.write(buf),
            StreamKind::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            StreamKind::Unix(s) => s.flush(),
            StreamKind::Tcp(s) => s.flush(),
        }
    }
}
