//! Client side: connect to an address, open an interface, call methods.

use std::io::BufReader;
use std::sync::Mutex;

use serde_json::Value;

use crate::codec::{self, Reply, Request};
use crate::stream::StreamKind;
use crate::{Address, Result, WireError};

struct Io {
    reader: BufReader<StreamKind>,
    writer: StreamKind,
}

/// A client connection to a served address.
///
/// One request is in flight at a time; concurrent callers serialize on an
/// internal lock, matching the strictly sequential test bodies this layer
/// exists for.
pub struct Connection {
    address: Address,
    io: Mutex<Io>,
}

impl Connection {
    /// Connect using an address spec string such as `unix:@foo`.
    pub fn connect(spec: &str) -> Result<Connection> {
        Self::connect_address(&Address::parse(spec)?)
    }

    /// Connect to an already parsed address.
    pub fn connect_address(address: &Address) -> Result<Connection> {
        let stream = StreamKind::connect(address)?;
        let writer = stream.try_clone().map_err(WireError::from_io)?;
        Ok(Connection {
            address: address.clone(),
            io: Mutex::new(Io {
                reader: BufReader::new(stream),
                writer,
            }),
        })
    }

    /// The address this connection is attached to.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Open a named interface over this connection.
    pub fn open(&self, interface: &str) -> InterfaceHandle<'_> {
        InterfaceHandle {
            connection: self,
            interface: interface.to_string(),
        }
    }

    fn call_qualified(&self, method: String, parameters: Value) -> Result<Value> {
        let mut io = self.io.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        codec::write_frame(&mut io.writer, &Request { method, parameters })?;
        let reply: Reply = codec::read_frame(&mut io.reader)?.ok_or(WireError::Disconnected)?;
        match reply.error {
            Some(error) => Err(WireError::Call {
                error,
                parameters: reply.parameters,
            }),
            None => Ok(reply.parameters),
        }
    }
}

/// A named interface opened over a [`Connection`].
pub struct InterfaceHandle<'a> {
    connection: &'a Connection,
    interface: String,
}

impl InterfaceHandle<'_> {
    /// The interface name this handle qualifies calls with.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Call `method` with the given parameters and return the reply fields.
    pub fn call(&self, method: &str, parameters: Value) -> Result<Value> {
        self.connection
            .call_qualified(format!("{}.{}", self.interface, method), parameters)
    }
}
