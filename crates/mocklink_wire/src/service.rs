//! The service wrapper: identity, interface binding, and call dispatch.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use crate::codec::Reply;
use crate::{CallError, Result, WireError};

/// Service identity advertised by a served endpoint.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub vendor: String,
    pub product: String,
    pub version: i64,
    pub url: String,
}

/// Handles calls on a bound interface.
///
/// This is the seam the mocking core plugs into: the server never sees the
/// concrete mock object, only this trait. Handlers receive the bare member
/// name (interface prefix already stripped) and the call parameters.
pub trait CallHandler: Send + Sync {
    fn call(&self, method: &str, parameters: &Value) -> std::result::Result<Value, CallError>;
}

/// A service: identity plus at most one bound interface.
pub struct WireService {
    info: ServiceInfo,
    interface_name: Option<String>,
    description: Option<String>,
    handler: Option<Box<dyn CallHandler>>,
}

impl WireService {
    pub fn new(info: ServiceInfo) -> Self {
        WireService {
            info,
            interface_name: None,
            description: None,
            handler: None,
        }
    }

    pub fn info(&self) -> &ServiceInfo {
        &self.info
    }

    /// Bind an interface-description file and a handler to this service.
    ///
    /// The interface name is taken from the `interface <name>` header line
    /// of the file; a file without that header is malformed.
    pub fn set_interface(&mut self, description_file: &Path, handler: Box<dyn CallHandler>) -> Result<()> {
        let description = fs::read_to_string(description_file)?;
        let name = description
            .lines()
            .find_map(|line| line.trim().strip_prefix("interface "))
            .map(|name| name.trim().to_string())
            .ok_or_else(|| {
                WireError::Protocol(format!(
                    "interface file {} has no `interface` header line",
                    description_file.display()
                ))
            })?;

        self.interface_name = Some(name);
        self.description = Some(description);
        self.handler = Some(handler);
        Ok(())
    }

    /// Name of the bound interface, if any.
    pub fn interface_name(&self) -> Option<&str> {
        self.interface_name.as_deref()
    }

    /// The raw interface description text, if bound.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Dispatch one fully qualified call and produce the reply to send.
    ///
    /// Dispatch never fails at the transport level: every problem becomes
    /// an error reply so the connection stays usable.
    pub fn dispatch(&self, method: &str, parameters: &Value) -> Reply {
        let Some((interface, member)) = method.rsplit_once('.') else {
            return Reply::error(
                "org.varlink.service.InvalidParameter",
                json!({"parameter": "method"}),
            );
        };

        let bound = self.interface_name.as_deref();
        if bound != Some(interface) {
            return Reply::error(
                "org.varlink.service.InterfaceNotFound",
                json!({"interface": interface}),
            );
        }

        // Bound name implies a bound handler.
        let Some(handler) = self.handler.as_ref() else {
            return Reply::error(
                "org.varlink.service.InterfaceNotFound",
                json!({"interface": interface}),
            );
        };

        match handler.call(member, parameters) {
            Ok(value) => Reply::ok(value),
            Err(err) => Reply::error(err.wire_name(), json!({"detail": err.detail()})),
        }
    }
}
