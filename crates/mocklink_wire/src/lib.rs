//! Minimal varlink-style wire layer for mocklink.
//!
//! This crate carries everything the mocking core treats as an external
//! collaborator: address parsing, message framing, the blocking server
//! loop, the service wrapper that binds an interface file to a call
//! handler, and the client used by test bodies.
//!
//! ## Wire format
//!
//! One JSON object per message, terminated by a single NUL byte. Requests
//! carry a fully qualified `method` plus optional `parameters`; replies
//! carry either `parameters` or an `error` name with optional error
//! `parameters`.
//!
//! ## Surface
//!
//! - [`Address`] - `unix:/path`, `unix:@name` (abstract) and `tcp:host:port`
//! - [`Server`] - bind an address, then serve forever, one thread per connection
//! - [`WireService`] + [`CallHandler`] - interface-file-bound dispatch
//! - [`Connection`] - client side; `open` an interface, then `call` methods

pub mod address;
pub mod client;
pub mod codec;
pub mod server;
pub mod service;

mod error;
mod stream;

pub use address::Address;
pub use client::{Connection, InterfaceHandle};
pub use codec::{Reply, Request};
pub use error::{CallError, WireError};
pub use server::Server;
pub use service::{CallHandler, ServiceInfo, WireService};

/// Result alias used throughout the wire layer.
pub type Result<T> = std::result::Result<T, WireError>;
