#![forbid(unsafe_code)]
//! mocklink - spawnable mock services for varlink-style RPC clients.
//!
//! A test hands mocklink a plain Rust object plus an address; mocklink
//! derives a protocol interface description from the object's declared
//! method surface, writes a generated descriptor and interface file,
//! spawns a mock server as a child process bound to that address, and
//! tears everything down deterministically when the test is done - even
//! when the test body fails. The client under test connects exactly as
//! it would to production.
//!
//! ## Pipeline
//!
//! 1. [`iface`] - reflect the service's methods into an
//!    [`InterfaceDescription`]
//! 2. [`generate`] - emit the mock descriptor file
//! 3. [`orchestrator`] - write files, spawn the child, readiness
//!    handshake, kill + cleanup
//! 4. [`runner`] - what the child process executes
//! 5. [`adapter`] - the test-wrapper that drives 1-4 around a body
//!
//! ## Child processes
//!
//! The mock child is the current executable re-run with
//! [`runner::DESCRIPTOR_ENV`] set. A hosting binary (typically a
//! `harness = false` test) must call [`runner::run_if_spawned`] before
//! running scenarios, or use [`adapter::mockedservice`] which performs
//! the check itself.
//!
//! ## Panic policy
//!
//! Production code propagates `Result` with `?`; `.unwrap()` and
//! `.expect()` are acceptable in tests only.
//!
//! ## Example
//!
//! ```no_run
//! use mocklink::{MethodSpec, MockOptions, MockService, ReflectableService, ServiceFactory};
//! use mocklink_wire::{CallError, Connection};
//! use serde_json::{Value, json};
//!
//! struct Service;
//!
//! impl ReflectableService for Service {
//!     fn list_methods(&self) -> Vec<MethodSpec> {
//!         vec![
//!             MethodSpec::new("Test1")
//!                 .param("param1", "int")
//!                 .returns("dict")
//!                 .doc("return test: int"),
//!         ]
//!     }
//! }
//!
//! impl MockService for Service {
//!     fn call(&self, method: &str, parameters: &Value) -> Result<Value, CallError> {
//!         match method {
//!             "Test1" => Ok(json!({"test": parameters["param1"]})),
//!             other => Err(CallError::MethodNotFound(other.to_string())),
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), mocklink::MockError> {
//!     let factory = ServiceFactory::new("Service", || Box::new(Service));
//!     mocklink::mockedservice(
//!         factory,
//!         MockOptions::new("unix:@foo").with_name("org.service.com"),
//!         |scope| {
//!             let connection = Connection::connect(scope.address())?;
//!             let interface = connection.open("org.service.com");
//!             let reply = interface.call("Test1", json!({"param1": 1}))?;
//!             assert_eq!(reply["test"], 1);
//!             Ok(())
//!         },
//!     )
//! }
//! ```

pub mod adapter;
pub mod error;
pub mod generate;
pub mod iface;
pub mod orchestrator;
pub mod runner;

pub use adapter::mockedservice;
pub use error::{MockError, Result};
pub use generate::{FieldKind, FieldValue, MockInfo};
pub use iface::{InterfaceDescription, MethodSpec, MockService, ParamSpec, ReflectableService, cast_type};
pub use orchestrator::{MockOptions, MockScope, MockedService};
pub use runner::{FactoryRegistry, MockRunner, RunnerConfig, ServiceFactory, run_if_spawned};
