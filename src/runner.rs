//! The mock process runner: child-side execution of a generated
//! descriptor.
//!
//! The orchestrator re-executes the current binary with
//! [`DESCRIPTOR_ENV`] pointing at a descriptor file. On the child side,
//! [`run_if_spawned`] detects that, resolves the named service factory
//! from a [`FactoryRegistry`], prints the [`READY_LINE`] handshake once
//! the address is bound, and serves forever. Termination is always
//! external - the parent kills the process.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use mocklink_wire::{Address, CallError, CallHandler, Server, ServiceInfo, WireService};

use crate::error::{MockError, Result};
use crate::iface::MockService;

/// Environment variable carrying the descriptor path into the child.
pub const DESCRIPTOR_ENV: &str = "MOCKLINK_DESCRIPTOR";

/// Handshake line the child prints on stdout once its address is bound.
pub const READY_LINE: &str = "MOCKLINK-READY";

/// A named, serializable way to construct a mock service.
///
/// The name is what the descriptor's `service_to_mock` field records;
/// the child resolves it back to `build` through a registry.
#[derive(Clone, Copy)]
pub struct ServiceFactory {
    pub name: &'static str,
    pub build: fn() -> Box<dyn MockService>,
}

impl ServiceFactory {
    pub fn new(name: &'static str, build: fn() -> Box<dyn MockService>) -> Self {
        ServiceFactory { name, build }
    }
}

impl std::fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFactory").field("name", &self.name).finish()
    }
}

/// Resolves factory identifiers in the child process.
#[derive(Debug, Default)]
pub struct FactoryRegistry {
    factories: Vec<ServiceFactory>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        FactoryRegistry::default()
    }

    /// Register a factory; later registrations with the same name win.
    pub fn with(mut self, factory: ServiceFactory) -> Self {
        self.register(factory);
        self
    }

    pub fn register(&mut self, factory: ServiceFactory) {
        self.factories.retain(|f| f.name != factory.name);
        self.factories.push(factory);
    }

    /// Resolve a factory identifier.
    pub fn resolve(&self, name: &str) -> Option<&ServiceFactory> {
        self.factories.iter().find(|f| f.name == name)
    }
}

/// The `[mock]` table of a generated descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub address: String,
    pub vendor: String,
    pub product: String,
    pub version: i64,
    pub url: String,
    pub interface_name: String,
    pub interface_file: PathBuf,
    pub service_to_mock: String,
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    mock: RunnerConfig,
}

impl RunnerConfig {
    /// Load a descriptor file.
    pub fn load(path: &Path) -> Result<RunnerConfig> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MockError::io("failed to read mock descriptor", path, e))?;
        let descriptor: DescriptorFile = toml::from_str(&text).map_err(|e| MockError::Descriptor {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(descriptor.mock)
    }
}

/// Adapts a [`MockService`] into the wire layer's call-handler seam.
struct MockCallHandler {
    service: Box<dyn MockService>,
}

impl CallHandler for MockCallHandler {
    fn call(&self, method: &str, parameters: &Value) -> std::result::Result<Value, CallError> {
        self.service.call(method, parameters)
    }
}

/// Runs one mocked service in the child process.
///
/// Two states: idle (constructed) and serving (after [`MockRunner::run`]),
/// with no transition back - a serving runner is stopped by killing the
/// process.
pub struct MockRunner {
    config: RunnerConfig,
    service: Box<dyn MockService>,
}

impl MockRunner {
    pub fn new(config: RunnerConfig, service: Box<dyn MockService>) -> Self {
        MockRunner { config, service }
    }

    /// Build the wire service, bind the interface file, bind the address,
    /// signal readiness and serve until killed.
    ///
    /// Never returns `Ok`; every return is a startup or serve failure.
    pub fn run(self) -> Result<()> {
        let mut wire_service = WireService::new(ServiceInfo {
            vendor: self.config.vendor.clone(),
            product: self.config.product.clone(),
            version: self.config.version,
            url: self.config.url.clone(),
        });
        wire_service.set_interface(
            &self.config.interface_file,
            Box::new(MockCallHandler { service: self.service }),
        )?;

        let address = Address::parse(&self.config.address)?;
        let server = Server::bind(&address)?;

        tracing::info!(
            interface = %self.config.interface_name,
            address = %address,
            "mock service bound, serving"
        );

        // Readiness handshake: the parent waits for this exact line.
        let mut stdout = std::io::stdout();
        writeln!(stdout, "{READY_LINE}")
            .and_then(|()| stdout.flush())
            .map_err(MockError::Process)?;

        server.serve_forever(Arc::new(wire_service))?;
        Ok(())
    }
}

/// The descriptor path from the environment, if this process was spawned
/// as a mock child.
pub fn spawned_descriptor() -> Option<PathBuf> {
    std::env::var_os(DESCRIPTOR_ENV).map(PathBuf::from)
}

/// Child-side entry point.
///
/// If this process was spawned as a mock child, resolve the descriptor's
/// factory from `registry` and serve until killed; otherwise return
/// `Ok(false)` so the caller proceeds as the parent. Call this before any
/// test scenario runs.
pub fn run_if_spawned(registry: &FactoryRegistry) -> Result<bool> {
    let Some(path) = spawned_descriptor() else {
        return Ok(false);
    };
    let config = RunnerConfig::load(&path)?;
    let factory = registry
        .resolve(&config.service_to_mock)
        .ok_or_else(|| MockError::UnknownFactory(config.service_to_mock.clone()))?;
    let service = (factory.build)();
    MockRunner::new(config, service).run()?;
    Ok(true)
}
