//! Lifecycle orchestration: generate, spawn, wait ready, kill, clean up.
//!
//! [`MockedService`] owns one mocked-service scope. Construction derives
//! the interface description (and fails fast on documentation errors);
//! [`MockedService::start`] materializes the generated files, spawns the
//! mock child and waits for its readiness handshake; the returned
//! [`MockScope`] kills the child and deletes both files on
//! [`MockScope::shutdown`], with a best-effort `Drop` for abnormal exits.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::{MockError, Result};
use crate::generate::{self, MockInfo};
use crate::iface::InterfaceDescription;
use crate::runner::{DESCRIPTOR_ENV, READY_LINE, ServiceFactory};

/// How long the parent waits for the child's readiness handshake before
/// failing fast.
pub const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction-time options for a mocked service.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// Transport address spec the mock binds, e.g. `unix:@test`.
    pub address: String,
    /// Logical interface name; derived from the factory name if absent.
    pub name: Option<String>,
    pub vendor: String,
    pub product: String,
    pub version: i64,
    pub url: String,
}

impl Default for MockOptions {
    fn default() -> Self {
        MockOptions {
            address: "unix:@test".to_string(),
            name: None,
            vendor: "mocklink".to_string(),
            product: "mock".to_string(),
            version: 1,
            url: "http://localhost".to_string(),
        }
    }
}

impl MockOptions {
    pub fn new(address: impl Into<String>) -> Self {
        MockOptions {
            address: address.into(),
            ..MockOptions::default()
        }
    }

    /// Set the logical interface name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// One mocked-service scope: identity, configuration and the derived
/// interface description. Cheap to construct, does no I/O until
/// [`MockedService::start`].
#[derive(Debug)]
pub struct MockedService {
    name: String,
    identifier: String,
    options: MockOptions,
    info: MockInfo,
    description: InterfaceDescription,
}

impl MockedService {
    /// Derive the interface description for `factory`'s service and build
    /// the configuration field set.
    ///
    /// Fails with [`MockError::MissingReturnDoc`] if any listed method
    /// declares a return type without documenting its return fields - no
    /// file or process is created in that case.
    pub fn new(factory: ServiceFactory, options: MockOptions) -> Result<Self> {
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| factory.name.to_lowercase());
        let identifier = Uuid::new_v4().to_string();

        let service = (factory.build)();
        let description = InterfaceDescription::build(&name, service.as_ref())?;

        let interface_file = std::env::temp_dir().join(&name);
        let info = MockInfo::new(
            &options.address,
            &options.vendor,
            &options.product,
            options.version,
            &options.url,
            &name,
            &interface_file,
            factory.name,
        );

        Ok(MockedService {
            name,
            identifier,
            options,
            info,
            description,
        })
    }

    /// The logical interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The opaque unique identifier of this scope.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The derived interface description.
    pub fn description(&self) -> &InterfaceDescription {
        &self.description
    }

    /// The configuration field set written into the descriptor.
    pub fn info(&self) -> &MockInfo {
        &self.info
    }

    /// Where the interface file is written: `<tmp>/<name>`.
    pub fn interface_file_path(&self) -> PathBuf {
        std::env::temp_dir().join(&self.name)
    }

    /// Where the generated descriptor is written: `<tmp>/<identifier>`.
    pub fn program_file_path(&self) -> PathBuf {
        std::env::temp_dir().join(&self.identifier)
    }

    /// Write the generated files, spawn the mock child and wait for its
    /// readiness handshake.
    ///
    /// The child is the current executable re-run with [`DESCRIPTOR_ENV`]
    /// set; the hosting binary must route that through
    /// [`crate::runner::run_if_spawned`] (the adapter does this itself).
    pub fn start(&self) -> Result<MockScope> {
        let program_file = self.program_file_path();
        let interface_file = self.interface_file_path();

        generate::write_program(&self.info, &program_file)?;
        fs::write(&interface_file, self.description.render())
            .map_err(|e| MockError::io("failed to write interface file", &interface_file, e))?;

        let exe = std::env::current_exe().map_err(MockError::Process)?;
        let mut child = Command::new(exe)
            .env(DESCRIPTOR_ENV, &program_file)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(MockError::Process)?;

        tracing::debug!(
            pid = child.id(),
            name = %self.name,
            address = %self.options.address,
            "mock process spawned"
        );

        if let Err(err) = wait_for_ready(&mut child) {
            let _ = child.kill();
            let _ = child.wait();
            let _ = fs::remove_file(&interface_file);
            let _ = fs::remove_file(&program_file);
            return Err(err);
        }

        Ok(MockScope {
            identifier: self.identifier.clone(),
            address: self.options.address.clone(),
            interface_file,
            program_file,
            child: Some(child),
            cleaned: false,
        })
    }
}

/// Block until the child prints its readiness line, with a bounded
/// timeout. A child that exits first is reported with its exit status.
fn wait_for_ready(child: &mut Child) -> Result<()> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| MockError::Process(std::io::Error::other("child stdout not captured")))?;

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let deadline = Instant::now() + READY_TIMEOUT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(line) if line.trim() == READY_LINE => return Ok(()),
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => return Err(MockError::StartupTimeout(READY_TIMEOUT)),
            Err(RecvTimeoutError::Disconnected) => {
                // Stdout closed without the handshake: the child is dead
                // or dying. Make sure, then report its status.
                let _ = child.kill();
                let status = child.wait().map_err(MockError::Process)?;
                return Err(MockError::StartupFailed { status });
            }
        }
    }
}

/// An active mocked-service scope: the child process plus the two
/// generated files, exclusively owned.
pub struct MockScope {
    identifier: String,
    address: String,
    interface_file: PathBuf,
    program_file: PathBuf,
    child: Option<Child>,
    cleaned: bool,
}

impl MockScope {
    /// The address the mock serves on.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn interface_file(&self) -> &Path {
        &self.interface_file
    }

    pub fn program_file(&self) -> &Path {
        &self.program_file
    }

    /// Kill and reap the mock process, then delete the interface file and
    /// the generated descriptor.
    ///
    /// Deletion failures propagate - a failed cleanup is a test failure
    /// even when the body passed. Calling this a second time skips the
    /// (already reaped) child and will normally fail on the deletes; it
    /// never blocks.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            tracing::debug!(pid = child.id(), "stopping mock process");
            child.kill().map_err(MockError::Process)?;
            child.wait().map_err(MockError::Process)?;
        }
        let result = fs::remove_file(&self.interface_file)
            .map_err(|e| MockError::io("failed to delete interface file", &self.interface_file, e))
            .and_then(|()| {
                fs::remove_file(&self.program_file)
                    .map_err(|e| MockError::io("failed to delete mock descriptor", &self.program_file, e))
            });
        if result.is_ok() {
            self.cleaned = true;
        }
        result
    }
}

impl Drop for MockScope {
    /// Abnormal-exit cleanup: kill the child and remove the files,
    /// ignoring failures. The normal path is [`MockScope::shutdown`].
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if !self.cleaned {
            let _ = fs::remove_file(&self.interface_file);
            let _ = fs::remove_file(&self.program_file);
        }
    }
}
