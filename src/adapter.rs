//! Test-body wrapper around the orchestrated lifecycle.
//!
//! [`mockedservice`] is the moral equivalent of a test decorator: it
//! starts the mocked service, runs the body, and always tears down -
//! including when the body fails. Exactly one error kind from the body is
//! swallowed: the expected disconnection caused by the mock process being
//! killed while a call is outstanding. Everything else propagates after
//! teardown has run.

use crate::error::Result;
use crate::orchestrator::{MockOptions, MockScope, MockedService};
use crate::runner::{MockRunner, RunnerConfig, ServiceFactory, spawned_descriptor};

/// Run `body` against a freshly mocked service.
///
/// In a process that was itself spawned as a mock child, this serves the
/// matching factory (and returns without running the body for any other
/// factory), which makes nesting decorated scenarios in one
/// `harness = false` binary safe.
///
/// The body's return value is discarded; it only carries errors.
pub fn mockedservice<F>(factory: ServiceFactory, options: MockOptions, body: F) -> Result<()>
where
    F: FnOnce(&mut MockScope) -> Result<()>,
{
    // Child side: serve instead of testing.
    if let Some(path) = spawned_descriptor() {
        let config = RunnerConfig::load(&path)?;
        if config.service_to_mock == factory.name {
            MockRunner::new(config, (factory.build)()).run()?;
        }
        return Ok(());
    }

    let mock = MockedService::new(factory, options)?;
    let mut scope = mock.start()?;

    let body_result = body(&mut scope);
    let teardown_result = scope.shutdown();

    match body_result {
        // The mock process going away mid-call is part of normal teardown.
        Err(err) if err.is_expected_disconnect() => {
            tracing::debug!("suppressed expected disconnection from test body");
        }
        Err(err) => return Err(err),
        Ok(()) => {}
    }
    teardown_result
}
