//! Error taxonomy for the mocking core.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use mocklink_wire::WireError;

/// Errors produced while generating, running or tearing down a mocked
/// service.
#[derive(Debug, Error)]
pub enum MockError {
    /// A listed method declares a return type but documents no return
    /// fields. The documentation string is the only source of return
    /// field names, so interface generation cannot continue.
    ///
    /// Raised during [`crate::MockedService::new`], before any file or
    /// process exists.
    #[error(
        "method `{method}` declares a return type but documents no return fields \
         (expected documentation of the form `return name: type`)"
    )]
    MissingReturnDoc { method: String },

    /// Filesystem failure on a generated artifact. Not recovered
    /// anywhere: a failed delete during teardown surfaces even when the
    /// test body passed.
    #[error("{context} ({path}): {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The spawned mock process did not signal readiness in time.
    #[error("mock process did not become ready within {0:?}")]
    StartupTimeout(Duration),

    /// The spawned mock process exited before signalling readiness.
    #[error("mock process exited during startup ({status})")]
    StartupFailed { status: ExitStatus },

    /// A mock descriptor could not be read or parsed in the child.
    #[error("invalid mock descriptor {path}: {message}")]
    Descriptor { path: PathBuf, message: String },

    /// The descriptor names a service factory the child does not know.
    #[error("unknown mock service factory `{0}`")]
    UnknownFactory(String),

    /// Spawning or reaping the child process failed.
    #[error("mock process control failed: {0}")]
    Process(#[source] io::Error),

    /// A transport-layer failure from the wire collaborator.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl MockError {
    /// Attach filesystem context to an I/O error.
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        MockError::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Whether this is the expected-disconnection error a dying mock
    /// process causes mid-call. Only the adapter suppresses it, and only
    /// this exact kind.
    pub fn is_expected_disconnect(&self) -> bool {
        matches!(self, MockError::Wire(err) if err.is_disconnected())
    }
}

/// Result alias used throughout the mocking core.
pub type Result<T> = std::result::Result<T, MockError>;
