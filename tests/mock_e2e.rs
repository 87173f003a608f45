//! End-to-end round trip against a spawned mock process.
//!
//! This suite runs with `harness = false` because the same binary is
//! re-executed as the mock child: `main` routes child invocations through
//! `run_if_spawned` before any scenario runs.

use mocklink::iface::{MethodSpec, MockService, ReflectableService};
use mocklink::runner::run_if_spawned;
use mocklink::{
    FactoryRegistry, MockError, MockOptions, MockedService, ServiceFactory, mockedservice,
};
use mocklink_wire::{CallError, Connection, WireError};
use serde_json::{Value, json};

// =============================================================================
// Mock services under test
// =============================================================================

/// Echoes `param1` back under the `test` field.
struct EchoService;

impl ReflectableService for EchoService {
    fn list_methods(&self) -> Vec<MethodSpec> {
        vec![
            MethodSpec::new("Test1")
                .param("param1", "int")
                .returns("dict")
                .doc("return test: int"),
            MethodSpec::new("Test2")
                .param("param1", "str")
                .returns("dict")
                .doc("return test: string"),
        ]
    }
}

impl MockService for EchoService {
    fn call(&self, method: &str, parameters: &Value) -> Result<Value, CallError> {
        match method {
            "Test1" | "Test2" => Ok(json!({"test": parameters["param1"]})),
            other => Err(CallError::MethodNotFound(other.to_string())),
        }
    }
}

fn echo_factory() -> ServiceFactory {
    ServiceFactory::new("EchoService", || Box::new(EchoService))
}

/// Declares a return type but no return documentation; must fail
/// interface generation.
struct UndocumentedService;

impl ReflectableService for UndocumentedService {
    fn list_methods(&self) -> Vec<MethodSpec> {
        vec![MethodSpec::new("Test1").param("param1", "int").returns("dict")]
    }
}

impl MockService for UndocumentedService {
    fn call(&self, _method: &str, _parameters: &Value) -> Result<Value, CallError> {
        Ok(json!({}))
    }
}

// =============================================================================
// Harness
// =============================================================================

fn address_for(scenario: &str) -> String {
    format!("unix:@mocklink-e2e-{}-{}", std::process::id(), scenario)
}

fn main() {
    // Stderr only: the child's stdout carries the readiness handshake.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Child invocations serve a mock and never reach the scenarios.
    let registry = FactoryRegistry::new().with(echo_factory());
    if run_if_spawned(&registry).unwrap() {
        return;
    }

    echo_round_trip();
    kill_mid_call_surfaces_as_disconnection();
    adapter_suppresses_expected_disconnection();
    teardown_is_idempotent_without_hanging();
    missing_doc_creates_no_artifacts();

    eprintln!("mock_e2e: all scenarios passed");
}

// =============================================================================
// Scenarios
// =============================================================================

/// A spawned mock echoes `{"test": <param1>}` for both int and string
/// inputs, and both generated files exist exactly for the scope's
/// lifetime.
fn echo_round_trip() {
    let mock = MockedService::new(
        echo_factory(),
        MockOptions::new(address_for("echo")).with_name("org.service.com"),
    )
    .unwrap();
    let mut scope = mock.start().unwrap();

    assert!(scope.interface_file().exists(), "interface file missing while serving");
    assert!(scope.program_file().exists(), "descriptor missing while serving");

    let connection = Connection::connect(scope.address()).unwrap();
    let interface = connection.open("org.service.com");

    let reply = interface.call("Test1", json!({"param1": 1})).unwrap();
    assert_eq!(reply["test"], 1);

    let reply = interface.call("Test2", json!({"param1": "foo"})).unwrap();
    assert_eq!(reply["test"], "foo");

    let err = interface.call("Missing", json!({})).unwrap_err();
    match err {
        WireError::Call { error, .. } => assert_eq!(error, "org.varlink.service.MethodNotFound"),
        other => panic!("unexpected error: {other}"),
    }

    let interface_file = scope.interface_file().to_path_buf();
    let program_file = scope.program_file().to_path_buf();
    scope.shutdown().unwrap();
    assert!(!interface_file.exists(), "interface file survived teardown");
    assert!(!program_file.exists(), "descriptor survived teardown");

    eprintln!("scenario echo_round_trip: ok");
}

/// Killing the mock process invalidates an open connection with the
/// expected-disconnection error kind.
fn kill_mid_call_surfaces_as_disconnection() {
    let mock = MockedService::new(
        echo_factory(),
        MockOptions::new(address_for("kill")).with_name("org.mocklink.kill"),
    )
    .unwrap();
    let mut scope = mock.start().unwrap();

    let connection = Connection::connect(scope.address()).unwrap();
    let interface = connection.open("org.mocklink.kill");
    interface.call("Test1", json!({"param1": 7})).unwrap();

    // Teardown kills the child; the established connection is now dead.
    scope.shutdown().unwrap();

    let err = interface.call("Test1", json!({"param1": 8})).unwrap_err();
    assert!(err.is_disconnected(), "expected a disconnection, got: {err}");

    eprintln!("scenario kill_mid_call: ok");
}

/// The adapter swallows exactly the expected-disconnection kind from the
/// body and still removes the generated files.
fn adapter_suppresses_expected_disconnection() {
    let interface_file = std::env::temp_dir().join("org.mocklink.adapter");

    let result = mockedservice(
        echo_factory(),
        MockOptions::new(address_for("adapter")).with_name("org.mocklink.adapter"),
        |scope| {
            let connection = Connection::connect(scope.address())?;
            let interface = connection.open("org.mocklink.adapter");
            let reply = interface.call("Test1", json!({"param1": 5}))?;
            assert_eq!(reply["test"], 5);
            // What a mid-call process kill surfaces as.
            Err(MockError::Wire(WireError::Disconnected))
        },
    );
    assert!(result.is_ok(), "disconnection should be suppressed: {result:?}");
    assert!(!interface_file.exists(), "interface file survived adapter teardown");

    // Any other body error propagates, after teardown has run.
    let result = mockedservice(
        echo_factory(),
        MockOptions::new(address_for("adapter2")).with_name("org.mocklink.adapter2"),
        |_scope| Err(MockError::UnknownFactory("deliberate".to_string())),
    );
    assert!(matches!(result, Err(MockError::UnknownFactory(_))));
    assert!(!std::env::temp_dir().join("org.mocklink.adapter2").exists());

    eprintln!("scenario adapter_suppression: ok");
}

/// A second shutdown may fail on the already-deleted files but returns
/// promptly instead of blocking on the reaped process.
fn teardown_is_idempotent_without_hanging() {
    let mock = MockedService::new(
        echo_factory(),
        MockOptions::new(address_for("teardown")).with_name("org.mocklink.teardown"),
    )
    .unwrap();
    let mut scope = mock.start().unwrap();

    scope.shutdown().unwrap();
    match scope.shutdown() {
        Err(MockError::Io { .. }) => {}
        other => panic!("second shutdown should fail on deletion, got: {other:?}"),
    }

    eprintln!("scenario teardown_idempotence: ok");
}

/// Interface generation failure happens before any file or process is
/// created.
fn missing_doc_creates_no_artifacts() {
    let factory = ServiceFactory::new("UndocumentedService", || Box::new(UndocumentedService));
    let err = MockedService::new(
        factory,
        MockOptions::new(address_for("nodoc")).with_name("org.mocklink.nodoc"),
    )
    .unwrap_err();
    assert!(matches!(err, MockError::MissingReturnDoc { method } if method == "Test1"));
    assert!(!std::env::temp_dir().join("org.mocklink.nodoc").exists());

    eprintln!("scenario missing_doc: ok");
}
