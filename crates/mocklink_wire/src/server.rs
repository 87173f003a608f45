//! Blocking server loop: accept connections, one handler thread each.

use std::io::BufReader;
use std::net::TcpListener;
use std::os::unix::net::UnixListener;
use std::sync::Arc;
use std::thread;

use crate::codec::{self, Reply, Request};
use crate::stream::StreamKind;
use crate::{Address, Result, WireService};

enum ListenerKind {
    Unix(UnixListener),
    Tcp(TcpListener),
}

/// A bound, not-yet-serving server.
///
/// `bind` and `serve_forever` are split so a caller can signal readiness
/// between the two (the mock child prints its handshake line once the
/// address is actually bound).
pub struct Server {
    listener: ListenerKind,
    address: Address,
}

impl Server {
    /// Bind the given address.
    ///
    /// For `unix:` path addresses a stale socket file from a previous run
    /// is removed first.
    pub fn bind(address: &Address) -> Result<Server> {
        let listener = match address {
            Address::UnixPath(path) => {
                if path.exists() {
                    std::fs::remove_file(path)?;
                }
                ListenerKind::Unix(UnixListener::bind(path)?)
            }
            Address::UnixAbstract(name) => {
                use std::os::linux::net::SocketAddrExt;
                let addr = std::os::unix::net::SocketAddr::from_abstract_name(name.as_bytes())?;
                ListenerKind::Unix(UnixListener::bind_addr(&addr)?)
            }
            Address::Tcp(hostport) => ListenerKind::Tcp(TcpListener::bind(hostport.as_str())?),
        };
        tracing::debug!(address = %address, "wire server bound");
        Ok(Server {
            listener,
            address: address.clone(),
        })
    }

    /// The address this server is bound to.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Accept and serve connections until the process is killed.
    ///
    /// Never returns `Ok`; the only way out is an accept failure or
    /// external termination.
    pub fn serve_forever(&self, service: Arc<WireService>) -> Result<()> {
        loop {
            let stream = match &self.listener {
                ListenerKind::Unix(listener) => StreamKind::Unix(listener.accept()?.0),
                ListenerKind::Tcp(listener) => StreamKind::Tcp(listener.accept()?.0),
            };
            tracing::debug!(address = %self.address, "connection accepted");
            let service = Arc::clone(&service);
            thread::spawn(move || {
                if let Err(err) = handle_connection(stream, &service) {
                    tracing::debug!(error = %err, "connection ended");
                }
            });
        }
    }
}

/// Request/reply loop for one connection; returns on peer hangup.
fn handle_connection(stream: StreamKind, service: &WireService) -> Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    while let Some(request) = codec::read_frame::<Request, _>(&mut reader)? {
        let reply: Reply = service.dispatch(&request.method, &request.parameters);
        codec::write_frame(&mut writer, &reply)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{CallHandler, ServiceInfo};
    use crate::{CallError, Connection};
    use serde_json::{Value, json};
    use std::io::Write as _;

    struct Doubler;

    impl CallHandler for Doubler {
        fn call(&self, method: &str, parameters: &Value) -> std::result::Result<Value, CallError> {
            match method {
                "Double" => {
                    let n = parameters["n"]
                        .as_i64()
                        .ok_or_else(|| CallError::InvalidParameter("n".to_string()))?;
                    Ok(json!({"n": n * 2}))
                }
                other => Err(CallError::MethodNotFound(other.to_string())),
            }
        }
    }

    fn serve(address: &Address) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "interface org.example.double").unwrap();
        writeln!(file, "method Double(n: int) -> (n: int)").unwrap();

        let mut service = WireService::new(ServiceInfo {
            vendor: "mocklink".to_string(),
            product: "mock".to_string(),
            version: 1,
            url: "http://localhost".to_string(),
        });
        service.set_interface(file.path(), Box::new(Doubler)).unwrap();

        let server = Server::bind(address).unwrap();
        let service = Arc::new(service);
        // The serving thread outlives the test; process exit reaps it.
        thread::spawn(move || {
            let _ = server.serve_forever(service);
        });
    }

    #[test]
    fn serves_calls_over_a_unix_path_socket() {
        let dir = tempfile::tempdir().unwrap();
        let address = Address::UnixPath(dir.path().join("double.sock"));
        serve(&address);

        let connection = Connection::connect_address(&address).unwrap();
        let interface = connection.open("org.example.double");
        let reply = interface.call("Double", json!({"n": 21})).unwrap();
        assert_eq!(reply["n"], 42);
    }

    #[test]
    fn serves_calls_over_an_abstract_socket() {
        let address = Address::UnixAbstract(format!("mocklink-wire-test-{}", std::process::id()));
        serve(&address);

        let connection = Connection::connect_address(&address).unwrap();
        let interface = connection.open("org.example.double");
        let reply = interface.call("Double", json!({"n": 4})).unwrap();
        assert_eq!(reply["n"], 8);

        let err = interface.call("Nope", Value::Null).unwrap_err();
        match err {
            crate::WireError::Call { error, .. } => {
                assert_eq!(error, "org.varlink.service.MethodNotFound");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
