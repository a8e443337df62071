//! Exposes an in-process test server for use in integration tests.
//!
//! ```
//! use loadsim_test::server::TestServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = TestServer::new().await;
//!     let url = server.url("/health");
//!     // use the URL in tests...
//! }
//! ```

use std::net::{SocketAddr, TcpListener};

use loadsim_server::config::Config;
use loadsim_server::state::{ServiceState, State};
use loadsim_server::web::App;

/// An in-process test server for use in integration tests.
///
/// This server runs the full simulation pipeline with a test-friendly
/// configuration: the embedded load generator is disabled and the simulated
/// failure rate is zero, so responses are deterministic unless a test opts
/// back in. It listens on a random available port on localhost.
#[derive(Debug)]
pub struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    state: ServiceState,
}

impl TestServer {
    /// Starts a server with the [default test configuration](base_config).
    pub async fn new() -> Self {
        Self::with_config(base_config()).await
    }

    /// Starts a server with the given configuration.
    ///
    /// The configured `http_addr` is ignored; the server always binds a
    /// random localhost port.
    pub async fn with_config(config: Config) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let state = State::new(config);
        let app = App::new(state.clone());

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            app.serve(listener).await.unwrap();
        });

        Self {
            handle,
            socket,
            state,
        }
    }

    /// Returns the server's shared state, e.g. to inspect or occupy the
    /// admission pool from within a test.
    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    /// Returns a full URL pointing to the given path.
    ///
    /// This URL uses `localhost` as hostname.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://localhost:{}/{}", self.socket.port(), path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The default test configuration: no embedded load generator, no simulated
/// failures, and a spike window that only ever targets `customer-0`.
pub fn base_config() -> Config {
    let mut config = Config::default();
    config.load_generator.enabled = false;
    config.simulation.failure_probability = 0.0;
    config.simulation.num_customers = 1;
    config
}
