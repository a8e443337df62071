use std::net::SocketAddr;

use anyhow::Result;
use tokio::net::{TcpListener, TcpSocket};

use crate::config::Config;
use crate::state::ServiceState;
use crate::web::app::App;

/// The maximum backlog for TCP listen sockets before refusing connections.
const TCP_LISTEN_BACKLOG: u32 = 1024;

/// Runs the loadsim HTTP server on an already-bound listener.
///
/// This serves the application until graceful shutdown is triggered. The
/// listener comes from [`listen()`], called during startup so that a bind
/// failure aborts the process instead of dying inside a background task.
pub async fn server(state: ServiceState, listener: TcpListener) -> Result<()> {
    App::new(state).graceful_shutdown(true).serve(listener).await
}

/// Binds the TCP listener on the configured address.
pub fn listen(config: &Config) -> Result<TcpListener> {
    let addr = config.http_addr;
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }?;

    #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
    socket.set_reuseport(true)?;
    socket.bind(addr)?;

    let listener = socket.listen(TCP_LISTEN_BACKLOG)?;
    tracing::info!("HTTP server listening on {addr}");

    Ok(listener)
}
