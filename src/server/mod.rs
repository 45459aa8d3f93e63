// Server module entry point
// Binding, the accept loop and per-connection serving

pub mod connection;
pub mod listener;
pub mod signal;

pub use listener::create_listener;
pub use signal::shutdown_signal;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::error::ServerError;
use crate::logger;

/// A bound static CORS server
pub struct CorsServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl CorsServer {
    /// Resolve the root directory and bind the listening socket.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        let addr = config
            .get_socket_addr()
            .map_err(ServerError::InvalidAddress)?;
        let state = AppState::new(config)?;
        let listener =
            create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            state: Arc::new(state),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Accept and serve connections until the process is terminated.
    ///
    /// Accept errors are logged and the loop carries on.
    pub async fn serve_forever(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    connection::handle_connection(stream, peer_addr, Arc::clone(&self.state));
                }
                Err(e) => {
                    logger::log_error(&format!("Failed to accept connection: {e}"));
                    // Typically EMFILE; give descriptors a moment to free up
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                }
            }
        }
    }
}
