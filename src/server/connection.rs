// Connection handling module
// Serves one accepted TCP connection in its own task

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppState;
use crate::handler;
use crate::http::CorsHeaders;
use crate::logger;

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1 connection settings (keep-alive, header timeout)
/// 3. Serves the connection with the request handler wrapped in the
///    CORS header layer
/// 4. Logs connection-level failures without affecting other connections
pub fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) {
    logger::log_connection_accepted(&peer_addr);

    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive);
        if performance.header_read_timeout > 0 {
            builder
                .timer(TokioTimer::new())
                .header_read_timeout(Duration::from_secs(performance.header_read_timeout));
        }

        let handler_state = Arc::clone(&state);
        let service = CorsHeaders::new(service_fn(move |req: Request<Incoming>| {
            let state = Arc::clone(&handler_state);
            async move { handler::handle_request(req, state, peer_addr).await }
        }));

        if let Err(err) = builder.serve_connection(io, service).await {
            logger::log_connection_error(&peer_addr, &err);
        }
    });
}
