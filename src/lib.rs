//! Static file server for local development.
//!
//! Serves a directory over HTTP/1.x and stamps every response with
//! permissive CORS headers and cache-disabling directives, so browsers can
//! fetch local files cross-origin and never see stale copies.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{AppState, Config};
pub use error::ServerError;
pub use server::CorsServer;
