//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging with a level filter
//! - File-based logging support
//!
//! Standard output is never written here; it carries only the startup banner.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{Config, LogLevel, LoggingConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    LEVEL.store(config.level as u8, Ordering::Relaxed);
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

fn enabled(level: LogLevel) -> bool {
    level as u8 <= LEVEL.load(Ordering::Relaxed)
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, root: &Path, config: &Config) {
    if !enabled(LogLevel::Info) {
        return;
    }
    write_error(&format!("[INFO] Serving {} on http://{addr}", root.display()));
    if let Some(workers) = config.server.workers {
        write_error(&format!("[INFO] Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_error(&format!("[INFO] Access log: {path}"));
    }
}

pub fn log_shutdown() {
    log_info("Shutdown signal received, exiting.");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

/// Client resets, timeouts and malformed requests
pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    log_warning(&format!("Connection from {peer_addr} failed: {err}"));
}

/// Log an error response sent to a client
pub fn log_error_response(peer_addr: &SocketAddr, status: u16, message: &str) {
    log_info(&format!("{} code {status}, message {message}", peer_addr.ip()));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(LogLevel::Info) {
        write_error(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_error(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
