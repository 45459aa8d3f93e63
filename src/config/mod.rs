// Configuration module entry point
// Builds the process-lifetime configuration and the shared serving state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, HttpConfig, LogLevel, LoggingConfig, PerformanceConfig, ServerConfig};

/// Port used when neither the command line nor the environment names one
pub const DEFAULT_PORT: u16 = 9999;

/// Prefix of environment variables, e.g. `CORS_SERVER__ROOT`
pub const ENV_PREFIX: &str = "CORS";

impl Config {
    /// Load configuration from defaults and `CORS_*` environment variables.
    ///
    /// A port given on the command line wins over everything else.
    pub fn load(port: Option<u16>) -> Result<Self, config::ConfigError> {
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        Self::build(port, Some(environment))
    }

    /// Configuration made of defaults only, ignoring the environment
    pub fn defaults() -> Result<Self, config::ConfigError> {
        Self::build(None, None)
    }

    fn build(
        port: Option<u16>,
        environment: Option<config::Environment>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.root", ".")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default(
                "http.server_name",
                format!("cors-server/{}", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?;

        if let Some(environment) = environment {
            builder = builder.add_source(environment);
        }
        if let Some(port) = port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        builder.build()?.try_deserialize()
    }

    /// Listen address; an empty host binds every IPv4 interface
    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        let host = match self.server.host.trim() {
            "" => "0.0.0.0",
            host => host,
        };
        let addr = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.server.port)
        } else {
            format!("{host}:{}", self.server.port)
        };
        addr.parse().map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::defaults().unwrap();
        assert_eq!(cfg.server.port, 9999);
        assert_eq!(cfg.server.host, "");
        assert_eq!(cfg.server.root, std::path::PathBuf::from("."));
        assert_eq!(cfg.server.workers, None);
        assert_eq!(cfg.logging.level, LogLevel::Info);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "common");
        assert!(cfg.http.server_name.starts_with("cors-server/"));
        assert!(cfg.performance.keep_alive);
    }

    #[test]
    fn test_port_override() {
        let cfg = Config::build(Some(8123), None).unwrap();
        assert_eq!(cfg.server.port, 8123);
    }

    #[test]
    fn test_empty_host_binds_all_interfaces() {
        let cfg = Config::defaults().unwrap();
        let addr = cfg.get_socket_addr().unwrap();
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 9999);
    }

    #[test]
    fn test_explicit_hosts() {
        let mut cfg = Config::defaults().unwrap();
        cfg.server.host = "127.0.0.1".to_string();
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.1:9999");

        cfg.server.host = "::1".to_string();
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "[::1]:9999");

        cfg.server.host = "not an address".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
