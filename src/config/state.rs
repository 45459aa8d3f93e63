// Application state module
// Immutable serving state shared by every connection

use std::path::PathBuf;

use super::types::Config;
use crate::error::ServerError;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    /// Canonical root directory, resolved once at startup
    pub root: PathBuf,
}

impl AppState {
    /// Resolve the root directory and freeze the configuration
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let root = config
            .server
            .root
            .canonicalize()
            .map_err(|source| ServerError::Root {
                path: config.server.root.clone(),
                source,
            })?;

        if !root.is_dir() {
            return Err(ServerError::Root {
                path: config.server.root.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        Ok(Self { config, root })
    }
}
