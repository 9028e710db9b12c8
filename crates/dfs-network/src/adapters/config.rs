//! TOML configuration loading

use std::fs;
use std::path::Path;

use crate::domain::{NetworkConfig, NetworkError, NetworkResult};

impl NetworkConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Config`] if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> NetworkResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| NetworkError::config(path.display().to_string(), e))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// Missing sections and keys take their defaults.
    pub fn parse(content: &str) -> NetworkResult<Self> {
        toml::from_str(content).map_err(|e| NetworkError::config("libp2p", e))
    }
}
