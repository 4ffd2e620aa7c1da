//! Configuration for the ADB client.

use crate::errors::AdbClientError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default ADB host server port.
pub const DEFAULT_SERVER_PORT: u16 = 5037;

/// ADB client configuration.
///
/// By default the executable is assumed to be on the `PATH`; supply an
/// absolute path if it is not. Each [`AndroidDebugBridge`](crate::AndroidDebugBridge)
/// instance takes its own configuration at construction.
///
/// # Examples
///
/// ```
/// use adb_client::AdbConfig;
///
/// let config = AdbConfig::builder()
///     .executable("/opt/android-sdk/platform-tools/adb")
///     .port(5037)
///     .build()
///     .unwrap();
/// assert_eq!(config.host, "127.0.0.1");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdbConfig {
    /// Path to the adb executable, used to start the server on demand.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    /// Server hostname or IP address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_executable() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("adb.exe")
    } else {
        PathBuf::from("adb")
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_SERVER_PORT
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AdbConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> AdbConfigBuilder {
        AdbConfigBuilder::default()
    }

    /// Loads a configuration from a TOML file.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AdbClientError::Config`] if the file cannot be read or
    /// parsed, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AdbClientError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AdbClientError::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
        })?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| AdbClientError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdbClientError::Config`] if any value is invalid.
    pub fn validate(&self) -> Result<(), AdbClientError> {
        if self.executable.as_os_str().is_empty() {
            return Err(AdbClientError::Config(
                "executable path cannot be empty".to_string(),
            ));
        }
        if self.host.is_empty() {
            return Err(AdbClientError::Config("host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(AdbClientError::Config("port cannot be 0".to_string()));
        }
        Ok(())
    }
}

/// Builder for creating an [`AdbConfig`].
#[derive(Default)]
pub struct AdbConfigBuilder {
    config: AdbConfig,
}

impl AdbConfigBuilder {
    /// Sets the adb executable path.
    #[must_use]
    pub fn executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.config.executable = executable.into();
        self
    }

    /// Sets the server hostname or IP address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<AdbConfig, AdbClientError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AdbConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_SERVER_PORT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = AdbConfig::builder()
            .executable("/usr/bin/adb")
            .host("localhost")
            .port(5038)
            .build()
            .unwrap();
        assert_eq!(config.executable, PathBuf::from("/usr/bin/adb"));
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5038);
    }

    #[test]
    fn test_zero_port_rejected() {
        assert!(AdbConfig::builder().port(0).build().is_err());
    }

    #[test]
    fn test_empty_host_rejected() {
        assert!(AdbConfig::builder().host("").build().is_err());
    }

    #[test]
    fn test_toml_with_defaults() {
        let config: AdbConfig = toml::from_str("port = 5038\n").unwrap();
        assert_eq!(config.port, 5038);
        assert_eq!(config.host, "127.0.0.1");
    }
}
