//! Server configuration.
//!
//! Values resolve in layers: built-in defaults, then an optional TOML file,
//! then `RELAY_BIND` / `RELAY_PORT` from the environment. The binary applies
//! command-line flags last.
//!
//! ```toml
//! # ~/.config/chat-relay/relayd.toml
//! bind_address = "0.0.0.0"
//! port = 9001
//! queue_capacity = 100
//! ```

use std::env;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use relay_core::DEFAULT_PORT;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the bind address.
pub const ENV_BIND: &str = "RELAY_BIND";

/// Environment variable overriding the listen port.
pub const ENV_PORT: &str = "RELAY_PORT";

/// Default capacity of the ingress → broadcast queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Relay server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// Address the UDP socket binds to.
    pub bind_address: IpAddr,

    /// UDP port to listen on.
    pub port: u16,

    /// Messages that may wait for the broadcast engine before ingestion
    /// blocks.
    pub queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Socket address to bind.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Reads a TOML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads the full configuration.
    ///
    /// Uses `path` when given, otherwise the default config file if it
    /// exists, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(p) => {
                    debug!(path = %p.display(), "Using default config file");
                    Self::from_file(&p)?
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(env::var(ENV_BIND).ok(), env::var(ENV_PORT).ok())?;
        Ok(config)
    }

    /// Applies bind/port overrides given as raw strings, as read from the
    /// environment.
    pub fn apply_overrides(
        &mut self,
        bind: Option<String>,
        port: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = bind {
            self.bind_address = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_BIND,
                value: value.clone(),
            })?;
        }

        if let Some(value) = port {
            self.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_PORT,
                value: value.clone(),
            })?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }
        Ok(())
    }
}

/// `<config_dir>/chat-relay/relayd.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chat-relay").join("relayd.toml"))
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("queue_capacity must be at least 1")]
    InvalidQueueCapacity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 9001);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:9001");
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 7000").unwrap();

        let config = RelayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_from_file_full() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bind_address = \"127.0.0.1\"\nport = 9100\nqueue_capacity = 8"
        )
        .unwrap();

        let config = RelayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9100");
        assert_eq!(config.queue_capacity, 8);
    }

    #[test]
    fn test_from_file_rejects_unknown_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prot = 7000").unwrap();

        let err = RelayConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_from_file_rejects_zero_queue() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "queue_capacity = 0").unwrap();

        let err = RelayConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQueueCapacity));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = RelayConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_overrides() {
        let mut config = RelayConfig::default();
        config
            .apply_overrides(Some("127.0.0.1".into()), Some(" 9300 ".into()))
            .unwrap();
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9300");
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = RelayConfig::default();
        let err = config
            .apply_overrides(None, Some("ninety".into()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_PORT, .. }));
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
