//! Proxy configuration types
//!
//! Defines the configuration structures for the SOCKS5 server.

use crate::error::SocksdError;
use crate::socks::{DEFAULT_BUFFER_SIZE, DEFAULT_IDLE_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default listen address
fn default_listen() -> String {
    "0.0.0.0:1080".to_string()
}

/// Default listen backlog
fn default_backlog() -> u32 {
    5
}

fn default_reuse_addr() -> bool {
    true
}

/// Default relay idle timeout in seconds
fn default_idle_timeout() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

/// Default relay read size in bytes
fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_users_file() -> PathBuf {
    PathBuf::from("users.toml")
}

/// Root configuration structure
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Relay configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SocksdError> {
        self.server.validate()?;
        self.relay.validate()
    }
}

/// Listener configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:1080")
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Maximum number of pending connections
    #[serde(default = "default_backlog")]
    pub backlog: u32,

    /// Set SO_REUSEADDR on the listening socket
    #[serde(default = "default_reuse_addr")]
    pub reuse_addr: bool,

    /// Limit in seconds on greeting, authentication and request reads
    ///
    /// Unset means a client may stall the handshake indefinitely.
    #[serde(default)]
    pub handshake_timeout: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backlog: default_backlog(),
            reuse_addr: default_reuse_addr(),
            handshake_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Parsed listen address
    pub fn listen_addr(&self) -> Result<SocketAddr, SocksdError> {
        self.listen.parse().map_err(|e| {
            SocksdError::Config(format!("Invalid listen address {:?}: {}", self.listen, e))
        })
    }

    /// Handshake timeout as a duration, if set
    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SocksdError> {
        self.listen_addr()?;
        if self.backlog == 0 {
            return Err(SocksdError::Config("Listen backlog must be greater than zero".to_string()));
        }
        if self.handshake_timeout == Some(0) {
            return Err(SocksdError::Config("Handshake timeout must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Relay configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelayConfig {
    /// Seconds of silence on both sides before a session is closed
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Maximum bytes read from one side per iteration
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            idle_timeout: default_idle_timeout(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl RelayConfig {
    /// Idle timeout as a duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SocksdError> {
        if self.idle_timeout == 0 {
            return Err(SocksdError::Config("Relay idle timeout must be greater than zero".to_string()));
        }
        if self.buffer_size == 0 {
            return Err(SocksdError::Config("Relay buffer size must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Authentication configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// Load the users file and offer username/password authentication
    #[serde(default)]
    pub enabled: bool,

    /// Path of the users file
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            users_file: default_users_file(),
        }
    }
}
