//! # Socksd - SOCKS5 Proxy Server
//!
//! Socksd is a SOCKS5 (RFC 1928) proxy server with optional
//! username/password authentication (RFC 1929). It accepts TCP clients,
//! negotiates an authentication method, opens the requested outbound TCP
//! connection and relays data in both directions until either side closes
//! or the connection goes idle.
//!
//! ## Features
//!
//! - **CONNECT**: IPv4, IPv6 and domain-name destinations
//! - **Optional Authentication**: username/password checked against a TOML users file
//! - **Idle Reaping**: relays close after a configurable period of silence
//! - **Graceful Shutdown**: the listener stops through an explicit handle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksd::config::load_config;
//! use socksd::credentials::UserStore;
//! use socksd::server::Server;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("socksd.toml")?;
//!     let store = Arc::new(UserStore::load(&config.auth.users_file)?);
//!
//!     let handle = Server::new(config, store).start()?;
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Listener -> Session (negotiate -> request -> connect) -> Relay -> close
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod credentials;
pub mod error;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use credentials::{CredentialStore, UserStore};
pub use error::{ConnectError, DecodeError, ReplyCode, SocksdError};
pub use server::{Server, ServerHandle};

/// Version of the Socksd library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
