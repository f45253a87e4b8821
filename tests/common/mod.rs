//! Test utilities and mocks for Socksd
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use socksd::config::Config;
use socksd::credentials::UserStore;
use socksd::server::{Server, ServerHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start a destination that echoes every connection back to itself
pub async fn spawn_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    serve_echo(listener);
    addr
}

/// Echo server on the IPv6 loopback, or `None` when IPv6 is unavailable
pub async fn spawn_echo_server_ipv6() -> Option<SocketAddr> {
    let listener = TcpListener::bind("[::1]:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    serve_echo(listener);
    Some(addr)
}

fn serve_echo(listener: TcpListener) {
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
}

/// A port on which nothing is listening
pub async fn closed_port() -> u16 {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr.port()
}

/// Test configuration builder
pub struct TestConfigBuilder {
    users: Vec<(String, String)>,
    idle_timeout: u64,
    handshake_timeout: Option<u64>,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        TestConfigBuilder {
            users: Vec::new(),
            idle_timeout: 30,
            handshake_timeout: None,
        }
    }
}

impl TestConfigBuilder {
    /// Create a new test config builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user to the credential store
    pub fn user(mut self, username: &str, password: &str) -> Self {
        self.users
            .push((username.to_string(), password.to_string()));
        self
    }

    /// Set relay idle timeout in seconds
    pub fn idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout = secs;
        self
    }

    /// Set handshake timeout in seconds
    pub fn handshake_timeout(mut self, secs: u64) -> Self {
        self.handshake_timeout = Some(secs);
        self
    }

    /// Build the configuration and credential store
    pub fn build(self) -> (Config, UserStore) {
        let mut config = Config::default();
        config.server.listen = "127.0.0.1:0".to_string();
        config.server.handshake_timeout = self.handshake_timeout;
        config.relay.idle_timeout = self.idle_timeout;
        config.auth.enabled = !self.users.is_empty();

        (config, UserStore::from_users(self.users))
    }

    /// Start a proxy with this configuration
    pub fn start(self) -> ServerHandle {
        let (config, store) = self.build();
        Server::new(config, Arc::new(store)).start().unwrap()
    }
}

/// Connect to the proxy and complete a no-auth negotiation
pub async fn connect_no_auth(proxy: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream
        .write_all(&socks5_mock::create_auth_request_no_auth())
        .await
        .unwrap();

    let mut selection = [0u8; 2];
    stream.read_exact(&mut selection).await.unwrap();
    assert_eq!(selection, [0x05, 0x00]);

    stream
}

/// Read one 10-byte reply
pub async fn read_reply(stream: &mut TcpStream) -> [u8; 10] {
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use socksd::socks::*;

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// Create a password auth method selection request
    pub fn create_auth_request_password() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_PASSWORD]
    }

    /// Create a username/password sub-negotiation request
    pub fn create_password_request(username: &str, password: &str) -> Vec<u8> {
        let mut req = vec![SOCKS5_AUTH_VERSION, username.len() as u8];
        req.extend_from_slice(username.as_bytes());
        req.push(password.len() as u8);
        req.extend_from_slice(password.as_bytes());
        req
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to IPv6 address
    pub fn create_connect_ipv6(ip: [u8; 16], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV6,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }
}
