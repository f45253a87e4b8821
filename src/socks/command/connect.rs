//! TCP CONNECT handling
//!
//! Opens the outbound connection for a request and maps failures onto
//! SOCKS5 reply codes.

use super::reply::{send_reply, send_success};
use crate::error::{ConnectError, ReplyCode};
use crate::socks::types::{Address, ConnectRequest, SocksCommand};
use std::net::SocketAddr;
use tokio::io::AsyncWrite;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, info, warn};

/// Open a TCP connection to the request's destination
///
/// Domain names are resolved first and each address is tried in turn; the
/// last connect error is reported if none succeeds. No connect timeout is
/// applied beyond the operating system's.
pub async fn connect_target(request: &ConnectRequest) -> Result<TcpStream, ConnectError> {
    let addrs: Vec<SocketAddr> = match &request.address {
        Address::Domain(host) => lookup_host((host.as_str(), request.port))
            .await
            .map_err(|source| ConnectError::Resolve {
                host: host.clone(),
                source,
            })?
            .collect(),
        _ => request.socket_addr().into_iter().collect(),
    };

    let mut last_err = None;
    for addr in addrs {
        debug!("Connecting to target: {}", addr);
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Failed to connect to {}: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) => Err(ConnectError::Connect(e)),
        None => Err(ConnectError::NoAddresses(request.address.to_string())),
    }
}

/// Carry out a decoded request
///
/// Only CONNECT is implemented; every other command is answered with
/// [`ReplyCode::CommandNotSupported`]. On success the client has been sent a
/// success reply carrying the outbound socket's local port and the
/// connected stream is returned for relaying.
pub async fn dispatch_request<S>(stream: &mut S, request: &ConnectRequest) -> Option<TcpStream>
where
    S: AsyncWrite + Unpin,
{
    match request.socks_command() {
        Some(SocksCommand::Connect) => {}
        Some(command) => {
            warn!("Unsupported command: {}", command);
            send_reply(stream, ReplyCode::CommandNotSupported).await;
            return None;
        }
        None => {
            warn!("Unknown command: {:#04x}", request.command);
            send_reply(stream, ReplyCode::CommandNotSupported).await;
            return None;
        }
    }

    let remote = match connect_target(request).await {
        Ok(remote) => remote,
        Err(e) => {
            warn!("CONNECT to {} failed: {}", request, e);
            send_reply(stream, e.reply_code()).await;
            return None;
        }
    };

    let bound_port = match remote.local_addr() {
        Ok(addr) => addr.port(),
        Err(e) => {
            warn!("Failed to read outbound socket address: {}", e);
            send_reply(stream, ReplyCode::GeneralFailure).await;
            return None;
        }
    };

    if !send_success(stream, bound_port).await {
        return None;
    }

    info!("SOCKS5 tunnel established to {}", request);
    Some(remote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socks::consts::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    async fn refused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_connect_target_ipv4() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let request = ConnectRequest::connect(Address::Ipv4(Ipv4Addr::LOCALHOST), port);
        let stream = connect_target(&request).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_connect_target_refused() {
        let port = refused_port().await;
        let request = ConnectRequest::connect(Address::Ipv4(Ipv4Addr::LOCALHOST), port);

        let err = connect_target(&request).await.unwrap_err();
        assert_eq!(err.reply_code(), ReplyCode::ConnectionRefused);
    }

    #[tokio::test]
    async fn test_connect_target_resolve_failure() {
        let request =
            ConnectRequest::connect(Address::Domain("does-not-exist.invalid".to_string()), 80);

        let err = connect_target(&request).await.unwrap_err();
        assert_eq!(err.reply_code(), ReplyCode::HostUnreachable);
    }

    #[tokio::test]
    async fn test_dispatch_unsupported_commands() {
        for command in [SOCKS5_CMD_TCP_BIND, SOCKS5_CMD_UDP_ASSOCIATE, 0x09] {
            let mut request = ConnectRequest::connect(Address::Ipv4(Ipv4Addr::LOCALHOST), 80);
            request.command = command;

            let mut buffer = Vec::new();
            assert!(dispatch_request(&mut buffer, &request).await.is_none());
            assert_eq!(buffer, vec![0x05, 0x07, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
        }
    }

    #[tokio::test]
    async fn test_dispatch_connect_refused() {
        let port = refused_port().await;
        let request = ConnectRequest::connect(Address::Ipv4(Ipv4Addr::LOCALHOST), port);

        let mut buffer = Vec::new();
        assert!(dispatch_request(&mut buffer, &request).await.is_none());
        assert_eq!(buffer, vec![0x05, 0x05, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_dispatch_connect_success_reports_local_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let request = ConnectRequest::connect(Address::Ipv4(Ipv4Addr::LOCALHOST), port);

        let mut buffer = Vec::new();
        let remote = dispatch_request(&mut buffer, &request).await.unwrap();
        let local_port = remote.local_addr().unwrap().port();

        assert_eq!(&buffer[..8], &[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0]);
        assert_eq!(u16::from_be_bytes([buffer[8], buffer[9]]), local_port);
    }
}
