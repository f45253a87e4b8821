//! SOCKS5 reply sender
//!
//! Replies are best-effort: a client that has already gone away only
//! produces a debug log line.

use crate::error::ReplyCode;
use crate::socks::codec::{encode_error_reply, encode_reply};
use crate::socks::frame::write_frame;
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::io::AsyncWrite;
use tracing::debug;

/// Send a reply carrying the zero address and port
///
/// Returns whether the reply was written.
pub async fn send_reply<S>(stream: &mut S, code: ReplyCode) -> bool
where
    S: AsyncWrite + Unpin,
{
    write_reply(stream, &encode_error_reply(code)).await
}

/// Send a success reply
///
/// The bound address is always `0.0.0.0`; only the port is real.
pub async fn send_success<S>(stream: &mut S, bound_port: u16) -> bool
where
    S: AsyncWrite + Unpin,
{
    let bound = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, bound_port);
    write_reply(stream, &encode_reply(ReplyCode::Succeeded, bound)).await
}

async fn write_reply<S>(stream: &mut S, reply: &[u8]) -> bool
where
    S: AsyncWrite + Unpin,
{
    match write_frame(stream, reply).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to send reply: {}", e);
            false
        }
    }
}
