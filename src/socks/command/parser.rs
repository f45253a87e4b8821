//! SOCKS5 request reader

use super::reply::send_reply;
use crate::error::{DecodeError, ReplyCode, SocksdError};
use crate::socks::codec::decode_request;
use crate::socks::consts::HANDSHAKE_BUFFER_SIZE;
use crate::socks::frame::read_frame;
use crate::socks::types::ConnectRequest;
use tokio::io::{AsyncRead, AsyncWrite};

/// Read and decode the connection request
///
/// An unsupported address type is answered with
/// [`ReplyCode::AddressTypeNotSupported`] before the error is returned.
/// Other failures are returned without a reply.
pub async fn read_request<S>(stream: &mut S) -> Result<ConnectRequest, SocksdError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match read_frame(stream, HANDSHAKE_BUFFER_SIZE, decode_request).await {
        Ok(request) => Ok(request),
        Err(e @ SocksdError::Decode(DecodeError::UnsupportedAddressType(_))) => {
            send_reply(stream, ReplyCode::AddressTypeNotSupported).await;
            Err(e)
        }
        Err(e) => Err(e),
    }
}
