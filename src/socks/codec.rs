//! SOCKS5 frame codec
//!
//! Pure encode/decode functions for every frame exchanged on the control
//! connection. Nothing here touches the network; decoders take the bytes
//! received so far and either produce a value or a [`DecodeError`].
//!
//! A [`DecodeError::Truncated`] carries the minimum total frame length that
//! is known from the bytes already present, which lets a reader top up the
//! buffer with exactly the missing bytes.

use super::consts::*;
use super::types::{Address, AuthMethod, ConnectRequest, Greeting};
use crate::error::{DecodeError, ReplyCode};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4};

/// VER and NMETHODS
const GREETING_HEADER_LEN: usize = 2;
/// Smallest auth request: VER, ULEN (0) and PLEN (0)
const MIN_AUTH_LEN: usize = 3;
/// VER, CMD, RSV and ATYP
const REQUEST_HEADER_LEN: usize = 4;
const IPV4_REQUEST_LEN: usize = REQUEST_HEADER_LEN + 4 + 2;
const IPV6_REQUEST_LEN: usize = REQUEST_HEADER_LEN + 16 + 2;
/// Domain request with a zero-length name
const MIN_DOMAIN_REQUEST_LEN: usize = REQUEST_HEADER_LEN + 1 + 2;

/// Username/password pair carried by an RFC 1929 request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    /// Username, decoded leniently
    pub username: String,
    /// Password, decoded leniently
    pub password: String,
}

/// Decode a client greeting
///
/// ```text
/// +----+----------+----------+
/// |VER | NMETHODS | METHODS  |
/// +----+----------+----------+
/// | 1  |    1     | 1 to 255 |
/// +----+----------+----------+
/// ```
///
/// A greeting offering no methods is rejected as soon as NMETHODS is known.
pub fn decode_greeting(buf: &[u8]) -> Result<Greeting, DecodeError> {
    require(buf, GREETING_HEADER_LEN)?;
    if buf[0] != SOCKS5_VERSION {
        return Err(DecodeError::UnsupportedVersion(buf[0]));
    }
    if buf[1] == 0 {
        return Err(DecodeError::NoMethods);
    }

    let end = GREETING_HEADER_LEN + buf[1] as usize;
    require(buf, end)?;

    Ok(Greeting {
        version: buf[0],
        methods: buf[GREETING_HEADER_LEN..end].to_vec(),
    })
}

/// Encode the server's method selection; `None` means no acceptable method
pub fn encode_method_selection(method: Option<AuthMethod>) -> [u8; 2] {
    [
        SOCKS5_VERSION,
        method.map_or(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE, AuthMethod::to_byte),
    ]
}

/// Decode a username/password request
///
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
/// +----+------+----------+------+----------+
/// ```
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn decode_auth_request(buf: &[u8]) -> Result<AuthRequest, DecodeError> {
    let version = *buf.first().ok_or(DecodeError::Truncated {
        needed: MIN_AUTH_LEN,
    })?;
    if version != SOCKS5_AUTH_VERSION {
        return Err(DecodeError::InvalidAuthVersion(version));
    }

    let ulen = *buf.get(1).ok_or(DecodeError::Truncated {
        needed: MIN_AUTH_LEN,
    })? as usize;
    let plen_at = 2 + ulen;
    let plen = *buf.get(plen_at).ok_or(DecodeError::Truncated {
        needed: plen_at + 1,
    })? as usize;
    let end = plen_at + 1 + plen;
    if buf.len() < end {
        return Err(DecodeError::Truncated { needed: end });
    }

    Ok(AuthRequest {
        username: String::from_utf8_lossy(&buf[2..plen_at]).into_owned(),
        password: String::from_utf8_lossy(&buf[plen_at + 1..end]).into_owned(),
    })
}

/// Encode the sub-negotiation status frame
pub fn encode_auth_result(ok: bool) -> [u8; 2] {
    let status = if ok {
        SOCKS5_AUTH_SUCCESS
    } else {
        SOCKS5_AUTH_FAILURE
    };
    [SOCKS5_AUTH_VERSION, status]
}

/// Decode a connection request
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// The reserved byte is ignored and the command is not validated here.
/// Bytes past the end of the frame are ignored.
pub fn decode_request(buf: &[u8]) -> Result<ConnectRequest, DecodeError> {
    if buf.len() < REQUEST_HEADER_LEN {
        return Err(DecodeError::Truncated {
            needed: REQUEST_HEADER_LEN,
        });
    }
    if buf[0] != SOCKS5_VERSION {
        return Err(DecodeError::UnsupportedVersion(buf[0]));
    }

    let command = buf[1];
    let (address, port_at) = match buf[3] {
        SOCKS5_ADDR_TYPE_IPV4 => {
            require(buf, IPV4_REQUEST_LEN)?;
            let octets: [u8; 4] = [buf[4], buf[5], buf[6], buf[7]];
            (Address::Ipv4(Ipv4Addr::from(octets)), 8)
        }
        SOCKS5_ADDR_TYPE_DOMAIN => {
            let len = *buf.get(4).ok_or(DecodeError::Truncated {
                needed: MIN_DOMAIN_REQUEST_LEN,
            })? as usize;
            require(buf, MIN_DOMAIN_REQUEST_LEN + len)?;
            let domain = String::from_utf8_lossy(&buf[5..5 + len]).into_owned();
            (Address::Domain(domain), 5 + len)
        }
        SOCKS5_ADDR_TYPE_IPV6 => {
            require(buf, IPV6_REQUEST_LEN)?;
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&buf[4..20]);
            (Address::Ipv6(Ipv6Addr::from(octets)), 20)
        }
        other => return Err(DecodeError::UnsupportedAddressType(other)),
    };

    let port = u16::from_be_bytes([buf[port_at], buf[port_at + 1]]);

    Ok(ConnectRequest {
        command,
        address,
        port,
    })
}

/// Encode a reply frame
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   |    4     |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub fn encode_reply(code: ReplyCode, bound: SocketAddrV4) -> [u8; REPLY_LEN] {
    let mut reply = [0u8; REPLY_LEN];
    reply[0] = SOCKS5_VERSION;
    reply[1] = code.into();
    reply[2] = SOCKS5_RESERVED;
    reply[3] = SOCKS5_ADDR_TYPE_IPV4;
    reply[4..8].copy_from_slice(&bound.ip().octets());
    reply[8..10].copy_from_slice(&bound.port().to_be_bytes());
    reply
}

/// Encode a reply carrying the zero address and port
pub fn encode_error_reply(code: ReplyCode) -> [u8; REPLY_LEN] {
    encode_reply(code, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
}

fn require(buf: &[u8], needed: usize) -> Result<(), DecodeError> {
    if buf.len() < needed {
        Err(DecodeError::Truncated { needed })
    } else {
        Ok(())
    }
}
