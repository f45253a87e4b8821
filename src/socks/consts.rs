//! SOCKS5 protocol constants
//!
//! Defines all constants used in the SOCKS5 protocol implementation
//! (RFC 1928) and the username/password sub-negotiation (RFC 1929).

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

/// SOCKS5 authentication sub-negotiation version
pub const SOCKS5_AUTH_VERSION: u8 = 0x01;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// Username/password authentication
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

// Sub-negotiation status
/// Username/password accepted
pub const SOCKS5_AUTH_SUCCESS: u8 = 0x00;
/// Username/password rejected
pub const SOCKS5_AUTH_FAILURE: u8 = 0x01;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
/// TCP BIND command (not implemented)
pub const SOCKS5_CMD_TCP_BIND: u8 = 0x02;
/// UDP ASSOCIATE command (not implemented)
pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

// Reply codes
/// Succeeded
pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;
/// General SOCKS server failure
pub const SOCKS5_REPLY_GENERAL_FAILURE: u8 = 0x01;
/// Host unreachable
pub const SOCKS5_REPLY_HOST_UNREACHABLE: u8 = 0x04;
/// Connection refused
pub const SOCKS5_REPLY_CONNECTION_REFUSED: u8 = 0x05;
/// Command not supported
pub const SOCKS5_REPLY_COMMAND_NOT_SUPPORTED: u8 = 0x07;
/// Address type not supported
pub const SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED: u8 = 0x08;

// Reserved byte
/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Frame and buffer sizes
/// Largest greeting or request frame: VER + NMETHODS + 255 methods + slack
pub const HANDSHAKE_BUFFER_SIZE: usize = 262;
/// Largest username/password frame: VER + ULEN + 255 + PLEN + 255
pub const AUTH_BUFFER_SIZE: usize = 513;
/// Default relay read size
pub const DEFAULT_BUFFER_SIZE: usize = 4096;
/// Default relay idle timeout in seconds
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;
/// Length of every reply frame (IPv4 bound address only)
pub const REPLY_LEN: usize = 10;
