//! Error types for Socksd
//!
//! This module defines all custom error types used throughout the application.

use std::io;
use thiserror::Error;

/// Main error type for Socksd operations
#[derive(Error, Debug)]
pub enum SocksdError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential store error
    #[error("Credential store error: {0}")]
    Credentials(String),

    /// Malformed protocol frame
    #[error("Protocol error: {0}")]
    Decode(#[from] DecodeError),

    /// Timeout
    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Errors produced while decoding a client frame
///
/// Every decoder in [`crate::socks::codec`] returns one of these instead of
/// failing out of band, so callers have to handle each malformed-input case.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes are present than the frame declares
    #[error("Truncated frame: at least {needed} bytes required")]
    Truncated {
        /// Minimum total frame length known from the bytes seen so far
        needed: usize,
    },

    /// Version byte other than 5
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Greeting with NMETHODS of zero
    #[error("No authentication methods offered")]
    NoMethods,

    /// Sub-negotiation version byte other than 1
    #[error("Invalid auth version: {0}")]
    InvalidAuthVersion(u8),

    /// ATYP outside IPv4, domain and IPv6
    #[error("Address type not supported: {0}")]
    UnsupportedAddressType(u8),
}

/// Errors produced while opening the outbound connection of a CONNECT
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Name resolution failed
    #[error("Failed to resolve {host}: {source}")]
    Resolve {
        /// Host that was looked up
        host: String,
        /// Underlying resolver error
        source: io::Error,
    },

    /// Name resolution succeeded but produced nothing to connect to
    #[error("No addresses found for {0}")]
    NoAddresses(String),

    /// TCP connect failed
    #[error("Failed to connect: {0}")]
    Connect(#[from] io::Error),
}

impl ConnectError {
    /// SOCKS5 reply code to report for this failure
    pub fn reply_code(&self) -> ReplyCode {
        ReplyCode::from(self)
    }
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<ReplyCode> for u8 {
    fn from(code: ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for ReplyCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ReplyCode::Succeeded),
            0x01 => Ok(ReplyCode::GeneralFailure),
            0x04 => Ok(ReplyCode::HostUnreachable),
            0x05 => Ok(ReplyCode::ConnectionRefused),
            0x07 => Ok(ReplyCode::CommandNotSupported),
            0x08 => Ok(ReplyCode::AddressTypeNotSupported),
            other => Err(other),
        }
    }
}

impl From<&ConnectError> for ReplyCode {
    fn from(err: &ConnectError) -> Self {
        match err {
            ConnectError::Resolve { .. } | ConnectError::NoAddresses(_) => {
                ReplyCode::HostUnreachable
            }
            ConnectError::Connect(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                ReplyCode::ConnectionRefused
            }
            ConnectError::Connect(_) => ReplyCode::GeneralFailure,
        }
    }
}
