//! SOCKS5 type definitions
//!
//! Defines the decoded frames and enums used in SOCKS5 protocol handling.

use super::consts::*;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Authentication method types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuthMethod {
    /// No authentication required
    None,
    /// Username/password authentication
    Password,
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::None => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Password => SOCKS5_AUTH_METHOD_PASSWORD,
        }
    }

    /// Parse from SOCKS5 method byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => Some(AuthMethod::None),
            SOCKS5_AUTH_METHOD_PASSWORD => Some(AuthMethod::Password),
            _ => None,
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::None => write!(f, "no-auth"),
            AuthMethod::Password => write!(f, "username/password"),
        }
    }
}

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// TCP BIND - wait for incoming connection (not implemented)
    Bind,
    /// UDP ASSOCIATE - establish UDP relay (not implemented)
    UdpAssociate,
}

impl SocksCommand {
    /// Parse a command byte into SocksCommand
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => Some(SocksCommand::Connect),
            SOCKS5_CMD_TCP_BIND => Some(SocksCommand::Bind),
            SOCKS5_CMD_UDP_ASSOCIATE => Some(SocksCommand::UdpAssociate),
            _ => None,
        }
    }

    /// Convert SocksCommand to byte
    pub fn to_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => SOCKS5_CMD_TCP_CONNECT,
            SocksCommand::Bind => SOCKS5_CMD_TCP_BIND,
            SocksCommand::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// Client greeting: version and the offered method codes, as sent
///
/// Methods are kept in wire order; duplicates and unknown codes are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// SOCKS version (always 5 once decoded)
    pub version: u8,
    /// Offered method codes
    pub methods: Vec<u8>,
}

/// Destination address of a request
///
/// Exactly one representation exists per request, chosen by the ATYP byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// 4-byte IPv4 address
    Ipv4(Ipv4Addr),
    /// Length-prefixed domain name
    Domain(String),
    /// 16-byte IPv6 address
    Ipv6(Ipv6Addr),
}

impl Address {
    /// Get the address type byte for SOCKS5 protocol
    pub fn addr_type(&self) -> u8 {
        match self {
            Address::Ipv4(_) => SOCKS5_ADDR_TYPE_IPV4,
            Address::Domain(_) => SOCKS5_ADDR_TYPE_DOMAIN,
            Address::Ipv6(_) => SOCKS5_ADDR_TYPE_IPV6,
        }
    }

    /// IP address, if this is not a domain name
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            Address::Ipv4(ip) => Some(IpAddr::V4(*ip)),
            Address::Ipv6(ip) => Some(IpAddr::V6(*ip)),
            Address::Domain(_) => None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ipv4(ip) => write!(f, "{}", ip),
            Address::Domain(domain) => write!(f, "{}", domain),
            Address::Ipv6(ip) => write!(f, "{}", ip),
        }
    }
}

/// Decoded connection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Raw command byte; unknown values are kept so they can be answered
    pub command: u8,
    /// Destination address
    pub address: Address,
    /// Destination port
    pub port: u16,
}

impl ConnectRequest {
    /// Create a CONNECT request to the given destination
    pub fn connect(address: Address, port: u16) -> Self {
        ConnectRequest {
            command: SOCKS5_CMD_TCP_CONNECT,
            address,
            port,
        }
    }

    /// The command, if it is one defined by RFC 1928
    pub fn socks_command(&self) -> Option<SocksCommand> {
        SocksCommand::from_byte(self.command)
    }

    /// Address type byte of the destination
    pub fn addr_type(&self) -> u8 {
        self.address.addr_type()
    }

    /// Destination as a socket address when no name resolution is needed
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address.ip().map(|ip| SocketAddr::new(ip, self.port))
    }

    /// Encode the request the way a client sends it
    ///
    /// Returns `None` when a domain name is longer than 255 bytes.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let mut bytes = vec![
            SOCKS5_VERSION,
            self.command,
            SOCKS5_RESERVED,
            self.addr_type(),
        ];

        match &self.address {
            Address::Ipv4(ip) => bytes.extend_from_slice(&ip.octets()),
            Address::Ipv6(ip) => bytes.extend_from_slice(&ip.octets()),
            Address::Domain(domain) => {
                bytes.push(u8::try_from(domain.len()).ok()?);
                bytes.extend_from_slice(domain.as_bytes());
            }
        }
        bytes.extend_from_slice(&self.port.to_be_bytes());

        Some(bytes)
    }
}

impl fmt::Display for ConnectRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Address::Ipv6(ip) => write!(f, "[{}]:{}", ip, self.port),
            other => write!(f, "{}:{}", other, self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_method_to_byte() {
        assert_eq!(AuthMethod::None.to_byte(), SOCKS5_AUTH_METHOD_NONE);
        assert_eq!(AuthMethod::Password.to_byte(), SOCKS5_AUTH_METHOD_PASSWORD);
    }

    #[test]
    fn test_auth_method_from_byte() {
        assert_eq!(AuthMethod::from_byte(0), Some(AuthMethod::None));
        assert_eq!(AuthMethod::from_byte(2), Some(AuthMethod::Password));
        assert_eq!(AuthMethod::from_byte(1), None); // GSSAPI not implemented
        assert_eq!(AuthMethod::from_byte(255), None);
    }

    #[test]
    fn test_socks_command_from_byte() {
        assert_eq!(SocksCommand::from_byte(1), Some(SocksCommand::Connect));
        assert_eq!(SocksCommand::from_byte(2), Some(SocksCommand::Bind));
        assert_eq!(SocksCommand::from_byte(3), Some(SocksCommand::UdpAssociate));
        assert_eq!(SocksCommand::from_byte(4), None);
    }

    #[test]
    fn test_socks_command_display() {
        assert_eq!(format!("{}", SocksCommand::Connect), "CONNECT");
        assert_eq!(format!("{}", SocksCommand::Bind), "BIND");
        assert_eq!(format!("{}", SocksCommand::UdpAssociate), "UDP ASSOCIATE");
    }

    #[test]
    fn test_address_types() {
        assert_eq!(
            Address::Ipv4(Ipv4Addr::LOCALHOST).addr_type(),
            SOCKS5_ADDR_TYPE_IPV4
        );
        assert_eq!(
            Address::Domain("example.com".to_string()).addr_type(),
            SOCKS5_ADDR_TYPE_DOMAIN
        );
        assert_eq!(
            Address::Ipv6(Ipv6Addr::LOCALHOST).addr_type(),
            SOCKS5_ADDR_TYPE_IPV6
        );
    }

    #[test]
    fn test_request_display() {
        let req = ConnectRequest::connect(Address::Ipv4(Ipv4Addr::new(127, 0, 0, 1)), 8080);
        assert_eq!(format!("{}", req), "127.0.0.1:8080");

        let req = ConnectRequest::connect(Address::Domain("test.com".to_string()), 443);
        assert_eq!(format!("{}", req), "test.com:443");

        let req = ConnectRequest::connect(Address::Ipv6(Ipv6Addr::LOCALHOST), 80);
        assert_eq!(format!("{}", req), "[::1]:80");
    }

    #[test]
    fn test_request_socket_addr() {
        let req = ConnectRequest::connect(Address::Ipv4(Ipv4Addr::new(10, 0, 0, 1)), 1234);
        assert_eq!(req.socket_addr(), Some("10.0.0.1:1234".parse().unwrap()));

        let req = ConnectRequest::connect(Address::Domain("example.com".to_string()), 80);
        assert_eq!(req.socket_addr(), None);
    }

    #[test]
    fn test_request_to_bytes_ipv4() {
        let req = ConnectRequest::connect(Address::Ipv4(Ipv4Addr::new(93, 184, 216, 34)), 80);
        assert_eq!(
            req.to_bytes().unwrap(),
            vec![0x05, 0x01, 0x00, 0x01, 0x5D, 0xB8, 0xD8, 0x22, 0x00, 0x50]
        );
    }

    #[test]
    fn test_request_to_bytes_domain() {
        let req = ConnectRequest::connect(Address::Domain("test".to_string()), 80);
        let bytes = req.to_bytes().unwrap();

        assert_eq!(bytes[3], SOCKS5_ADDR_TYPE_DOMAIN);
        assert_eq!(bytes[4], 4); // "test" length
        assert_eq!(&bytes[5..9], b"test");
        assert_eq!(&bytes[9..11], &80u16.to_be_bytes());
    }

    #[test]
    fn test_request_to_bytes_domain_too_long() {
        let req = ConnectRequest::connect(Address::Domain("a".repeat(255)), 80);
        let bytes = req.to_bytes().unwrap();
        assert_eq!(bytes[4], 255);
        assert_eq!(bytes.len(), 4 + 1 + 255 + 2);

        // 256 bytes cannot be length-prefixed with one byte
        let req = ConnectRequest::connect(Address::Domain("a".repeat(256)), 80);
        assert_eq!(req.to_bytes(), None);
    }
}
