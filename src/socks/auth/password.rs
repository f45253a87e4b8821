//! Username/password authentication handler
//!
//! Implements RFC 1929 username/password authentication for SOCKS5.

use crate::credentials::CredentialStore;
use crate::socks::codec::{decode_auth_request, encode_auth_result};
use crate::socks::consts::AUTH_BUFFER_SIZE;
use crate::socks::frame::{read_frame, write_frame};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Outcome of the username/password sub-negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthOutcome {
    /// Whether the client authenticated and was told so
    pub success: bool,
}

/// Perform username/password authentication
///
/// # Protocol
///
/// Client sends:
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 0 to 255 |  1   | 0 to 255 |
/// +----+------+----------+------+----------+
/// ```
///
/// Server responds:
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
///
/// Exactly one status frame is sent, including when the request could not
/// be read or decoded.
pub async fn authenticate_password<S>(stream: &mut S, store: &dyn CredentialStore) -> AuthOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let verified = match read_frame(stream, AUTH_BUFFER_SIZE, decode_auth_request).await {
        Ok(request) => {
            let ok = store.authenticate(&request.username, &request.password);
            if ok {
                info!("User {} authenticated", request.username);
            }
            ok
        }
        Err(e) => {
            warn!("Invalid authentication request: {}", e);
            false
        }
    };

    let sent = match write_frame(stream, &encode_auth_result(verified)).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to send auth result: {}", e);
            false
        }
    };

    AuthOutcome {
        success: verified && sent,
    }
}
