//! SOCKS5 authentication module
//!
//! Handles method negotiation and, when selected, username/password
//! authentication.

mod password;

pub use password::{authenticate_password, AuthOutcome};

use super::codec::{decode_greeting, encode_method_selection};
use super::consts::HANDSHAKE_BUFFER_SIZE;
use super::frame::{read_frame, write_frame};
use super::types::AuthMethod;
use crate::credentials::CredentialStore;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Result of method negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiation {
    /// Whether the client may go on to send a request
    pub ok: bool,
    /// Method the server selected, if any
    pub method: Option<AuthMethod>,
}

impl Negotiation {
    fn failed(method: Option<AuthMethod>) -> Self {
        Negotiation { ok: false, method }
    }
}

/// Perform method negotiation
///
/// This function handles the first SOCKS5 exchange:
/// 1. Read the client greeting
/// 2. Select the best method both sides support
/// 3. Send the selection (or `05 FF` when there is none)
///
/// When username/password is selected the caller runs
/// [`authenticate_password`] next. A malformed greeting is not answered.
/// No error escapes; every failure is reported as `ok == false`.
pub async fn negotiate<S>(stream: &mut S, store: &dyn CredentialStore) -> Negotiation
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let greeting = match read_frame(stream, HANDSHAKE_BUFFER_SIZE, decode_greeting).await {
        Ok(greeting) => greeting,
        Err(e) => {
            warn!("Handshake failed: {}", e);
            return Negotiation::failed(None);
        }
    };

    debug!("Client supported methods: {:?}", greeting.methods);

    let selected = select_auth_method(&greeting.methods, !store.is_empty());
    if let Err(e) = write_frame(stream, &encode_method_selection(selected)).await {
        debug!("Failed to send method selection: {}", e);
        return Negotiation::failed(selected);
    }

    if selected.is_none() {
        warn!("No acceptable authentication method");
        return Negotiation::failed(None);
    }

    Negotiation {
        ok: true,
        method: selected,
    }
}

/// Select the best authentication method
///
/// The server always supports no-auth, and username/password only when
/// credentials are configured. Among the offered methods the server also
/// supports, the numerically largest code wins.
fn select_auth_method(methods: &[u8], has_credentials: bool) -> Option<AuthMethod> {
    methods
        .iter()
        .filter_map(|&m| AuthMethod::from_byte(m))
        .filter(|m| match m {
            AuthMethod::None => true,
            AuthMethod::Password => has_credentials,
        })
        .max_by_key(|m| m.to_byte())
}
