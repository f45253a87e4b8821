//! SOCKS5 module for Socksd
//!
//! This module implements the server side of the SOCKS5 protocol: the wire
//! codec, method negotiation and authentication, request handling, and the
//! data relay.

mod auth;
mod codec;
mod command;
mod consts;
mod frame;
mod handler;
mod relay;
mod types;

pub use auth::{authenticate_password, negotiate, AuthOutcome, Negotiation};
pub use codec::{
    decode_auth_request, decode_greeting, decode_request, encode_auth_result,
    encode_error_reply, encode_method_selection, encode_reply, AuthRequest,
};
pub use command::{connect_target, dispatch_request, read_request, send_reply, send_success};
pub use consts::*;
pub use frame::{read_frame, write_frame};
pub use handler::{handle_connection, Session, SessionContext, SessionState};
pub use relay::{relay, RelayEnd, RelayStats};
pub use types::{Address, AuthMethod, ConnectRequest, Greeting, SocksCommand};
