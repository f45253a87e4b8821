//! SOCKS5 request handling module
//!
//! Reads the connection request, dispatches on its command and reports the
//! outcome to the client.

mod connect;
mod parser;
mod reply;

pub use connect::{connect_target, dispatch_request};
pub use parser::read_request;
pub use reply::{send_reply, send_success};
