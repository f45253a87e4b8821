//! Per-connection session supervisor
//!
//! Sequences negotiation, request handling and the relay for one accepted
//! client. Every failure is contained here: the session is logged, the
//! client stream is closed, and nothing is returned to the caller except
//! the final [`Session`] record.

use super::auth::{authenticate_password, negotiate};
use super::command::{dispatch_request, read_request};
use super::consts::{DEFAULT_BUFFER_SIZE, DEFAULT_IDLE_TIMEOUT_SECS};
use super::relay::{relay, RelayStats};
use super::types::AuthMethod;
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::SocksdError;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Settings shared by every session of a server
#[derive(Clone)]
pub struct SessionContext {
    /// Credentials consulted during authentication
    pub store: Arc<dyn CredentialStore>,
    /// Relay idle timeout
    pub idle_timeout: Duration,
    /// Relay read size
    pub buffer_size: usize,
    /// Optional bound on each handshake read phase
    pub handshake_timeout: Option<Duration>,
}

impl SessionContext {
    /// Context with default relay settings and no handshake timeout
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        SessionContext {
            store,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            buffer_size: DEFAULT_BUFFER_SIZE,
            handshake_timeout: None,
        }
    }

    /// Context built from the loaded configuration
    pub fn from_config(config: &Config, store: Arc<dyn CredentialStore>) -> Self {
        SessionContext {
            store,
            idle_timeout: config.relay.idle_timeout(),
            buffer_size: config.relay.buffer_size,
            handshake_timeout: config.server.handshake_timeout(),
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("auth_enabled", &!self.store.is_empty())
            .field("idle_timeout", &self.idle_timeout)
            .field("buffer_size", &self.buffer_size)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

/// Lifecycle states of a session
///
/// States only move forward; any failure goes through `Error` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Reading the greeting and selecting a method
    Negotiating,
    /// Running username/password authentication
    Authenticating,
    /// Reading the connection request
    ParsingRequest,
    /// Opening the outbound connection
    Connecting,
    /// Relaying data
    Relaying,
    /// Both streams closed
    Closed,
    /// A failure occurred; the session is about to close
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Negotiating => "negotiating",
            SessionState::Authenticating => "authenticating",
            SessionState::ParsingRequest => "parsing-request",
            SessionState::Connecting => "connecting",
            SessionState::Relaying => "relaying",
            SessionState::Closed => "closed",
            SessionState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Record of one client connection
#[derive(Debug, Clone)]
pub struct Session {
    /// Client address
    pub peer: SocketAddr,
    /// Current state
    pub state: SessionState,
    /// Negotiated authentication method
    pub method: Option<AuthMethod>,
    /// Whether the client passed negotiation
    pub authenticated: bool,
    /// State in which the session failed, if it did
    pub failed_in: Option<SessionState>,
    /// Relay outcome, once relaying has finished
    pub relay: Option<RelayStats>,
}

impl Session {
    fn new(peer: SocketAddr) -> Self {
        Session {
            peer,
            state: SessionState::Negotiating,
            method: None,
            authenticated: false,
            failed_in: None,
            relay: None,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self) {
        self.failed_in = Some(self.state);
        self.transition(SessionState::Error);
    }
}

/// Handle one accepted client connection to completion
///
/// The stream is always closed when this returns.
pub async fn handle_connection<S>(mut stream: S, peer: SocketAddr, ctx: &SessionContext) -> Session
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut session = Session::new(peer);

    match run_session(&mut stream, &mut session, ctx).await {
        Some(remote) => {
            session.transition(SessionState::Relaying);
            let stats = relay(stream, remote, ctx.idle_timeout, ctx.buffer_size).await;
            info!(
                "Session closed ({}): {} bytes up, {} bytes down",
                stats.end, stats.client_to_remote, stats.remote_to_client
            );
            session.relay = Some(stats);
        }
        None => {
            let _ = stream.shutdown().await;
        }
    }

    session.transition(SessionState::Closed);
    session
}

/// Run the session up to the point where relaying can start
async fn run_session<S>(
    stream: &mut S,
    session: &mut Session,
    ctx: &SessionContext,
) -> Option<tokio::net::TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let negotiation = match with_handshake_timeout(
        ctx.handshake_timeout,
        "negotiation",
        negotiate(stream, ctx.store.as_ref()),
    )
    .await
    {
        Ok(negotiation) => negotiation,
        Err(e) => {
            warn!("{}", e);
            session.fail();
            return None;
        }
    };

    session.method = negotiation.method;
    if !negotiation.ok {
        session.fail();
        return None;
    }

    if negotiation.method == Some(AuthMethod::Password) {
        session.transition(SessionState::Authenticating);
        let outcome = match with_handshake_timeout(
            ctx.handshake_timeout,
            "authentication",
            authenticate_password(stream, ctx.store.as_ref()),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{}", e);
                session.fail();
                return None;
            }
        };
        if !outcome.success {
            session.fail();
            return None;
        }
    }
    session.authenticated = true;
    session.transition(SessionState::ParsingRequest);

    let request =
        match with_handshake_timeout(ctx.handshake_timeout, "request", read_request(stream)).await
        {
            Ok(Ok(request)) => request,
            Ok(Err(e)) => {
                warn!("Failed to read request: {}", e);
                session.fail();
                return None;
            }
            Err(e) => {
                warn!("{}", e);
                session.fail();
                return None;
            }
        };

    info!("SOCKS5 {:#04x} request to {}", request.command, request);
    session.transition(SessionState::Connecting);

    match dispatch_request(stream, &request).await {
        Some(remote) => Some(remote),
        None => {
            session.fail();
            None
        }
    }
}

/// Bound one handshake phase by the configured timeout, if any
async fn with_handshake_timeout<F>(
    limit: Option<Duration>,
    phase: &str,
    fut: F,
) -> Result<F::Output, SocksdError>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| SocksdError::Timeout(format!("{} exceeded {:?}", phase, limit))),
        None => Ok(fut.await),
    }
}
