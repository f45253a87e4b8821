//! TCP listener and accept loop
//!
//! Accepts client connections and runs one session task per connection.
//! The loop is stopped through the [`ServerHandle`] returned by
//! [`Server::start`].

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::socks::{handle_connection, SessionContext};
use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

/// Pause after a failed accept before trying again
const ACCEPT_ERROR_DELAY: Duration = Duration::from_millis(100);

/// SOCKS5 server
pub struct Server {
    config: Config,
    ctx: SessionContext,
}

impl Server {
    /// Create a server from configuration and a credential store
    pub fn new(config: Config, store: Arc<dyn CredentialStore>) -> Self {
        let ctx = SessionContext::from_config(&config, store);
        Server { config, ctx }
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create the listening socket
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.server.listen_addr()?;
        let backlog = i32::try_from(self.config.server.backlog).unwrap_or(i32::MAX);

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .with_context(|| "Failed to create listening socket")?;
        socket.set_reuse_address(self.config.server.reuse_addr)?;
        socket.set_nonblocking(true)?;
        socket
            .bind(&addr.into())
            .with_context(|| format!("Failed to bind {}", addr))?;
        socket.listen(backlog)?;

        TcpListener::from_std(socket.into()).with_context(|| "Failed to register listener")
    }

    /// Bind and start accepting connections in a background task
    pub fn start(self) -> Result<ServerHandle> {
        let listener = self.bind()?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        info!("SOCKS5 server listening on {}", local_addr);
        if self.ctx.store.is_empty() {
            info!("Authentication disabled");
        }

        let task = tokio::spawn(accept_loop(listener, self.ctx, shutdown_rx));

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            task,
        })
    }
}

/// Handle to a running server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and close the listening socket
    ///
    /// Sessions already running are left to finish on their own.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Accept loop terminated abnormally: {}", e);
        }
        info!("Server stopped");
    }
}

async fn accept_loop(
    listener: TcpListener,
    ctx: SessionContext,
    mut shutdown_rx: broadcast::Receiver<bool>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    info!("Accepted connection from {}", peer);
                    let ctx = ctx.clone();
                    tokio::spawn(
                        async move {
                            handle_connection(stream, peer, &ctx).await;
                        }
                        .instrument(info_span!("session", %peer)),
                    );
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_DELAY).await;
                }
            },
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping listener");
                break;
            }
        }
    }
}
