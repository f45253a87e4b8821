//! Bidirectional relay for established CONNECT sessions
//!
//! Bytes are pumped between the client and the destination until one side
//! closes, an I/O error occurs, or both sides stay silent for the idle
//! timeout.

use std::fmt;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Why a relay stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// The client closed its side
    ClientClosed,
    /// The destination closed its side
    RemoteClosed,
    /// Neither side sent anything within the idle timeout
    IdleTimeout,
    /// A read or write failed
    Error,
}

impl fmt::Display for RelayEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayEnd::ClientClosed => write!(f, "client closed"),
            RelayEnd::RemoteClosed => write!(f, "remote closed"),
            RelayEnd::IdleTimeout => write!(f, "idle timeout"),
            RelayEnd::Error => write!(f, "I/O error"),
        }
    }
}

/// Byte counts and termination cause of a finished relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes forwarded from the client to the destination
    pub client_to_remote: u64,
    /// Bytes forwarded from the destination to the client
    pub remote_to_client: u64,
    /// Why the relay stopped
    pub end: RelayEnd,
}

enum Readable {
    Client(io::Result<usize>),
    Remote(io::Result<usize>),
}

/// Relay data bidirectionally between `client` and `remote`
///
/// Each iteration waits for either side to become readable, reads at most
/// `buffer_size` bytes, and writes them in full to the other side before
/// waiting again. A zero-length read from either side ends the relay at
/// once without draining the other. Both streams are shut down and dropped
/// on every exit path; shutdown errors are ignored.
pub async fn relay<A, B>(
    mut client: A,
    mut remote: B,
    idle_timeout: Duration,
    buffer_size: usize,
) -> RelayStats
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let mut client_buf = vec![0u8; buffer_size];
    let mut remote_buf = vec![0u8; buffer_size];
    let mut client_to_remote = 0u64;
    let mut remote_to_client = 0u64;

    let end = loop {
        let ready = tokio::time::timeout(idle_timeout, async {
            tokio::select! {
                r = client.read(&mut client_buf) => Readable::Client(r),
                r = remote.read(&mut remote_buf) => Readable::Remote(r),
            }
        })
        .await;

        match ready {
            Err(_) => {
                debug!("No data for {:?}, closing", idle_timeout);
                break RelayEnd::IdleTimeout;
            }
            Ok(Readable::Client(Ok(0))) => break RelayEnd::ClientClosed,
            Ok(Readable::Remote(Ok(0))) => break RelayEnd::RemoteClosed,
            Ok(Readable::Client(Ok(n))) => {
                if let Err(e) = remote.write_all(&client_buf[..n]).await {
                    debug!("Write to remote failed: {}", e);
                    break RelayEnd::Error;
                }
                client_to_remote += n as u64;
            }
            Ok(Readable::Remote(Ok(n))) => {
                if let Err(e) = client.write_all(&remote_buf[..n]).await {
                    debug!("Write to client failed: {}", e);
                    break RelayEnd::Error;
                }
                remote_to_client += n as u64;
            }
            Ok(Readable::Client(Err(e))) | Ok(Readable::Remote(Err(e)))
                if e.kind() == io::ErrorKind::WouldBlock =>
            {
                continue;
            }
            Ok(Readable::Client(Err(e))) => {
                debug!("Read from client failed: {}", e);
                break RelayEnd::Error;
            }
            Ok(Readable::Remote(Err(e))) => {
                debug!("Read from remote failed: {}", e);
                break RelayEnd::Error;
            }
        }
    };

    let _ = client.shutdown().await;
    let _ = remote.shutdown().await;

    RelayStats {
        client_to_remote,
        remote_to_client,
        end,
    }
}
