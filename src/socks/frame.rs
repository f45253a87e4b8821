//! Frame I/O on the control connection
//!
//! Bridges the pure decoders in [`super::codec`] and the client stream.

use crate::error::{DecodeError, SocksdError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read exactly one frame from `stream`
///
/// The decoder runs on the bytes received so far. Each
/// [`DecodeError::Truncated`] tops the buffer up to the reported length,
/// so no byte past the end of the frame is consumed.
pub async fn read_frame<S, T, F>(stream: &mut S, max_len: usize, decode: F) -> Result<T, SocksdError>
where
    S: AsyncRead + Unpin,
    F: Fn(&[u8]) -> Result<T, DecodeError>,
{
    let mut buf = Vec::with_capacity(64);

    loop {
        match decode(&buf) {
            Ok(frame) => return Ok(frame),
            Err(DecodeError::Truncated { needed }) if needed > buf.len() && needed <= max_len => {
                let filled = buf.len();
                buf.resize(needed, 0);
                stream.read_exact(&mut buf[filled..]).await?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Write a complete frame and flush it
pub async fn write_frame<S>(stream: &mut S, frame: &[u8]) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(frame).await?;
    stream.flush().await
}
