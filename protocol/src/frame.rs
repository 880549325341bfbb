use tokio::io::{AsyncRead, AsyncReadExt};

use crate::MAX_FRAME;
use crate::error::FrameError;

const READ_CHUNK: usize = 4096;

/// Pulls newline-delimited frames off an `AsyncRead`, merging partial
/// reads the way the original C server merges partial `read(2)`s in
/// `read_wrapper` (spec §4.1): bytes past the newline from one read are
/// retained and prepended to the next frame.
pub struct FrameReader<R> {
    stream: R,
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            pending: Vec::new(),
        }
    }

    /// Returns the next frame, newline included, or `None` on a clean
    /// end of stream (no bytes pending). A newline-less frame beyond
    /// `MAX_FRAME` bytes, or an EOF with a partial frame pending, is an
    /// error and the caller must close the connection.
    pub async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let frame = self.pending.drain(..=pos).collect();
                return Ok(Some(frame));
            }

            if self.pending.len() >= MAX_FRAME {
                return Err(FrameError::TooLarge(MAX_FRAME));
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await?;

            if n == 0 {
                return if self.pending.is_empty() {
                    Ok(None)
                } else {
                    Err(FrameError::TruncatedEof)
                };
            }

            self.pending.extend_from_slice(&chunk[..n]);
        }
    }
}
