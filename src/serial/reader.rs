//! Trait abstraction for the GPS character stream to enable testing

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{LoggerError, Result};

/// Trait for sources of raw NMEA text
#[async_trait]
pub trait NmeaSource: Send {
    /// Waits for the next chunk of characters, exactly as read
    ///
    /// Chunks carry no framing: a sentence may be split across two chunks.
    /// Returns `Ok(None)` at end of stream. Must be cancel safe.
    async fn next_chunk(&mut self) -> Result<Option<String>>;
}

/// Reads raw chunks from any async byte stream (normally the GPS serial port)
pub struct ChunkReader<R> {
    reader: R,
    buffer: BytesMut,
    chunk_size: usize,
}

impl<R: AsyncRead + Unpin + Send> ChunkReader<R> {
    /// # Arguments
    ///
    /// * `reader` - Byte stream to read from
    /// * `chunk_size` - Maximum bytes per chunk
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(chunk_size),
            chunk_size,
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> NmeaSource for ChunkReader<R> {
    async fn next_chunk(&mut self) -> Result<Option<String>> {
        self.buffer.clear();
        self.buffer.reserve(self.chunk_size);

        let read = self
            .reader
            .read_buf(&mut self.buffer)
            .await
            .map_err(|e| LoggerError::Serial(format!("Failed to read GPS data: {}", e)))?;

        if read == 0 {
            return Ok(None);
        }

        // NMEA is ASCII; line noise must not abort decoding
        Ok(Some(String::from_utf8_lossy(&self.buffer).into_owned()))
    }
}
