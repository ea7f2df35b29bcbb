use std::io::{ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::codec::{decode_header, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// Only the bytes of the current frame are consumed from the stream, so the
/// next frame starts exactly where this one ended.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read precisely `n` bytes (blocking).
    ///
    /// Loops over short reads. EOF before `n` bytes is
    /// `Err(FrameError::ConnectionClosed)`.
    pub fn read_exact(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(n);
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while buf.len() < n {
            let want = (n - buf.len()).min(READ_CHUNK_SIZE);
            let read = match self.inner.read(&mut chunk[..want]) {
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed {
                    expected: n,
                    received: buf.len(),
                });
            }

            buf.put_slice(&chunk[..read]);
        }

        Ok(buf.freeze())
    }

    /// Read the next complete frame (blocking).
    ///
    /// Reads the 16-byte header, then exactly the declared payload length.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let header_bytes = self.read_exact(HEADER_SIZE)?;
        let header = decode_header(&header_bytes)?;

        let payload_len = header.payload_len as usize;
        if payload_len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload_len,
                max: self.config.max_payload_size,
            });
        }

        let payload = self.read_exact(payload_len)?;
        trace!(
            request_id = header.request_id,
            message_type = header.message_type,
            payload_len,
            "frame read"
        );

        Ok(Frame {
            request_id: header.request_id,
            message_type: header.message_type,
            payload,
        })
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
