use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: sync (1) + version (1) + request id (2) + length (4) + type (2) + reserved (6).
pub const HEADER_SIZE: usize = 16;

/// First byte of every frame.
pub const SYNC_BYTE: u8 = 0x5A;

/// Protocol version carried in the second header byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

const RESERVED: [u8; 6] = [0; 6];

/// Decoded fixed header of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Caller-chosen request id. Not used to correlate replies.
    pub request_id: u16,
    /// Exact byte length of the payload that follows.
    pub payload_len: u32,
    /// Opcode selecting the operation.
    pub message_type: u16,
}

/// A complete frame: header fields plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub request_id: u16,
    pub message_type: u16,
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(request_id: u16, message_type: u16, payload: impl Into<Bytes>) -> Self {
        Self {
            request_id,
            message_type,
            payload: payload.into(),
        }
    }

    /// The header this frame encodes to.
    ///
    /// Fails when the payload does not fit the 4-byte length field.
    pub fn header(&self) -> Result<FrameHeader> {
        let payload_len =
            u32::try_from(self.payload.len()).map_err(|_| FrameError::PayloadTooLarge {
                size: self.payload.len(),
                max: u32::MAX as usize,
            })?;
        Ok(FrameHeader {
            request_id: self.request_id,
            payload_len,
            message_type: self.message_type,
        })
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format (all integers big-endian):
/// ```text
/// ┌──────┬─────────┬────────────┬────────────┬─────────┬────────────┬──────────────┐
/// │ 0x5A │ 0x01    │ request id │ length     │ type    │ reserved   │ payload      │
/// │ (1B) │ (1B)    │ (2B)       │ (4B)       │ (2B)    │ (6B, zero) │ (length B)   │
/// └──────┴─────────┴────────────┴────────────┴─────────┴────────────┴──────────────┘
/// ```
pub fn encode_frame(
    request_id: u16,
    message_type: u16,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(SYNC_BYTE);
    dst.put_u8(PROTOCOL_VERSION);
    dst.put_u16(request_id);
    dst.put_u32(payload.len() as u32);
    dst.put_u16(message_type);
    dst.put_slice(&RESERVED);
    dst.put_slice(payload);
    Ok(())
}

/// Encode a frame into a fresh buffer. A missing payload encodes as length 0.
pub fn encode(request_id: u16, message_type: u16, payload: Option<&[u8]>) -> Result<Bytes> {
    let payload = payload.unwrap_or_default();
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame(request_id, message_type, payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode exactly one 16-byte header.
///
/// The slice must be the whole header; partial headers are the reader's
/// concern and are rejected here.
pub fn decode_header(bytes: &[u8]) -> Result<FrameHeader> {
    if bytes.len() != HEADER_SIZE {
        return Err(FrameError::InvalidHeaderLength { len: bytes.len() });
    }
    if bytes[0] != SYNC_BYTE {
        return Err(FrameError::InvalidSync { found: bytes[0] });
    }
    if bytes[1] != PROTOCOL_VERSION {
        return Err(FrameError::UnsupportedVersion { found: bytes[1] });
    }

    let mut cursor = &bytes[2..10];
    let request_id = cursor.get_u16();
    let payload_len = cursor.get_u32();
    let message_type = cursor.get_u16();

    Ok(FrameHeader {
        request_id,
        payload_len,
        message_type,
    })
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let header = decode_header(&src[..HEADER_SIZE])?;
    let payload_len = header.payload_len as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        src.reserve(HEADER_SIZE + payload_len - src.len());
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame {
        request_id: header.request_id,
        message_type: header.message_type,
        payload,
    }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
