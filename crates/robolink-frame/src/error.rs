/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The first header byte is not the protocol sync byte.
    #[error("invalid sync byte 0x{found:02X} (expected 0x5A)")]
    InvalidSync { found: u8 },

    /// The header carries a protocol version this codec does not speak.
    #[error("unsupported protocol version 0x{found:02X} (expected 0x01)")]
    UnsupportedVersion { found: u8 },

    /// A header slice was not exactly 16 bytes long.
    #[error("frame header must be 16 bytes, got {len}")]
    InvalidHeaderLength { len: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before the requested bytes arrived.
    #[error("connection closed after {received} of {expected} bytes")]
    ConnectionClosed { expected: usize, received: usize },
}

impl FrameError {
    /// True when the bytes on the wire were malformed, as opposed to the stream failing.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidSync { .. }
                | FrameError::UnsupportedVersion { .. }
                | FrameError::InvalidHeaderLength { .. }
                | FrameError::PayloadTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
