//! Frame layer of the AGV control protocol.
//!
//! Every message on the wire is a 16-byte big-endian header followed by an
//! optional UTF-8 JSON payload:
//! - sync byte `0x5A` and version byte `0x01`
//! - a 2-byte request id (echoed by nothing; replies match by order)
//! - a 4-byte payload length
//! - a 2-byte message type (the opcode)
//! - 6 reserved zero bytes
//!
//! The reader always hands out complete frames and never reads past the
//! declared payload length.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::AgvCodec;
pub use codec::{
    decode_frame, decode_header, encode, encode_frame, Frame, FrameConfig, FrameHeader,
    DEFAULT_MAX_PAYLOAD, HEADER_SIZE, PROTOCOL_VERSION, SYNC_BYTE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
