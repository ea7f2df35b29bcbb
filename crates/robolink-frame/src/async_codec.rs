use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD};
use crate::error::FrameError;

/// `tokio_util` codec for the AGV frame format.
///
/// Lets async callers drive a socket with `Framed`. The blocking client
/// never uses it.
#[derive(Debug, Clone)]
pub struct AgvCodec {
    max_payload_size: usize,
}

impl AgvCodec {
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self::with_max_payload(config.max_payload_size)
    }
}

impl Default for AgvCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for AgvCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_frame(src, self.max_payload_size)
    }
}

impl Encoder<Frame> for AgvCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        if item.payload.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload.len(),
                max: self.max_payload_size,
            });
        }
        encode_frame(item.request_id, item.message_type, &item.payload, dst)
    }
}
