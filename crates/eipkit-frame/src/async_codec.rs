//! `tokio_util` codec for encapsulation frames.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_message, EncapsulationMessage, MAX_BODY_LEN};
use crate::error::{FrameError, Result};

/// Frames an async byte stream into [`EncapsulationMessage`]s.
#[derive(Debug, Clone)]
pub struct EncapsulationCodec {
    max_payload_size: usize,
}

impl EncapsulationCodec {
    pub fn new(max_payload_size: usize) -> Self {
        Self { max_payload_size }
    }
}

impl Default for EncapsulationCodec {
    fn default() -> Self {
        Self::new(MAX_BODY_LEN)
    }
}

impl Decoder for EncapsulationCodec {
    type Item = EncapsulationMessage;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        decode_frame(src, self.max_payload_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<EncapsulationMessage> for EncapsulationCodec {
    type Error = FrameError;

    fn encode(&mut self, item: EncapsulationMessage, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&EncapsulationMessage>>::encode(self, &item, dst)
    }
}

impl<'a> Encoder<&'a EncapsulationMessage> for EncapsulationCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a EncapsulationMessage, dst: &mut BytesMut) -> Result<()> {
        if item.body.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.body.len(),
                max: self.max_payload_size,
            });
        }
        encode_message(item, dst)
    }
}
