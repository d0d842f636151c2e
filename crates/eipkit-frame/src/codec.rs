use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::command::Command;
use crate::cursor::BufExt;
use crate::error::{FrameError, Result};

/// Encapsulation header: command (2) + length (2) + session (4) + status (4)
/// + sender context (8) + options (4) = 24 bytes.
pub const HEADER_SIZE: usize = 24;

/// Largest body a single encapsulation message may carry.
pub const MAX_BODY_LEN: usize = 65511;

/// The fixed encapsulation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncapsulationHeader {
    pub command: Command,
    /// Byte count of the body that follows the header.
    pub length: u16,
    /// Session handle, 0 until RegisterSession succeeds.
    pub session_handle: u32,
    /// Encapsulation status, 0 = success.
    pub status: u32,
    /// Caller-chosen correlation token echoed by the target.
    pub sender_context: u64,
    /// Must be zero.
    pub options: u32,
}

/// An encapsulation header plus its opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulationMessage {
    pub header: EncapsulationHeader,
    pub body: Bytes,
}

impl EncapsulationMessage {
    /// Create a message; the header length is taken from `body`.
    pub fn new(
        command: Command,
        session_handle: u32,
        sender_context: u64,
        body: impl Into<Bytes>,
    ) -> Self {
        let body = body.into();
        Self {
            header: EncapsulationHeader {
                command,
                length: body.len().min(u16::MAX as usize) as u16,
                session_handle,
                status: 0,
                sender_context,
                options: 0,
            },
            body,
        }
    }

    /// The total wire size of this message (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_message(self, &mut dst)?;
        Ok(dst.freeze())
    }
}

/// Encode a message into the wire format.
///
/// Wire format (all fields little-endian):
/// ```text
/// ┌─────────┬────────┬─────────┬────────┬─────────┬─────────┬──────────────┐
/// │ Command │ Length │ Session │ Status │ Context │ Options │ Body         │
/// │ (2B)    │ (2B)   │ (4B)    │ (4B)   │ (8B)    │ (4B)    │ (Length B)   │
/// └─────────┴────────┴─────────┴────────┴─────────┴─────────┴──────────────┘
/// ```
///
/// The length field is always written from the body itself.
pub fn encode_message(msg: &EncapsulationMessage, dst: &mut BytesMut) -> Result<()> {
    if msg.body.len() > MAX_BODY_LEN {
        return Err(FrameError::BodyTooLarge {
            size: msg.body.len(),
            max: MAX_BODY_LEN,
        });
    }
    if !msg.header.command.is_supported() {
        return Err(FrameError::UnsupportedCommand(msg.header.command.0));
    }

    let header = &msg.header;
    dst.reserve(msg.wire_size());
    dst.put_u16_le(header.command.0);
    dst.put_u16_le(msg.body.len() as u16);
    dst.put_u32_le(header.session_handle);
    dst.put_u32_le(header.status);
    dst.put_u64_le(header.sender_context);
    dst.put_u32_le(header.options);
    dst.put_slice(&msg.body);
    Ok(())
}

/// Decode exactly one message from `src`.
///
/// `src` must hold one whole frame: a short buffer, non-zero options, or a
/// length field that disagrees with the remaining byte count is rejected.
/// Unknown command codes are accepted here.
pub fn decode_message(src: impl Into<Bytes>) -> Result<EncapsulationMessage> {
    let mut src: Bytes = src.into();
    if src.len() < HEADER_SIZE {
        return Err(FrameError::TooShort { len: src.len() });
    }

    let header = EncapsulationHeader {
        command: Command(src.take_u16_le("command")?),
        length: src.take_u16_le("length")?,
        session_handle: src.take_u32_le("session handle")?,
        status: src.take_u32_le("status")?,
        sender_context: src.take_u64_le("sender context")?,
        options: src.take_u32_le("options")?,
    };

    if header.options != 0 {
        return Err(FrameError::NonZeroOptions(header.options));
    }

    if header.length as usize != src.remaining() {
        return Err(FrameError::LengthMismatch {
            declared: header.length as usize,
            actual: src.remaining(),
        });
    }

    Ok(EncapsulationMessage { header, body: src })
}

/// Split one complete raw frame off the front of a stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn split_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let body_len = u16::from_le_bytes([src[2], src[3]]) as usize;
    if body_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: body_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + body_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    Ok(Some(src.split_to(total).freeze()))
}

/// Decode a frame from a stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<EncapsulationMessage>> {
    match split_frame(src, max_payload)? {
        Some(raw) => decode_message(raw).map(Some),
        None => Ok(None),
    }
}

/// Configuration for the frame reader/writer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum body size in bytes. Default: [`MAX_BODY_LEN`].
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_BODY_LEN,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
