//! Message-router request and reply encoding, plus Multiple Service Packet packing.

use bytes::{BufMut, Bytes, BytesMut};
use eipkit_frame::BufExt;

use crate::error::{CipError, Result};
use crate::path::word_count;
use crate::service::REPLY_FLAG;

/// General status meaning "more data, continue from the last returned instance".
pub const STATUS_MORE_DATA: u8 = 0x60;

/// A CIP service invocation addressed by a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRouterRequest {
    pub service: u8,
    /// Path size in 16-bit words; 0 means "derive from `path`".
    pub path_size: u8,
    pub path: Bytes,
    pub data: Bytes,
}

impl MessageRouterRequest {
    pub fn new(service: u8, path: impl Into<Bytes>, data: impl Into<Bytes>) -> Self {
        Self {
            service,
            path_size: 0,
            path: path.into(),
            data: data.into(),
        }
    }

    fn path_words(&self) -> Result<u8> {
        if self.path_size != 0 {
            return Ok(self.path_size);
        }
        let words = word_count(&self.path);
        u8::try_from(words).map_err(|_| CipError::PathTooLong { words })
    }

    pub fn encoded_len(&self) -> usize {
        2 + self.path.len() + self.data.len()
    }

    /// Write `{service, path words, path, data}`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let words = self.path_words()?;
        dst.reserve(self.encoded_len());
        dst.put_u8(self.service);
        dst.put_u8(words);
        dst.put_slice(&self.path);
        dst.put_slice(&self.data);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut dst)?;
        Ok(dst.freeze())
    }
}

/// The reply to one [`MessageRouterRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRouterResponse {
    pub reply_service: u8,
    pub reserved: u8,
    pub general_status: u8,
    /// Additional status size in 16-bit words.
    pub additional_size: u8,
    pub additional_status: Bytes,
    pub data: Bytes,
}

impl MessageRouterResponse {
    /// A reply to `service` with no additional status.
    pub fn new(service: u8, general_status: u8, data: impl Into<Bytes>) -> Self {
        Self {
            reply_service: service | REPLY_FLAG,
            reserved: 0,
            general_status,
            additional_size: 0,
            additional_status: Bytes::new(),
            data: data.into(),
        }
    }

    pub fn decode(src: impl Into<Bytes>) -> Result<Self> {
        let mut src: Bytes = src.into();
        let reply_service = src.take_u8("reply service")?;
        let reserved = src.take_u8("reserved")?;
        let general_status = src.take_u8("general status")?;
        let additional_size = src.take_u8("additional status size")?;
        let additional_status = src.take_bytes(additional_size as usize * 2, "additional status")?;
        Ok(Self {
            reply_service,
            reserved,
            general_status,
            additional_size,
            additional_status,
            data: src,
        })
    }

    pub fn encoded_len(&self) -> usize {
        4 + self.additional_status.len() + self.data.len()
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_u8(self.reply_service);
        dst.put_u8(self.reserved);
        dst.put_u8(self.general_status);
        dst.put_u8(self.additional_size);
        dst.put_slice(&self.additional_status);
        dst.put_slice(&self.data);
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut dst);
        dst.freeze()
    }

    /// The request service this reply answers.
    pub fn service(&self) -> u8 {
        self.reply_service & !REPLY_FLAG
    }

    pub fn is_success(&self) -> bool {
        self.general_status == 0
    }

    /// True for the pagination sentinel status.
    pub fn has_more(&self) -> bool {
        self.general_status == STATUS_MORE_DATA
    }

    /// Additional status words, little-endian.
    pub fn additional_words(&self) -> Vec<u16> {
        self.additional_status
            .chunks_exact(2)
            .map(|w| u16::from_le_bytes([w[0], w[1]]))
            .collect()
    }

    /// The error for this reply's general status.
    pub fn status_error(&self) -> CipError {
        CipError::Status {
            service: self.service(),
            status: self.general_status,
            additional: self.additional_words(),
        }
    }

    /// Pass through a successful reply, turn any other status into an error.
    pub fn check_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.status_error())
        }
    }
}
