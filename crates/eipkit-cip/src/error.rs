use eipkit_frame::Truncated;

use crate::status::general_status_name;

/// Errors raised while building or decoding CIP messages.
#[derive(Debug, thiserror::Error)]
pub enum CipError {
    /// A response field ran past the end of its buffer.
    #[error(transparent)]
    Truncated(#[from] Truncated),

    /// A Multiple Service Packet offset points outside the response data.
    #[error("sub-response {index} offset {offset} outside response data ({len} bytes)")]
    OffsetOutOfRange {
        index: usize,
        offset: usize,
        len: usize,
    },

    /// A Multiple Service Packet reply carries a different number of
    /// sub-responses than requests were sent.
    #[error("expected {expected} sub-responses, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// A CPF item the reply must carry is missing.
    #[error("reply is missing CPF item {index}")]
    MissingItem { index: usize },

    /// The target answered with a non-zero general status.
    #[error("service {service:#04x} failed: {} ({status:#04x})", status_label(.status))]
    Status {
        service: u8,
        status: u8,
        additional: Vec<u16>,
    },

    /// A request path does not fit the one-byte word count.
    #[error("request path too long ({words} words, max 255)")]
    PathTooLong { words: usize },

    /// A segment payload does not fit its one-byte length field.
    #[error("{kind} segment too long ({len} bytes)")]
    SegmentTooLong { kind: &'static str, len: usize },

    /// A symbolic tag name contains an empty member.
    #[error("invalid symbolic name {0:?}")]
    InvalidSymbol(String),

    /// An embedded request does not fit its 16-bit length field.
    #[error("embedded request too large ({size} bytes)")]
    MessageTooLarge { size: usize },

    /// A batch with no requests, or one whose offsets overflow 16 bits.
    #[error("cannot aggregate {count} requests ({size} bytes)")]
    InvalidBatch { count: usize, size: usize },
}

impl CipError {
    /// True for malformed replies.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            CipError::Truncated(_)
                | CipError::OffsetOutOfRange { .. }
                | CipError::CountMismatch { .. }
                | CipError::MissingItem { .. }
        )
    }

    /// True for requests rejected before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CipError::PathTooLong { .. }
                | CipError::SegmentTooLong { .. }
                | CipError::InvalidSymbol(_)
                | CipError::InvalidBatch { .. }
                | CipError::MessageTooLarge { .. }
        )
    }

    /// The general status of a [`CipError::Status`].
    pub fn general_status(&self) -> Option<u8> {
        match self {
            CipError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn status_label(status: &u8) -> &'static str {
    general_status_name(*status)
}

pub type Result<T> = std::result::Result<T, CipError>;
