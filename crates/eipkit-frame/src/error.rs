use crate::codec::HEADER_SIZE;
use crate::cursor::Truncated;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than one encapsulation header.
    #[error("frame too short ({len} bytes, header is {HEADER_SIZE})")]
    TooShort { len: usize },

    /// The header `options` field must be zero.
    #[error("frame has non-zero options ({0:#010x})")]
    NonZeroOptions(u32),

    /// The header `length` field disagrees with the bytes that follow it.
    #[error("frame length mismatch (header says {declared}, body has {actual})")]
    LengthMismatch { declared: usize, actual: usize },

    /// A length-prefixed field ran past the end of the buffer.
    #[error(transparent)]
    Truncated(#[from] Truncated),

    /// The body exceeds what a single encapsulation message may carry.
    #[error("body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: usize, max: usize },

    /// The command code is not one of the recognized encapsulation commands.
    #[error("unsupported encapsulation command {0:#06x}")]
    UnsupportedCommand(u16),

    /// An incoming frame declares more payload than the reader accepts.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// True for errors raised while encoding, before any byte is written.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FrameError::BodyTooLarge { .. } | FrameError::UnsupportedCommand(_)
        )
    }

    /// True for errors that come from the stream rather than the bytes on it.
    pub fn is_io(&self) -> bool {
        matches!(self, FrameError::Io(_) | FrameError::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
