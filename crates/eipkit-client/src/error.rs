use eipkit_cip::CipError;
use eipkit_frame::{Command, FrameError};
use eipkit_transport::TransportError;

/// Broad error category, for callers that branch on what went wrong rather
/// than where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A reply was malformed: short buffer, bad options or length, truncation.
    Framing,
    /// A request was rejected before any I/O.
    Validation,
    /// The target answered with a non-zero status.
    ProtocolStatus,
    /// The connection failed.
    Transport,
}

/// Errors returned by sessions, tags and groups.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("cip error: {0}")]
    Cip(#[from] CipError),

    /// The encapsulation header of a reply carried a non-zero status.
    #[error("{command} failed with encapsulation status {status:#010x}")]
    EncapsulationStatus { command: Command, status: u32 },

    /// A reply answered a different command than the one sent.
    #[error("expected {expected} reply, got {actual}")]
    UnexpectedReply { expected: Command, actual: Command },

    /// The session has been closed.
    #[error("session is not connected")]
    NotConnected,

    /// Discovery kept asking for more pages past the configured bound.
    #[error("tag discovery exceeded {pages} pages")]
    DiscoveryLimit { pages: usize },

    /// A "more data" discovery page made no progress.
    #[error("tag discovery stalled at instance {instance}")]
    DiscoveryStalled { instance: u32 },

    /// A value could not be encoded or decoded.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) | ClientError::NotConnected => ErrorKind::Transport,
            ClientError::Frame(err) if err.is_io() => ErrorKind::Transport,
            ClientError::Frame(err) if err.is_validation() => ErrorKind::Validation,
            ClientError::Frame(_) | ClientError::UnexpectedReply { .. } => ErrorKind::Framing,
            ClientError::Cip(err) if err.is_framing() => ErrorKind::Framing,
            ClientError::Cip(err) if err.is_validation() => ErrorKind::Validation,
            ClientError::Cip(_)
            | ClientError::EncapsulationStatus { .. }
            | ClientError::DiscoveryLimit { .. }
            | ClientError::DiscoveryStalled { .. } => ErrorKind::ProtocolStatus,
            ClientError::InvalidValue(_) | ClientError::Config(_) => ErrorKind::Validation,
        }
    }

    /// CIP general status, when the target rejected a service.
    pub fn general_status(&self) -> Option<u8> {
        match self {
            ClientError::Cip(err) => err.general_status(),
            _ => None,
        }
    }

    /// True when the underlying stream timed out.
    pub fn is_timeout(&self) -> bool {
        let io = match self {
            ClientError::Frame(FrameError::Io(io)) | ClientError::Transport(TransportError::Io(io)) => io,
            ClientError::Transport(TransportError::Connect { source, .. }) => source,
            _ => return false,
        };
        matches!(
            io.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        )
    }
}

impl From<eipkit_frame::Truncated> for ClientError {
    fn from(err: eipkit_frame::Truncated) -> Self {
        ClientError::Cip(CipError::Truncated(err))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
