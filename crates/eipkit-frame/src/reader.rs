use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use eipkit_transport::EipStream;

use crate::codec::{decode_message, split_frame, EncapsulationMessage, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete encapsulation frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get whole frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the raw bytes of the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame_bytes(&mut self) -> Result<Bytes> {
        loop {
            if let Some(frame) = split_frame(&mut self.buf, self.config.max_payload_size)? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read and decode the next complete frame (blocking).
    pub fn read_frame(&mut self) -> Result<EncapsulationMessage> {
        let raw = self.read_frame_bytes()?;
        decode_message(raw)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<EipStream> {
    /// Create a frame reader for `EipStream` and apply read timeout from config.
    pub fn with_config_eip(inner: EipStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: eipkit_transport::TransportError) -> FrameError {
    match err {
        eipkit_transport::TransportError::Io(io) => FrameError::Io(io),
        eipkit_transport::TransportError::Resolve { source, .. }
        | eipkit_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        eipkit_transport::TransportError::Shutdown => FrameError::ConnectionClosed,
    }
}
