use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use eipkit_transport::EipStream;

use crate::codec::{encode_message, EncapsulationMessage, FrameConfig};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete encapsulation frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and write a complete message (blocking).
    pub fn write_message(&mut self, msg: &EncapsulationMessage) -> Result<()> {
        if msg.body.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: msg.body.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_message(msg, &mut self.buf)?;
        let wire = self.buf.split().freeze();
        self.send(&wire)
    }

    /// Write an already-encoded frame in full, then flush.
    ///
    /// Only `Interrupted` is retried. An expired write timeout surfaces as
    /// `WouldBlock` or `TimedOut` and is returned as [`FrameError::Io`].
    pub fn send(&mut self, frame: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < frame.len() {
            match self.inner.write(&frame[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<EipStream> {
    /// Create a frame writer for `EipStream` and apply write timeout from config.
    pub fn with_config_eip(inner: EipStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
