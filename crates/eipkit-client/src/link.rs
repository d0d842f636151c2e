//! The byte pipe a [`Session`](crate::Session) exchanges frames over.

use std::io::{Read, Write};

use bytes::Bytes;
use eipkit_frame::{FrameReader, FrameWriter};
use eipkit_transport::{EipStream, TcpTransport};

use crate::config::ClientConfig;
use crate::error::Result;

/// A duplex frame link.
///
/// `send` writes one whole encoded frame; `receive` blocks for one whole
/// frame (header plus declared body). Dropping the link closes it.
pub trait Link: Send {
    fn send(&mut self, frame: &[u8]) -> Result<()>;
    fn receive(&mut self) -> Result<Bytes>;
}

/// A [`Link`] over any blocking reader/writer pair.
pub struct StreamLink<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl<R: Read, W: Write> StreamLink<R, W> {
    pub fn new(reader: FrameReader<R>, writer: FrameWriter<W>) -> Self {
        Self { reader, writer }
    }

    pub fn reader(&self) -> &FrameReader<R> {
        &self.reader
    }

    pub fn writer(&self) -> &FrameWriter<W> {
        &self.writer
    }
}

impl StreamLink<EipStream, EipStream> {
    /// Connect to the resolved TCP endpoint, with keep-alive and timeouts
    /// from `config`.
    pub fn connect(transport: &TcpTransport, config: &ClientConfig) -> Result<Self> {
        let stream = transport.connect(config.connect_timeout)?;
        let reader_stream = stream.try_clone()?;

        let frame_config = config.frame_config();
        let reader = FrameReader::with_config_eip(reader_stream, frame_config.clone())?;
        let writer = FrameWriter::with_config_eip(stream, frame_config)?;
        Ok(Self::new(reader, writer))
    }
}

impl<R, W> Link for StreamLink<R, W>
where
    R: Read + Send,
    W: Write + Send,
{
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.writer.send(frame)?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Bytes> {
        Ok(self.reader.read_frame_bytes()?)
    }
}
