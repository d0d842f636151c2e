use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::Result;

/// A connected EtherNet/IP stream. Implements Read + Write.
///
/// Wraps the TCP connection that carries encapsulation messages. Cloning via
/// [`EipStream::try_clone`] yields a second handle on the same socket so the
/// reader and writer halves can be owned separately.
pub struct EipStream {
    inner: TcpStream,
}

impl Read for EipStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for EipStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl EipStream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self::from_tcp(self.inner.try_clone()?))
    }

    /// Address of the remote controller.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Shut down both directions of the connection.
    pub fn shutdown(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Enable TCP keep-alive probes on the connection.
    #[cfg(unix)]
    pub fn set_keepalive(&self, enabled: bool) -> Result<()> {
        use std::os::fd::AsRawFd;

        let fd = self.inner.as_raw_fd();
        let value: libc::c_int = i32::from(enabled);

        // SAFETY: `value` is a valid readable c_int for the provided size and
        // `fd` is an open TCP socket descriptor owned by this stream.
        let rc = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_KEEPALIVE,
                (&value as *const libc::c_int).cast::<libc::c_void>(),
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };

        if rc == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error().into())
        }
    }

    /// Enable TCP keep-alive probes on the connection.
    ///
    /// No-op on platforms without a socket option binding.
    #[cfg(not(unix))]
    pub fn set_keepalive(&self, _enabled: bool) -> Result<()> {
        Ok(())
    }

    /// Disable Nagle's algorithm; request/response traffic is latency bound.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(Into::into)
    }
}

impl std::fmt::Debug for EipStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EipStream")
            .field("peer", &self.inner.peer_addr().ok())
            .finish()
    }
}
