use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::EipStream;

/// Registered EtherNet/IP port (0xAF12), used for both TCP and UDP.
pub const DEFAULT_PORT: u16 = 0xAF12;

/// Resolved endpoints of one remote controller.
///
/// The TCP address carries explicit messaging. The UDP address is resolved up
/// front so broadcast discovery can reuse it; no exchange here sends on it.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    tcp_addr: SocketAddr,
    udp_addr: SocketAddr,
}

impl TcpTransport {
    /// Resolve `host` on the given TCP and UDP ports.
    pub fn resolve(host: &str, tcp_port: u16, udp_port: u16) -> Result<Self> {
        Ok(Self {
            tcp_addr: resolve_tcp(host, tcp_port)?,
            udp_addr: resolve_udp(host, udp_port)?,
        })
    }

    /// Connect to the controller (blocking), with keep-alive enabled.
    pub fn connect(&self, timeout: Duration) -> Result<EipStream> {
        let stream = TcpStream::connect_timeout(&self.tcp_addr, timeout).map_err(|source| {
            TransportError::Connect {
                addr: self.tcp_addr,
                source,
            }
        })?;
        let stream = EipStream::from_tcp(stream);
        stream.set_keepalive(true)?;
        stream.set_nodelay(true)?;
        info!(addr = %self.tcp_addr, "connected to controller");
        Ok(stream)
    }

    /// The TCP endpoint used for explicit messaging.
    pub fn tcp_addr(&self) -> SocketAddr {
        self.tcp_addr
    }

    /// The UDP endpoint reserved for broadcast discovery.
    pub fn udp_addr(&self) -> SocketAddr {
        self.udp_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

/// Resolve `host:port` to the first TCP socket address.
pub fn resolve_tcp(host: &str, port: u16) -> Result<SocketAddr> {
    resolve_first(host, port)
}

/// Resolve `host:port` to the first UDP socket address.
pub fn resolve_udp(host: &str, port: u16) -> Result<SocketAddr> {
    resolve_first(host, port)
}

fn resolve_first(host: &str, port: u16) -> Result<SocketAddr> {
    let label = format!("{host}:{port}");
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: label.clone(),
            source,
        })?;
    let addr = addrs.next().ok_or_else(|| TransportError::Resolve {
        addr: label.clone(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved"),
    })?;
    debug!(%addr, "resolved {label}");
    Ok(addr)
}
