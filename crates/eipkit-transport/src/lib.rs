//! TCP byte-stream transport for EtherNet/IP explicit messaging.
//!
//! This is the lowest layer of eipkit: a connect-once TCP stream with
//! keep-alive enabled, plus resolution of the companion UDP address used for
//! broadcast discovery. Everything above it only needs `Read + Write`.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::EipStream;
pub use tcp::{resolve_tcp, resolve_udp, TcpTransport, DEFAULT_PORT};
