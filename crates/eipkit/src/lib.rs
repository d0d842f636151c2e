//! EtherNet/IP explicit messaging for controller tags.
//!
//! eipkit talks to a controller over a registered encapsulation session:
//! it discovers the symbol table, reads and writes tags, and batches tag
//! groups into Multiple Service Packets.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP stream and address resolution
//! - [`frame`]: encapsulation framing and the Command Packet Format
//! - [`cip`]: path segments, message-router codec, request aggregation
//! - [`client`]: sessions, tags and tag groups

/// Re-export transport types.
pub mod transport {
    pub use eipkit_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use eipkit_frame::*;
}

/// Re-export CIP messaging types.
pub mod cip {
    pub use eipkit_cip::*;
}

/// Re-export client types.
pub mod client {
    pub use eipkit_client::*;
}

pub use eipkit_client::{ClientConfig, ClientError, ErrorKind, Result, Session, Tag, TagGroup};
