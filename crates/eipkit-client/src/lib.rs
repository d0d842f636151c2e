//! Blocking EtherNet/IP explicit-messaging client.
//!
//! A [`Session`] owns one registered encapsulation session over a link and
//! serializes every request/response exchange on it. [`Tag`]s and
//! [`TagGroup`]s issue CIP requests through their session; groups batch them
//! into one Multiple Service Packet.
//!
//! ```no_run
//! use eipkit_client::{ClientConfig, Session};
//!
//! # fn main() -> eipkit_client::Result<()> {
//! let session = Session::connect("192.168.1.10", ClientConfig::default())?;
//! let tags = session.discover_tags()?;
//! if let Some(counter) = tags.get("Counter") {
//!     counter.read()?;
//!     println!("Counter = {}", counter.to_i32()?);
//! }
//! session.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod group;
pub mod identity;
pub mod link;
pub mod notify;
pub mod session;
pub mod tag;

mod batch;

pub use config::ClientConfig;
pub use discovery::SymbolRecord;
pub use error::{ClientError, ErrorKind, Result};
pub use group::TagGroup;
pub use identity::{Identity, ServiceInfo};
pub use link::{Link, StreamLink};
pub use notify::{ChangeHook, TagChange};
pub use session::{ConnectionState, Session};
pub use tag::Tag;
