//! EtherNet/IP encapsulation framing and Command Packet Format codec.
//!
//! Every message on the wire is an encapsulation frame:
//! - A fixed 24-byte little-endian header (command, length, session handle,
//!   status, sender context, options)
//! - A variable body of exactly `length` bytes
//!
//! SendRRData/SendUnitData bodies carry a [`CommonPacket`]: interface handle,
//! timeout, and a Command Packet Format item list.

pub mod command;
pub mod codec;
pub mod cpf;
pub mod cursor;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_frame, decode_message, encode_message, split_frame, EncapsulationHeader,
    EncapsulationMessage, FrameConfig, HEADER_SIZE, MAX_BODY_LEN,
};
pub use command::Command;
pub use cpf::{CommonPacket, Cpf, CpfItem, ItemType};
pub use cursor::{BufExt, Truncated};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::EncapsulationCodec;
