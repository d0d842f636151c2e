//! CIP messaging carried inside EtherNet/IP encapsulation.
//!
//! - [`path`]: logical, port and data segment builders
//! - [`message`]: message-router request/response codec
//! - [`multiple`]: Multiple Service Packet aggregation and response splitting
//! - [`envelope`]: Unconnected-Send wrapping and the connected/unconnected CPF
//!   item pairs that carry a request on the wire

pub mod data_type;
pub mod envelope;
pub mod error;
pub mod message;
pub mod multiple;
pub mod path;
pub mod service;
pub mod status;

pub use data_type::TypeCode;
pub use envelope::{connected_cpf, response_from_cpf, unconnected_cpf, unconnected_send, UnconnectedSend};
pub use error::{CipError, Result};
pub use message::{MessageRouterRequest, MessageRouterResponse, STATUS_MORE_DATA};
pub use multiple::{aggregate, pack_responses, split_responses};
pub use path::{
    data, join, logical, logical_address, port, symbolic_path, word_count, DataSubtype,
    LogicalType, LogicalWidth, SegmentType,
};
pub use status::general_status_name;
