//! Putting a router request on the wire.
//!
//! Unconnected requests are wrapped in an Unconnected-Send to the Connection
//! Manager and carried in a UCMM + UnconnectedMessage item pair. Connected
//! requests ride in a ConnectionBased + ConnectedTransportPacket pair
//! prefixed by the connection sequence number.

use bytes::{BufMut, Bytes, BytesMut};
use eipkit_frame::{BufExt, Cpf, CpfItem, ItemType};

use crate::error::{CipError, Result};
use crate::message::{MessageRouterRequest, MessageRouterResponse};
use crate::path::{logical_address, port, word_count};
use crate::service::{class, UNCONNECTED_SEND};

/// Backplane port used for the Unconnected-Send route path.
pub const BACKPLANE_PORT: u16 = 1;

/// Unconnected-Send routing and timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnconnectedSend {
    /// Priority / time-tick byte.
    pub time_tick: u8,
    pub timeout_ticks: u8,
    /// Backplane slot of the target processor.
    pub slot: u8,
}

impl Default for UnconnectedSend {
    fn default() -> Self {
        Self {
            time_tick: 3,
            timeout_ticks: 250,
            slot: 0,
        }
    }
}

/// Wrap `request` in an Unconnected-Send addressed to the Connection Manager.
pub fn unconnected_send(
    request: &MessageRouterRequest,
    params: &UnconnectedSend,
) -> Result<MessageRouterRequest> {
    let message = request.to_bytes()?;
    let route = port(&[params.slot], BACKPLANE_PORT)?;
    let message_len = u16::try_from(message.len()).map_err(|_| CipError::MessageTooLarge {
        size: message.len(),
    })?;

    let mut data = BytesMut::with_capacity(message.len() + route.len() + 8);
    data.put_u8(params.time_tick);
    data.put_u8(params.timeout_ticks);
    data.put_u16_le(message_len);
    data.put_slice(&message);
    if message.len() % 2 == 1 {
        data.put_u8(0);
    }
    data.put_u8(word_count(&route) as u8);
    data.put_u8(0);
    data.put_slice(&route);

    Ok(MessageRouterRequest::new(
        UNCONNECTED_SEND,
        logical_address(class::CONNECTION_MANAGER, 1),
        data.freeze(),
    ))
}

/// Empty UCMM address item + the encoded request.
pub fn unconnected_cpf(request: &MessageRouterRequest) -> Result<Cpf> {
    Ok(Cpf::new(vec![
        CpfItem::empty(ItemType::UCMM),
        CpfItem::new(ItemType::UNCONNECTED_MESSAGE, request.to_bytes()?),
    ]))
}

/// Connection id item + sequence-prefixed encoded request.
pub fn connected_cpf(
    connection_id: u32,
    sequence: u16,
    request: &MessageRouterRequest,
) -> Result<Cpf> {
    let mut packet = BytesMut::with_capacity(2 + request.encoded_len());
    packet.put_u16_le(sequence);
    request.encode(&mut packet)?;

    Ok(Cpf::new(vec![
        CpfItem::new(ItemType::CONNECTION_BASED, connection_id.to_le_bytes().to_vec()),
        CpfItem::new(ItemType::CONNECTED_TRANSPORT_PACKET, packet.freeze()),
    ]))
}

/// Decode the router response carried in item 1 of a reply.
///
/// Connected replies carry the 16-bit sequence number first; it is skipped.
pub fn response_from_cpf(cpf: &Cpf, connected: bool) -> Result<MessageRouterResponse> {
    let item = cpf.item(1).ok_or(CipError::MissingItem { index: 1 })?;
    let mut data: Bytes = item.data.clone();
    if connected {
        data.take_u16_le("sequence number")?;
    }
    MessageRouterResponse::decode(data)
}
