//! Command Packet Format: the typed item list carried in SendRRData and
//! SendUnitData bodies.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::cursor::BufExt;
use crate::error::Result;

/// A CPF item type id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ItemType(pub u16);

impl ItemType {
    /// Null address item used by unconnected messages.
    pub const UCMM: ItemType = ItemType(0x0000);
    pub const LIST_IDENTITY_RESPONSE: ItemType = ItemType(0x000C);
    /// Connected address item carrying the connection id.
    pub const CONNECTION_BASED: ItemType = ItemType(0x00A1);
    pub const CONNECTED_TRANSPORT_PACKET: ItemType = ItemType(0x00B1);
    pub const UNCONNECTED_MESSAGE: ItemType = ItemType(0x00B2);
    pub const LIST_SERVICES_RESPONSE: ItemType = ItemType(0x0100);
    pub const SOCKADDR_INFO_O_T: ItemType = ItemType(0x8000);
    pub const SOCKADDR_INFO_T_O: ItemType = ItemType(0x8001);
    pub const SEQUENCED_ADDRESS: ItemType = ItemType(0x8002);

    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            ItemType::UCMM => "UCMM",
            ItemType::LIST_IDENTITY_RESPONSE => "ListIdentityResponse",
            ItemType::CONNECTION_BASED => "ConnectionBased",
            ItemType::CONNECTED_TRANSPORT_PACKET => "ConnectedTransportPacket",
            ItemType::UNCONNECTED_MESSAGE => "UnconnectedMessage",
            ItemType::LIST_SERVICES_RESPONSE => "ListServicesResponse",
            ItemType::SOCKADDR_INFO_O_T => "SockaddrInfoOToT",
            ItemType::SOCKADDR_INFO_T_O => "SockaddrInfoTToO",
            ItemType::SEQUENCED_ADDRESS => "SequencedAddress",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "ItemType({:#06x})", self.0),
        }
    }
}

/// One typed, length-prefixed CPF item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpfItem {
    pub type_id: ItemType,
    /// Data length as received. Encoding always writes `data.len()`.
    pub length: u16,
    pub data: Bytes,
}

impl CpfItem {
    pub fn new(type_id: ItemType, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            type_id,
            length: data.len() as u16,
            data,
        }
    }

    /// An item with no data (e.g. the UCMM null address item).
    pub fn empty(type_id: ItemType) -> Self {
        Self::new(type_id, Bytes::new())
    }

    pub fn encoded_len(&self) -> usize {
        4 + self.data.len()
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_u16_le(self.type_id.0);
        dst.put_u16_le(self.data.len() as u16);
        dst.put_slice(&self.data);
    }

    /// Decode one item; reads exactly `length` data bytes.
    pub fn decode(src: &mut Bytes) -> Result<Self> {
        let type_id = ItemType(src.take_u16_le("cpf item type")?);
        let length = src.take_u16_le("cpf item length")?;
        let data = src.take_bytes(length as usize, "cpf item data")?;
        Ok(Self {
            type_id,
            length,
            data,
        })
    }
}

/// An ordered CPF item list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cpf {
    /// Item count; 0 means "derive from `items`" when encoding.
    pub item_count: u16,
    pub items: Vec<CpfItem>,
}

impl Cpf {
    pub fn new(items: Vec<CpfItem>) -> Self {
        Self {
            item_count: items.len() as u16,
            items,
        }
    }

    /// Borrow the item at `index`.
    pub fn item(&self, index: usize) -> Option<&CpfItem> {
        self.items.get(index)
    }

    pub fn encoded_len(&self) -> usize {
        2 + self.items.iter().map(CpfItem::encoded_len).sum::<usize>()
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        let count = if self.item_count == 0 {
            self.items.len() as u16
        } else {
            self.item_count
        };
        dst.reserve(self.encoded_len());
        dst.put_u16_le(count);
        for item in &self.items {
            item.encode(dst);
        }
    }

    /// Decode the item count, then exactly that many items in order.
    pub fn decode(src: &mut Bytes) -> Result<Self> {
        let item_count = src.take_u16_le("cpf item count")?;
        let mut items = Vec::with_capacity(item_count as usize);
        for _ in 0..item_count {
            items.push(CpfItem::decode(src)?);
        }
        Ok(Self { item_count, items })
    }
}

/// The SendRRData / SendUnitData body: interface handle, timeout, CPF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonPacket {
    /// Always 0 for CIP.
    pub interface_handle: u32,
    /// Request timeout in seconds; 0 for SendUnitData.
    pub timeout: u16,
    pub packet: Cpf,
}

impl CommonPacket {
    pub fn new(timeout: u16, packet: Cpf) -> Self {
        Self {
            interface_handle: 0,
            timeout,
            packet,
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(6 + self.packet.encoded_len());
        dst.put_u32_le(self.interface_handle);
        dst.put_u16_le(self.timeout);
        self.packet.encode(&mut dst);
        dst.freeze()
    }

    pub fn decode(src: impl Into<Bytes>) -> Result<Self> {
        let mut src: Bytes = src.into();
        let interface_handle = src.take_u32_le("interface handle")?;
        let timeout = src.take_u16_le("timeout")?;
        let packet = Cpf::decode(&mut src)?;
        Ok(Self {
            interface_handle,
            timeout,
            packet,
        })
    }
}
