//! ListIdentity and ListServices reply items.

use std::net::{Ipv4Addr, SocketAddrV4};

use bytes::Bytes;
use eipkit_frame::{BufExt, CpfItem, ItemType};
use serde::Serialize;

use crate::error::Result;

/// One ListIdentity item.
///
/// The embedded socket address is in network byte order; every other field
/// is little-endian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    #[serde(skip)]
    pub item_type: ItemType,
    pub protocol_version: u16,
    pub socket_family: i16,
    pub socket_addr: SocketAddrV4,
    pub vendor_id: u16,
    pub device_type: u16,
    pub product_code: u16,
    pub revision_major: u8,
    pub revision_minor: u8,
    pub status: u16,
    pub serial_number: u32,
    pub product_name: String,
    pub state: u8,
}

impl Identity {
    pub fn decode(item: &CpfItem) -> Result<Self> {
        let mut src: Bytes = item.data.clone();
        let protocol_version = src.take_u16_le("protocol version")?;
        let socket_family = src.take_u16_be("sin_family")? as i16;
        let port = src.take_u16_be("sin_port")?;
        let addr = Ipv4Addr::from(src.take_u32_be("sin_addr")?);
        src.take_bytes(8, "sin_zero")?;
        let vendor_id = src.take_u16_le("vendor id")?;
        let device_type = src.take_u16_le("device type")?;
        let product_code = src.take_u16_le("product code")?;
        let revision_major = src.take_u8("major revision")?;
        let revision_minor = src.take_u8("minor revision")?;
        let status = src.take_u16_le("status")?;
        let serial_number = src.take_u32_le("serial number")?;
        let name_len = src.take_u8("product name length")?;
        let name = src.take_bytes(name_len as usize, "product name")?;
        let state = src.take_u8("state")?;

        Ok(Self {
            item_type: item.type_id,
            protocol_version,
            socket_family,
            socket_addr: SocketAddrV4::new(addr, port),
            vendor_id,
            device_type,
            product_code,
            revision_major,
            revision_minor,
            status,
            serial_number,
            product_name: String::from_utf8_lossy(&name).into_owned(),
            state,
        })
    }

    /// `major.minor`
    pub fn revision(&self) -> String {
        format!("{}.{}", self.revision_major, self.revision_minor)
    }
}

/// One ListServices item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    #[serde(skip)]
    pub item_type: ItemType,
    pub version: u16,
    pub capability_flags: u16,
    /// Service name with trailing NULs removed.
    pub name: String,
}

impl ServiceInfo {
    /// Bit 5: supports CIP encapsulation over TCP.
    pub const CAPABILITY_TCP: u16 = 1 << 5;
    /// Bit 8: supports CIP class 0/1 UDP transports.
    pub const CAPABILITY_UDP: u16 = 1 << 8;

    pub fn decode(item: &CpfItem) -> Result<Self> {
        let mut src: Bytes = item.data.clone();
        let version = src.take_u16_le("service version")?;
        let capability_flags = src.take_u16_le("capability flags")?;
        let raw = src.take_bytes(16, "service name")?;
        let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
        Ok(Self {
            item_type: item.type_id,
            version,
            capability_flags,
            name: String::from_utf8_lossy(&raw[..end]).into_owned(),
        })
    }

    pub fn supports_tcp(&self) -> bool {
        self.capability_flags & Self::CAPABILITY_TCP != 0
    }
}

#[cfg(test)]
pub(crate) fn identity_item(name: &str) -> CpfItem {
    use bytes::BufMut;

    let mut data = bytes::BytesMut::new();
    data.put_u16_le(1);
    data.put_i16(2);
    data.put_u16(44818);
    data.put_u32(u32::from(Ipv4Addr::new(192, 168, 1, 10)));
    data.put_bytes(0, 8);
    data.put_u16_le(1);
    data.put_u16_le(0x0E);
    data.put_u16_le(0x0036);
    data.put_u8(20);
    data.put_u8(11);
    data.put_u16_le(0x3060);
    data.put_u32_le(0x00C0_FFEE);
    data.put_u8(name.len() as u8);
    data.put_slice(name.as_bytes());
    data.put_u8(3);
    CpfItem::new(ItemType::LIST_IDENTITY_RESPONSE, data.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_identity() {
        let identity = Identity::decode(&identity_item("1756-L83E/B")).unwrap();
        assert_eq!(identity.item_type, ItemType::LIST_IDENTITY_RESPONSE);
        assert_eq!(identity.protocol_version, 1);
        assert_eq!(identity.socket_family, 2);
        assert_eq!(
            identity.socket_addr,
            SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 10), 44818)
        );
        assert_eq!(identity.vendor_id, 1);
        assert_eq!(identity.device_type, 0x0E);
        assert_eq!(identity.product_code, 0x36);
        assert_eq!(identity.revision(), "20.11");
        assert_eq!(identity.status, 0x3060);
        assert_eq!(identity.serial_number, 0x00C0_FFEE);
        assert_eq!(identity.product_name, "1756-L83E/B");
        assert_eq!(identity.state, 3);
    }

    #[test]
    fn truncated_identity() {
        let mut item = identity_item("PLC");
        item.data = item.data.slice(..item.data.len() - 1);
        let err = Identity::decode(&item).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Framing);
    }

    #[test]
    fn decode_service() {
        let mut data = vec![0x01, 0x00, 0x20, 0x01];
        let mut name = [0u8; 16];
        name[..14].copy_from_slice(b"Communications");
        data.extend_from_slice(&name);

        let info = ServiceInfo::decode(&CpfItem::new(ItemType::LIST_SERVICES_RESPONSE, data)).unwrap();
        assert_eq!(info.version, 1);
        assert_eq!(info.capability_flags, 0x0120);
        assert!(info.supports_tcp());
        assert_eq!(info.name, "Communications");
    }
}
