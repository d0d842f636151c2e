//! Service codes and object class ids used by the client.

pub const GET_ATTRIBUTES_ALL: u8 = 0x01;
pub const MULTIPLE_SERVICE_PACKET: u8 = 0x0A;
pub const GET_ATTRIBUTE_SINGLE: u8 = 0x0E;
pub const SET_ATTRIBUTE_SINGLE: u8 = 0x10;
pub const READ_TAG: u8 = 0x4C;
pub const WRITE_TAG: u8 = 0x4D;
pub const FORWARD_OPEN: u8 = 0x4E;
/// Shares its code with Read Tag Fragmented; the target object disambiguates.
pub const UNCONNECTED_SEND: u8 = 0x52;
pub const READ_TAG_FRAGMENTED: u8 = 0x52;
pub const WRITE_TAG_FRAGMENTED: u8 = 0x53;
pub const FORWARD_CLOSE: u8 = 0x54;
pub const GET_INSTANCE_ATTRIBUTE_LIST: u8 = 0x55;
pub const LARGE_FORWARD_OPEN: u8 = 0x5B;

/// Set on the service code of every reply.
pub const REPLY_FLAG: u8 = 0x80;

pub mod class {
    pub const MESSAGE_ROUTER: u32 = 0x02;
    pub const CONNECTION_MANAGER: u32 = 0x06;
    pub const SYMBOL: u32 = 0x6B;
}

/// Name of a request service code, for logs.
pub fn service_name(service: u8) -> &'static str {
    match service & !REPLY_FLAG {
        GET_ATTRIBUTES_ALL => "GetAttributesAll",
        MULTIPLE_SERVICE_PACKET => "MultipleServicePacket",
        GET_ATTRIBUTE_SINGLE => "GetAttributeSingle",
        SET_ATTRIBUTE_SINGLE => "SetAttributeSingle",
        READ_TAG => "ReadTag",
        WRITE_TAG => "WriteTag",
        FORWARD_OPEN => "ForwardOpen",
        UNCONNECTED_SEND => "UnconnectedSend",
        WRITE_TAG_FRAGMENTED => "WriteTagFragmented",
        FORWARD_CLOSE => "ForwardClose",
        GET_INSTANCE_ATTRIBUTE_LIST => "GetInstanceAttributeList",
        LARGE_FORWARD_OPEN => "LargeForwardOpen",
        _ => "Unknown",
    }
}
