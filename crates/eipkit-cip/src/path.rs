//! CIP path segments.
//!
//! A request path is a byte-exact concatenation of segments. Each builder
//! returns the packed form of one segment; [`join`] glues them together.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CipError, Result};

/// Segment type, held in the top three bits of a segment's first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SegmentType {
    Port = 0x00,
    Logical = 0x20,
    Network = 0x40,
    Symbolic = 0x60,
    Data = 0x80,
    DataTypeConstructed = 0xA0,
    DataTypeElementary = 0xC0,
}

/// Logical segment kind, bits 2-4 of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogicalType {
    ClassId = 0 << 2,
    InstanceId = 1 << 2,
    MemberId = 2 << 2,
    ConnectionPoint = 3 << 2,
    AttributeId = 4 << 2,
    Special = 5 << 2,
    ServiceId = 6 << 2,
}

/// Logical value width, bits 0-1 of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogicalWidth {
    U8 = 0,
    U16 = 1,
    U32 = 2,
}

impl LogicalWidth {
    /// The narrowest width that holds `value`.
    pub fn for_value(value: u32) -> Self {
        if value <= u8::MAX as u32 {
            LogicalWidth::U8
        } else if value <= u16::MAX as u32 {
            LogicalWidth::U16
        } else {
            LogicalWidth::U32
        }
    }
}

/// Data segment subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataSubtype {
    Simple = 0x80,
    /// ANSI extended symbol segment.
    Symbol = 0x91,
}

/// Number of 16-bit words needed to hold `bytes`, rounding odd lengths up.
pub fn word_count(bytes: &[u8]) -> usize {
    bytes.len().div_ceil(2)
}

/// Build a logical segment.
///
/// `value` is truncated to `width`. With `padded`, a 16-bit value is preceded
/// by one zero pad byte.
pub fn logical(kind: LogicalType, value: u32, width: LogicalWidth, padded: bool) -> Bytes {
    let mut buf = BytesMut::with_capacity(6);
    buf.put_u8(SegmentType::Logical as u8 | kind as u8 | width as u8);

    if width == LogicalWidth::U16 && padded {
        buf.put_u8(0);
    }

    match width {
        LogicalWidth::U8 => buf.put_u8(value as u8),
        LogicalWidth::U16 => buf.put_u16_le(value as u16),
        LogicalWidth::U32 => buf.put_u32_le(value),
    }
    buf.freeze()
}

/// Padded class + instance path, each at the narrowest width that fits.
///
/// The path must stay word-aligned on the wire, so a 32-bit value also gets
/// its pad byte here.
pub fn logical_address(class: u32, instance: u32) -> Bytes {
    join([
        padded_logical(LogicalType::ClassId, class),
        padded_logical(LogicalType::InstanceId, instance),
    ])
}

fn padded_logical(kind: LogicalType, value: u32) -> Bytes {
    match LogicalWidth::for_value(value) {
        LogicalWidth::U32 => {
            let mut buf = BytesMut::with_capacity(6);
            buf.put_u8(SegmentType::Logical as u8 | kind as u8 | LogicalWidth::U32 as u8);
            buf.put_u8(0);
            buf.put_u32_le(value);
            buf.freeze()
        }
        width => logical(kind, value, width, true),
    }
}

/// Build a port segment.
///
/// Port ids above 14 use the extended form (0x0F marker, id as its own u16).
/// Links longer than one byte set 0x10 and carry a one-byte link size. The
/// segment is padded to an even length.
pub fn port(link: &[u8], port_id: u16) -> Result<Bytes> {
    let extended_link = link.len() > 1;
    let extended_port = port_id > 14;

    if link.len() > u8::MAX as usize {
        return Err(CipError::SegmentTooLong {
            kind: "port",
            len: link.len(),
        });
    }

    let mut first = SegmentType::Port as u8;
    first |= if extended_port { 0x0F } else { port_id as u8 };

    let mut buf = BytesMut::with_capacity(link.len() + 5);
    if extended_link {
        buf.put_u8(first | 0x10);
        buf.put_u8(link.len() as u8);
    } else {
        buf.put_u8(first);
    }

    if extended_port {
        buf.put_u16_le(port_id);
    }

    buf.put_slice(link);
    if buf.len() % 2 == 1 {
        buf.put_u8(0);
    }
    Ok(buf.freeze())
}

/// Build a data segment.
///
/// Simple: subtype, word count, raw bytes. Symbol: subtype, byte length, raw
/// bytes, and a pad byte when the length is odd.
pub fn data(subtype: DataSubtype, raw: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(raw.len() + 3);
    buf.put_u8(subtype as u8);

    match subtype {
        DataSubtype::Simple => {
            let words = word_count(raw);
            if words > u8::MAX as usize {
                return Err(CipError::SegmentTooLong {
                    kind: "simple data",
                    len: raw.len(),
                });
            }
            buf.put_u8(words as u8);
            buf.put_slice(raw);
        }
        DataSubtype::Symbol => {
            if raw.len() > u8::MAX as usize {
                return Err(CipError::SegmentTooLong {
                    kind: "symbol",
                    len: raw.len(),
                });
            }
            buf.put_u8(raw.len() as u8);
            buf.put_slice(raw);
            if raw.len() % 2 == 1 {
                buf.put_u8(0);
            }
        }
    }
    Ok(buf.freeze())
}

/// Concatenate segments, byte for byte.
pub fn join<I>(segments: I) -> Bytes
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut buf = BytesMut::new();
    for segment in segments {
        buf.put_slice(segment.as_ref());
    }
    buf.freeze()
}

/// Symbolic path for a tag name: one Symbol segment per dotted member.
///
/// `Counter` and `Program:Main.Counter` both resolve; an empty member
/// (`a..b`, trailing dot) is rejected.
pub fn symbolic_path(name: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(name.len() + 4);
    for member in name.split(|b| *b == b'.') {
        if member.is_empty() {
            return Err(CipError::InvalidSymbol(
                String::from_utf8_lossy(name).into_owned(),
            ));
        }
        buf.put_slice(&data(DataSubtype::Symbol, member)?);
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_widths() {
        assert_eq!(
            logical(LogicalType::ClassId, 6, LogicalWidth::U8, true).as_ref(),
            &[0x20, 0x06]
        );
        assert_eq!(
            logical(LogicalType::InstanceId, 2, LogicalWidth::U8, false).as_ref(),
            &[0x24, 0x02]
        );
        assert_eq!(
            logical(LogicalType::ClassId, 5, LogicalWidth::U16, true).as_ref(),
            &[0x21, 0x00, 0x05, 0x00]
        );
        assert_eq!(
            logical(LogicalType::ClassId, 5, LogicalWidth::U16, false).as_ref(),
            &[0x21, 0x05, 0x00]
        );
        assert_eq!(
            logical(LogicalType::InstanceId, 0x0102_0304, LogicalWidth::U32, true).as_ref(),
            &[0x26, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn logical_address_picks_width() {
        assert_eq!(logical_address(0x6B, 0).as_ref(), &[0x20, 0x6B, 0x24, 0x00]);
        assert_eq!(
            logical_address(0x6B, 0x1234).as_ref(),
            &[0x20, 0x6B, 0x25, 0x00, 0x34, 0x12]
        );
        assert_eq!(
            logical_address(0x6B, 0x0001_0000).as_ref(),
            &[0x20, 0x6B, 0x26, 0x00, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn port_with_ip_link_is_padded() {
        let got = port(b"130.151.132.1", 2).unwrap();
        let mut want = vec![0x12, 0x0d];
        want.extend_from_slice(b"130.151.132.1");
        want.push(0x00);
        assert_eq!(got.as_ref(), want.as_slice());
    }

    #[test]
    fn port_with_even_link_has_no_pad() {
        let got = port(b"plc.controlnet.org", 3).unwrap();
        let mut want = vec![0x13, 0x12];
        want.extend_from_slice(b"plc.controlnet.org");
        assert_eq!(got.as_ref(), want.as_slice());
    }

    #[test]
    fn port_with_long_links() {
        let got = port(b"130.151.132.55:0x3210", 6).unwrap();
        assert_eq!(&got[..2], &[0x16, 0x15]);
        assert_eq!(got.len(), 24);
        assert_eq!(got[23], 0x00);

        let got = port(b"plc.controlnet.org:9876", 5).unwrap();
        assert_eq!(&got[..2], &[0x15, 0x17]);
        assert_eq!(got.len(), 26);
    }

    #[test]
    fn port_backplane_slot() {
        assert_eq!(port(&[0], 1).unwrap().as_ref(), &[0x01, 0x00]);
        assert_eq!(port(&[3], 1).unwrap().as_ref(), &[0x01, 0x03]);
    }

    #[test]
    fn port_extended_id() {
        assert_eq!(port(&[7], 0x20).unwrap().as_ref(), &[0x0F, 0x20, 0x00, 0x07]);
    }

    #[test]
    fn simple_data_segment() {
        let raw = [1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0, 7, 0];
        let got = data(DataSubtype::Simple, &raw).unwrap();
        assert_eq!(&got[..2], &[0x80, 0x07]);
        assert_eq!(&got[2..], &raw);
    }

    #[test]
    fn symbol_segment_pads_odd_length() {
        assert_eq!(
            data(DataSubtype::Symbol, b"starter").unwrap().as_ref(),
            &[0x91, 0x07, b's', b't', b'a', b'r', b't', b'e', b'r', 0x00]
        );
        assert_eq!(
            data(DataSubtype::Symbol, b"LEN0").unwrap().as_ref(),
            &[0x91, 0x04, b'L', b'E', b'N', b'0']
        );
    }

    #[test]
    fn symbol_segment_length_limit() {
        let err = data(DataSubtype::Symbol, &[b'a'; 256]).unwrap_err();
        assert!(matches!(err, CipError::SegmentTooLong { len: 256, .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn join_is_plain_concatenation() {
        let joined = join([&[0x20u8, 0x02][..], &[][..], &[0x24, 0x01][..]]);
        assert_eq!(joined.as_ref(), &[0x20, 0x02, 0x24, 0x01]);
    }

    #[test]
    fn word_count_rounds_up() {
        assert_eq!(word_count(&[]), 0);
        assert_eq!(word_count(&[0; 3]), 2);
        assert_eq!(word_count(&[0; 4]), 2);
    }

    #[test]
    fn symbolic_path_members() {
        assert_eq!(
            symbolic_path(b"Counter").unwrap(),
            data(DataSubtype::Symbol, b"Counter").unwrap()
        );
        let got = symbolic_path(b"Program:Main.Speed").unwrap();
        let mut want = data(DataSubtype::Symbol, b"Program:Main").unwrap().to_vec();
        want.extend_from_slice(&data(DataSubtype::Symbol, b"Speed").unwrap());
        assert_eq!(got.as_ref(), want.as_slice());

        assert!(matches!(
            symbolic_path(b"a..b"),
            Err(CipError::InvalidSymbol(_))
        ));
    }
}
