//! Checked little-endian reads over any [`Buf`].
//!
//! `bytes::Buf` panics when a fixed-size read runs past the end. Every decoder
//! in eipkit reads untrusted controller replies, so they go through these
//! helpers, which report the field being read instead.

use bytes::{Buf, Bytes};

/// A read ran past the end of the available bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("truncated {context}: needed {needed} bytes, {available} available")]
pub struct Truncated {
    /// Name of the field being decoded.
    pub context: &'static str,
    pub needed: usize,
    pub available: usize,
}

/// Bounds-checked readers for little-endian protocol fields.
pub trait BufExt: Buf {
    fn ensure(&self, needed: usize, context: &'static str) -> Result<(), Truncated> {
        let available = self.remaining();
        if available < needed {
            return Err(Truncated {
                context,
                needed,
                available,
            });
        }
        Ok(())
    }

    fn take_u8(&mut self, context: &'static str) -> Result<u8, Truncated> {
        self.ensure(1, context)?;
        Ok(self.get_u8())
    }

    fn take_u16_le(&mut self, context: &'static str) -> Result<u16, Truncated> {
        self.ensure(2, context)?;
        Ok(self.get_u16_le())
    }

    fn take_u32_le(&mut self, context: &'static str) -> Result<u32, Truncated> {
        self.ensure(4, context)?;
        Ok(self.get_u32_le())
    }

    fn take_u64_le(&mut self, context: &'static str) -> Result<u64, Truncated> {
        self.ensure(8, context)?;
        Ok(self.get_u64_le())
    }

    /// Big-endian u16, for embedded socket addresses.
    fn take_u16_be(&mut self, context: &'static str) -> Result<u16, Truncated> {
        self.ensure(2, context)?;
        Ok(self.get_u16())
    }

    fn take_u32_be(&mut self, context: &'static str) -> Result<u32, Truncated> {
        self.ensure(4, context)?;
        Ok(self.get_u32())
    }

    fn take_bytes(&mut self, len: usize, context: &'static str) -> Result<Bytes, Truncated> {
        self.ensure(len, context)?;
        Ok(self.copy_to_bytes(len))
    }
}

impl<B: Buf + ?Sized> BufExt for B {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_in_order() {
        let mut buf = Bytes::from_static(&[0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xAA]);
        assert_eq!(buf.take_u8("a").unwrap(), 0x01);
        assert_eq!(buf.take_u16_le("b").unwrap(), 0x1234);
        assert_eq!(buf.take_u32_le("c").unwrap(), 0x1234_5678);
        assert_eq!(buf.take_bytes(1, "d").unwrap().as_ref(), &[0xAA]);
        assert!(!buf.has_remaining());
    }

    #[test]
    fn short_read_reports_context() {
        let mut buf: &[u8] = &[0x01, 0x02, 0x03];
        let err = buf.take_u32_le("session handle").unwrap_err();
        assert_eq!(
            err,
            Truncated {
                context: "session handle",
                needed: 4,
                available: 3,
            }
        );
        // Failed reads consume nothing.
        assert_eq!(buf.len(), 3);
    }
}
