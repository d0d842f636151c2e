//! Symbol table discovery.
//!
//! Get-Instance-Attribute-List on the Symbol class returns the controller's
//! tags a page at a time. A page ending with status 0x60 means more remain;
//! the next request starts at the last instance id seen, so the boundary
//! symbol comes back twice and the later copy wins.

use std::collections::BTreeMap;

use bytes::Bytes;
use eipkit_cip::service::{class, GET_INSTANCE_ATTRIBUTE_LIST};
use eipkit_cip::{logical_address, MessageRouterRequest, TypeCode};
use eipkit_frame::BufExt;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::session::Session;
use crate::tag::Tag;

/// Attribute list: count 3, then symbol name (1), symbol type (2), and
/// array dimensions (8).
const SYMBOL_ATTRIBUTES: [u8; 8] = [0x03, 0x00, 0x01, 0x00, 0x02, 0x00, 0x08, 0x00];

/// One symbol as listed by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub instance_id: u32,
    pub name: Bytes,
    pub type_code: TypeCode,
    pub dims: [u32; 3],
}

impl SymbolRecord {
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    fn decode(src: &mut Bytes) -> Result<Self> {
        let instance_id = src.take_u32_le("symbol instance")?;
        let name_len = src.take_u16_le("symbol name length")?;
        let name = src.take_bytes(name_len as usize, "symbol name")?;
        let type_code = TypeCode(src.take_u16_le("symbol type")?);
        let mut dims = [0u32; 3];
        for dim in &mut dims {
            *dim = src.take_u32_le("symbol dimension")?;
        }
        Ok(Self {
            instance_id,
            name,
            type_code,
            dims,
        })
    }
}

/// The list request for the page starting at `start`.
pub fn symbol_list_request(start: u32) -> MessageRouterRequest {
    MessageRouterRequest::new(
        GET_INSTANCE_ATTRIBUTE_LIST,
        logical_address(class::SYMBOL, start),
        Bytes::from_static(&SYMBOL_ATTRIBUTES),
    )
}

/// Decode every record in one page of reply data.
pub fn parse_symbols(data: &Bytes) -> Result<Vec<SymbolRecord>> {
    let mut src = data.clone();
    let mut records = Vec::new();
    while !src.is_empty() {
        records.push(SymbolRecord::decode(&mut src)?);
    }
    Ok(records)
}

impl Session {
    /// List every controller tag, keyed by name.
    ///
    /// Follows "more data" pages up to `max_discovery_pages`. A page that
    /// asks for more without advancing past its start instance is an error.
    pub fn discover_tags(&self) -> Result<BTreeMap<String, Tag>> {
        let limit = self.config().max_discovery_pages;
        let mut tags = BTreeMap::new();
        let mut start = 0u32;
        let mut pages = 0usize;

        loop {
            if pages == limit {
                return Err(ClientError::DiscoveryLimit { pages: limit });
            }
            pages += 1;

            let reply = self.send(&symbol_list_request(start))?;
            if !reply.is_success() && !reply.has_more() {
                return Err(reply.status_error().into());
            }

            let records = parse_symbols(&reply.data)?;
            let last = records.last().map(|r| r.instance_id);
            debug!(page = pages, start, records = records.len(), more = reply.has_more(), "symbol page");
            for record in records {
                tags.insert(record.name(), Tag::from_record(self, record));
            }

            if !reply.has_more() {
                break;
            }
            match last {
                Some(id) if pages == 1 || id != start => start = id,
                _ => return Err(ClientError::DiscoveryStalled { instance: start }),
            }
        }

        info!(tags = tags.len(), pages, "tag discovery complete");
        Ok(tags)
    }
}

#[cfg(test)]
pub(crate) fn encode_record(instance_id: u32, name: &str, type_code: u16, dims: [u32; 3]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&instance_id.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&type_code.to_le_bytes());
    for dim in dims {
        out.extend_from_slice(&dim.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout() {
        let req = symbol_list_request(0);
        assert_eq!(req.service, 0x55);
        assert_eq!(req.path.as_ref(), &[0x20, 0x6B, 0x24, 0x00]);
        assert_eq!(req.data.as_ref(), &SYMBOL_ATTRIBUTES);

        // Instance ids past one byte keep their full width.
        let req = symbol_list_request(0x0001_2345);
        assert_eq!(
            req.path.as_ref(),
            &[0x20, 0x6B, 0x26, 0x00, 0x45, 0x23, 0x01, 0x00]
        );
    }

    #[test]
    fn parse_page_records() {
        let mut page = encode_record(1, "Counter", 0xC4, [0, 0, 0]);
        page.extend(encode_record(0x2A, "Recipe", 0x8FCE, [0, 0, 0]));
        page.extend(encode_record(0x2B, "Levels", 0x20CA, [16, 0, 0]));

        let records = parse_symbols(&Bytes::from(page)).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name(), "Counter");
        assert_eq!(records[0].type_code, TypeCode::DINT);
        assert_eq!(records[1].instance_id, 0x2A);
        assert!(records[1].type_code.is_struct());
        assert_eq!(records[2].dims, [16, 0, 0]);
    }

    #[test]
    fn truncated_record_is_framing_error() {
        let mut page = encode_record(1, "Counter", 0xC4, [0, 0, 0]);
        page.truncate(page.len() - 2);
        let err = parse_symbols(&Bytes::from(page)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Framing);
    }

    #[test]
    fn empty_page() {
        assert!(parse_symbols(&Bytes::new()).unwrap().is_empty());
    }
}
