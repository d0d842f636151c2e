//! Multiple Service Packet: several router requests in one exchange.
//!
//! Request data layout:
//! ```text
//! count (u16) | offset[0..count] (u16 each) | request 0 | request 1 | ...
//! ```
//! Offsets are measured from the start of the count field, so
//! `offset[0] = 2 * (count + 1)`. Replies use the same layout.

use bytes::{BufMut, Bytes, BytesMut};
use eipkit_frame::BufExt;

use crate::error::{CipError, Result};
use crate::message::{MessageRouterRequest, MessageRouterResponse};
use crate::path::logical_address;
use crate::service::{class, MULTIPLE_SERVICE_PACKET};

/// Bundle `requests` into one Multiple Service Packet request.
///
/// A single request is returned unchanged.
pub fn aggregate(mut requests: Vec<MessageRouterRequest>) -> Result<MessageRouterRequest> {
    if requests.len() == 1 {
        return Ok(requests.remove(0));
    }

    let encoded = requests
        .iter()
        .map(MessageRouterRequest::to_bytes)
        .collect::<Result<Vec<_>>>()?;

    let data = pack(&encoded)?;
    tracing::trace!(count = encoded.len(), size = data.len(), "aggregated requests");
    Ok(MessageRouterRequest::new(
        MULTIPLE_SERVICE_PACKET,
        logical_address(class::MESSAGE_ROUTER, 1),
        data,
    ))
}

/// Pack replies the way a target answers a Multiple Service Packet.
pub fn pack_responses(responses: &[MessageRouterResponse]) -> Result<Bytes> {
    let encoded: Vec<Bytes> = responses.iter().map(MessageRouterResponse::to_bytes).collect();
    pack(&encoded)
}

fn pack(parts: &[Bytes]) -> Result<Bytes> {
    let count = parts.len();
    let body: usize = parts.iter().map(Bytes::len).sum();
    let header = 2 * (count + 1);
    let total = header + body;

    // The last part may end past u16::MAX; only its start offset must fit.
    let last_start = total - parts.last().map_or(0, Bytes::len);
    if count == 0 || count > u16::MAX as usize || last_start > u16::MAX as usize {
        return Err(CipError::InvalidBatch { count, size: total });
    }

    let mut buf = BytesMut::with_capacity(total);
    buf.put_u16_le(count as u16);

    let mut offset = header;
    buf.put_u16_le(offset as u16);
    for part in &parts[..count - 1] {
        offset += part.len();
        buf.put_u16_le(offset as u16);
    }

    for part in parts {
        buf.put_slice(part);
    }
    Ok(buf.freeze())
}

/// Split a Multiple Service Packet reply into its sub-responses.
///
/// `expected` is the number of requests that were aggregated; a reply with a
/// different count is rejected before any sub-response is decoded.
pub fn split_responses(data: &Bytes, expected: usize) -> Result<Vec<MessageRouterResponse>> {
    let mut cursor = data.clone();
    let count = cursor.take_u16_le("service count")? as usize;
    if count != expected {
        return Err(CipError::CountMismatch {
            expected,
            actual: count,
        });
    }

    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(cursor.take_u16_le("service offset")? as usize);
    }

    let table_end = 2 * (count + 1);
    let mut responses = Vec::with_capacity(count);
    for (index, &start) in offsets.iter().enumerate() {
        let end = offsets.get(index + 1).copied().unwrap_or(data.len());
        if start < table_end || start > end || end > data.len() {
            return Err(CipError::OffsetOutOfRange {
                index,
                offset: start,
                len: data.len(),
            });
        }
        responses.push(MessageRouterResponse::decode(data.slice(start..end))?);
    }
    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{data as data_segment, DataSubtype};
    use crate::service::READ_TAG;

    fn read(name: &[u8]) -> MessageRouterRequest {
        MessageRouterRequest::new(
            READ_TAG,
            data_segment(DataSubtype::Symbol, name).unwrap(),
            vec![0x01, 0x00],
        )
    }

    #[test]
    fn single_request_passes_through() {
        let req = read(b"A");
        assert_eq!(aggregate(vec![req.clone()]).unwrap(), req);
    }

    #[test]
    fn empty_batch_rejected() {
        let err = aggregate(Vec::new()).unwrap_err();
        assert!(matches!(err, CipError::InvalidBatch { count: 0, .. }));
    }

    #[test]
    fn offset_table_layout() {
        let a = read(b"A");
        let b = read(b"BB");
        let c = read(b"CCC");
        let (la, lb) = (a.encoded_len(), b.encoded_len());

        let msp = aggregate(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(msp.service, MULTIPLE_SERVICE_PACKET);
        assert_eq!(msp.path.as_ref(), &[0x20, 0x02, 0x24, 0x01]);

        let d = &msp.data;
        assert_eq!(u16::from_le_bytes([d[0], d[1]]), 3);
        assert_eq!(u16::from_le_bytes([d[2], d[3]]) as usize, 8);
        assert_eq!(u16::from_le_bytes([d[4], d[5]]) as usize, 8 + la);
        assert_eq!(u16::from_le_bytes([d[6], d[7]]) as usize, 8 + la + lb);

        let mut body = a.to_bytes().unwrap().to_vec();
        body.extend_from_slice(&b.to_bytes().unwrap());
        body.extend_from_slice(&c.to_bytes().unwrap());
        assert_eq!(&d[8..], body.as_slice());
    }

    #[test]
    fn split_routes_by_order() {
        let replies = vec![
            MessageRouterResponse::new(READ_TAG, 0, vec![0xC4, 0x00, 1, 0, 0, 0]),
            MessageRouterResponse::new(READ_TAG, 0x04, Bytes::new()),
            MessageRouterResponse::new(READ_TAG, 0, vec![0xC3, 0x00, 7, 0]),
        ];
        let packed = pack_responses(&replies).unwrap();
        let split = split_responses(&packed, 3).unwrap();
        assert_eq!(split, replies);
    }

    #[test]
    fn count_mismatch_is_framing_failure() {
        let packed = pack_responses(&[
            MessageRouterResponse::new(READ_TAG, 0, Bytes::new()),
            MessageRouterResponse::new(READ_TAG, 0, Bytes::new()),
        ])
        .unwrap();
        let err = split_responses(&packed, 3).unwrap_err();
        assert!(matches!(err, CipError::CountMismatch { expected: 3, actual: 2 }));
        assert!(err.is_framing());
    }

    #[test]
    fn offset_past_end_rejected() {
        // count 2, offsets 6 and 40, 4 bytes of reply.
        let raw = Bytes::from_static(&[0x02, 0x00, 0x06, 0x00, 0x28, 0x00, 0xCC, 0x00, 0x00, 0x00]);
        let err = split_responses(&raw, 2).unwrap_err();
        assert!(matches!(err, CipError::OffsetOutOfRange { index: 0, .. }));
    }

    #[test]
    fn offset_inside_table_rejected() {
        let raw = Bytes::from_static(&[0x01, 0x00, 0x02, 0x00, 0xCC, 0x00, 0x00, 0x00]);
        let err = split_responses(&raw, 1).unwrap_err();
        assert!(matches!(err, CipError::OffsetOutOfRange { offset: 2, .. }));
    }
}
