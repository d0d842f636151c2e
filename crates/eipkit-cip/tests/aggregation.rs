use bytes::{Buf, Bytes};
use eipkit_cip::{
    aggregate, pack_responses, split_responses, symbolic_path, MessageRouterRequest,
    MessageRouterResponse,
};

/// Answers one encoded request the way a target would answer it alone:
/// echo the path back as data, failing requests that address `Missing`.
fn solo_target(request: &[u8]) -> MessageRouterResponse {
    let service = request[0];
    let path_len = request[1] as usize * 2;
    let path = &request[2..2 + path_len];
    if path.windows(7).any(|w| w == b"Missing") {
        return MessageRouterResponse::new(service, 0x05, Bytes::new());
    }
    MessageRouterResponse::new(service, 0, path.to_vec())
}

/// Target side of a Multiple Service Packet: slice each request out by its
/// offset and answer it alone.
fn batch_target(data: &Bytes) -> Bytes {
    let mut cursor = data.clone();
    let count = cursor.get_u16_le() as usize;
    let offsets: Vec<usize> = (0..count).map(|_| cursor.get_u16_le() as usize).collect();
    let replies: Vec<MessageRouterResponse> = offsets
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = offsets.get(i + 1).copied().unwrap_or(data.len());
            solo_target(&data[start..end])
        })
        .collect();
    pack_responses(&replies).unwrap()
}

fn read(name: &str) -> MessageRouterRequest {
    MessageRouterRequest::new(0x4C, symbolic_path(name.as_bytes()).unwrap(), vec![0x01, 0x00])
}

#[test]
fn aggregated_replies_match_solo_replies() {
    let requests: Vec<MessageRouterRequest> = ["A", "Speed", "Missing", "Program:Main.Counter", "Z9"]
        .into_iter()
        .map(read)
        .collect();

    let solo: Vec<MessageRouterResponse> = requests
        .iter()
        .map(|r| solo_target(&r.to_bytes().unwrap()))
        .collect();

    let batch = aggregate(requests.clone()).unwrap();
    let reply = batch_target(&batch.data);
    let split = split_responses(&reply, requests.len()).unwrap();

    assert_eq!(split, solo);
    assert_eq!(split[2].general_status, 0x05);
}

#[test]
fn two_request_batch() {
    let requests = vec![read("LEN"), read("DATA")];
    let batch = aggregate(requests.clone()).unwrap();
    let split = split_responses(&batch_target(&batch.data), 2).unwrap();
    assert_eq!(split.len(), 2);
    assert_eq!(split[0].data, symbolic_path(b"LEN").unwrap());
    assert_eq!(split[1].data, symbolic_path(b"DATA").unwrap());
}
