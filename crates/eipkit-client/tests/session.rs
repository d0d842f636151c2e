mod support;

use std::io;
use std::thread;
use std::time::Duration;

use eipkit_client::identity::Identity;
use eipkit_client::{ClientConfig, ClientError, ErrorKind, Session, Tag, TagGroup};
use eipkit_frame::{Command, CommonPacket, CpfItem, ItemType};
use support::{record, split_request, symbol, Target, SESSION_HANDLE};

#[test]
fn register_then_close() {
    let target = Target::default();
    let session = target.session(ClientConfig::default());
    assert_eq!(session.session_handle(), SESSION_HANDLE);

    session.close().unwrap();
    assert!(!session.is_open());

    let state = target.state();
    assert_eq!(state.frames.len(), 2);
    assert_eq!(state.frames[0].header.command, Command::REGISTER_SESSION);
    assert_eq!(state.frames[0].header.session_handle, 0);
    assert_eq!(state.frames[0].body.as_ref(), &[0x01, 0x00, 0x00, 0x00]);
    assert_eq!(state.frames[1].header.command, Command::UNREGISTER_SESSION);
    assert_eq!(state.frames[1].header.session_handle, SESSION_HANDLE);
}

#[test]
fn requests_after_close_fail_without_io() {
    let target = Target::default().with_tag("Counter", 0xC4, &[1, 0, 0, 0]);
    let session = target.session(ClientConfig::default());
    let tag = Tag::new(&session, "Counter", 1);
    session.close().unwrap();

    let err = tag.read().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(target.frame_count(), 2);
}

#[test]
fn unconnected_route_uses_configured_slot() {
    let target = Target::default().with_tag("Counter", 0xC4, &[1, 0, 0, 0]);
    let config = ClientConfig {
        slot: 3,
        timeout_ticks: 100,
        ..ClientConfig::default()
    };
    let session = target.session(config);
    Tag::new(&session, "Counter", 1).read().unwrap();

    let state = target.state();
    assert_eq!(state.routes[0].as_ref(), &[0x01, 0x03]);

    let frame = &state.frames[1];
    assert_eq!(frame.header.command, Command::SEND_RR_DATA);
    assert_eq!(frame.header.session_handle, SESSION_HANDLE);
    let packet = CommonPacket::decode(frame.body.clone()).unwrap();
    assert_eq!(packet.interface_handle, 0);
    assert_eq!(packet.timeout, 100);
    let wrapped = &packet.packet.items[1].data;
    assert_eq!(&wrapped[6..8], &[3, 100]);
}

#[test]
fn sender_context_is_fresh_per_message() {
    let target = Target::default().with_tag("Counter", 0xC4, &[1, 0, 0, 0]);
    let session = target.session(ClientConfig::default());
    let tag = Tag::new(&session, "Counter", 1);
    tag.read().unwrap();
    tag.read().unwrap();

    let state = target.state();
    let contexts: Vec<u64> = state.frames.iter().map(|f| f.header.sender_context).collect();
    // 64 random bits; a collision here means the context is not regenerated.
    assert_ne!(contexts[1], contexts[2]);
}

#[test]
fn list_identity_decodes_items() {
    let target = Target::default();
    let mut data = vec![0x01, 0x00];
    data.extend_from_slice(&[0x00, 0x02, 0xAF, 0x12, 10, 0, 0, 5]);
    data.extend_from_slice(&[0; 8]);
    data.extend_from_slice(&[0x01, 0x00, 0x0E, 0x00, 0x36, 0x00, 32, 11]);
    data.extend_from_slice(&[0x60, 0x30, 0x78, 0x56, 0x34, 0x12]);
    data.push(3);
    data.extend_from_slice(b"PLC");
    data.push(3);
    target.state().identity_items = vec![CpfItem::new(ItemType::LIST_IDENTITY_RESPONSE, data)];

    let session = Session::new(target.clone(), ClientConfig::default());
    let identities: Vec<Identity> = session.list_identity().unwrap();
    assert_eq!(identities.len(), 1);
    let id = &identities[0];
    assert_eq!(id.socket_addr.to_string(), "10.0.0.5:44818");
    assert_eq!(id.vendor_id, 1);
    assert_eq!(id.revision(), "32.11");
    assert_eq!(id.serial_number, 0x1234_5678);
    assert_eq!(id.product_name, "PLC");

    let frame = &target.state().frames[0];
    assert_eq!(frame.header.command, Command::LIST_IDENTITY);
    assert_eq!(frame.header.session_handle, 0);
    assert!(frame.body.is_empty());
}

#[test]
fn read_timeout_drops_link_so_late_reply_is_never_misrouted() {
    let target = Target::default()
        .with_tag("Alpha", 0xC4, &[0x11, 0, 0, 0])
        .with_tag("Beta", 0xC4, &[0x22, 0, 0, 0]);
    let session = target.session(ClientConfig::default());
    let alpha = Tag::new(&session, "Alpha", 1);
    let beta = Tag::new(&session, "Beta", 1);

    target.state().fail_next_receive = true;
    let err = alpha.read().unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!session.is_open());

    // Alpha's reply is still queued on the target side; nothing may read it.
    assert!(matches!(beta.read(), Err(ClientError::NotConnected)));
    assert!(beta.value().is_empty());
    assert_eq!(target.frame_count(), 2);
}

#[test]
fn write_timeout_drops_link() {
    let target = Target::default().with_tag("Speed", 0xC4, &[0, 0, 0, 0]);
    let session = target.session(ClientConfig::default());
    let tag = Tag::new(&session, "Speed", 1);
    tag.set_i32(5);

    target.state().fail_next_send = Some(io::ErrorKind::WouldBlock);
    let err = tag.write().unwrap_err();
    assert!(err.is_timeout());
    assert!(!session.is_open());
    assert_eq!(tag.pending_or_value_i32().unwrap(), 5);

    assert!(matches!(tag.read(), Err(ClientError::NotConnected)));
    // Only RegisterSession reached the target.
    assert_eq!(target.frame_count(), 1);
}

#[test]
fn close_after_failed_exchange_sends_nothing() {
    let target = Target::default().with_tag("Speed", 0xC4, &[0, 0, 0, 0]);
    let session = target.session(ClientConfig::default());
    target.state().fail_next_receive = true;
    assert!(Tag::new(&session, "Speed", 1).read().is_err());

    session.close().unwrap();
    assert!(!session.is_open());
    assert_eq!(target.frame_count(), 2);
}

#[test]
fn status_failure_keeps_session_usable() {
    let target = Target::default().with_tag("Speed", 0xC4, &[3, 0, 0, 0]);
    let session = target.session(ClientConfig::default());

    let err = Tag::new(&session, "Missing", 1).read().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolStatus);
    assert!(session.is_open());

    let tag = Tag::new(&session, "Speed", 1);
    tag.read().unwrap();
    assert_eq!(tag.to_i32().unwrap(), 3);
}

#[test]
fn one_exchange_in_flight_across_threads() {
    let mut target = Target::default().with_tag("Solo", 0xC4, &7i32.to_le_bytes());
    let mut page = Vec::new();
    for i in 0..4u32 {
        let name = format!("Member{i}");
        target = target.with_tag(&name, 0xC4, &[0, 0, 0, 0]);
        page.extend(record(i + 1, &name, 0xC4, [0, 0, 0]));
    }
    target.state().pages.push_back((0, page));

    let session = target.session(ClientConfig::default());
    let group = TagGroup::new(&session);
    for tag in session.discover_tags().unwrap().values() {
        assert!(group.add(tag));
    }
    target.state().receive_delay = Some(Duration::from_millis(1));
    let before = target.request_count();

    thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(|| {
                for _ in 0..20 {
                    let solo = Tag::new(&session, "Solo", 1);
                    solo.read().unwrap();
                    assert_eq!(solo.to_i32().unwrap(), 7);
                }
            });
        }
        scope.spawn(|| {
            for round in 0..20 {
                for (i, tag) in group.tags().iter().enumerate() {
                    tag.set_i32(round * 10 + i as i32);
                }
                group.write().unwrap();
            }
        });
        scope.spawn(|| {
            for _ in 0..20 {
                group.read().unwrap();
            }
        });
    });

    let state = target.state();
    assert_eq!(state.overlaps, 0);

    // Every request arrived whole: batches stay batches, solo reads stay solo.
    let requests = &state.requests[before..];
    let batches = requests.iter().filter(|r| r[0] == 0x0A).count();
    let solo = requests
        .iter()
        .filter(|r| {
            let (service, path, _) = split_request(r);
            service == 0x4C && symbol(&path) == "Solo"
        })
        .count();
    assert_eq!(batches, 40);
    assert_eq!(solo, 60);
    assert_eq!(requests.len(), 100);

    for (i, tag) in group.tags().iter().enumerate() {
        assert_eq!(state.tags[&tag.name()].1, (190 + i as i32).to_le_bytes().to_vec());
    }
}
