//! An in-memory controller for driving a `Session` without a network.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use eipkit_cip::{pack_responses, MessageRouterResponse};
use eipkit_client::{ClientConfig, ClientError, Link, Session};
use eipkit_frame::{
    decode_message, Command, CommonPacket, Cpf, CpfItem, EncapsulationMessage, FrameError,
    ItemType,
};

pub const SESSION_HANDLE: u32 = 0x0A0B_0C0D;

#[derive(Default)]
pub struct State {
    /// Every frame received, decoded.
    pub frames: Vec<EncapsulationMessage>,
    /// Every router request received, after Unconnected-Send unwrapping.
    pub requests: Vec<Bytes>,
    /// Unconnected-Send route paths seen.
    pub routes: Vec<Bytes>,
    /// name -> (type word, value bytes)
    pub tags: HashMap<String, (u16, Vec<u8>)>,
    /// Structured writes by member name, in arrival order.
    pub member_writes: Vec<(String, Vec<u8>)>,
    /// Symbol list pages: (general status, record bytes).
    pub pages: VecDeque<(u8, Vec<u8>)>,
    /// Start instance of every symbol list request.
    pub page_starts: Vec<u32>,
    /// Replace the service count of Multiple Service Packet replies.
    pub batch_count_override: Option<u16>,
    /// Tags that reject writes.
    pub read_only: Vec<String>,
    pub identity_items: Vec<CpfItem>,
    /// Fail the next send with this I/O error kind, before the target sees it.
    pub fail_next_send: Option<io::ErrorKind>,
    /// Fail the next receive with a read timeout; the reply stays queued.
    pub fail_next_receive: bool,
    /// Pause before each receive, widening the window between request and
    /// reply.
    pub receive_delay: Option<Duration>,
    /// Requests that arrived while an earlier one was still unanswered.
    pub overlaps: usize,
    awaiting_reply: bool,
    outbox: VecDeque<Bytes>,
}

#[derive(Clone, Default)]
pub struct Target {
    state: Arc<Mutex<State>>,
}

impl Target {
    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_tag(self, name: &str, type_word: u16, value: &[u8]) -> Self {
        self.state()
            .tags
            .insert(name.to_string(), (type_word, value.to_vec()));
        self
    }

    pub fn with_page(self, status: u8, records: Vec<u8>) -> Self {
        self.state().pages.push_back((status, records));
        self
    }

    /// A registered session over this target.
    pub fn session(&self, config: ClientConfig) -> Session {
        let session = Session::new(self.clone(), config);
        session.register().unwrap();
        session
    }

    pub fn frame_count(&self) -> usize {
        self.state().frames.len()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }
}

impl Link for Target {
    fn send(&mut self, frame: &[u8]) -> eipkit_client::Result<()> {
        let msg = decode_message(Bytes::copy_from_slice(frame))?;
        let mut state = self.state();
        if let Some(kind) = state.fail_next_send.take() {
            return Err(ClientError::Frame(FrameError::Io(io::Error::from(kind))));
        }
        if state.awaiting_reply {
            state.overlaps += 1;
        }
        state.awaiting_reply = msg.header.command != Command::NOP;
        state.frames.push(msg.clone());

        let reply_body = match msg.header.command {
            Command::REGISTER_SESSION => Some(msg.body.clone()),
            Command::SEND_RR_DATA => Some(state.answer_rr_data(&msg.body)),
            Command::LIST_IDENTITY => {
                let cpf = Cpf::new(state.identity_items.clone());
                let mut body = bytes::BytesMut::new();
                cpf.encode(&mut body);
                Some(body.freeze())
            }
            // The target drops the connection on UnRegisterSession and never
            // answers a NOP.
            _ => None,
        };
        if let Some(body) = reply_body {
            let reply = EncapsulationMessage::new(msg.header.command, SESSION_HANDLE, msg.header.sender_context, body);
            state.outbox.push_back(reply.to_bytes()?);
        }
        Ok(())
    }

    fn receive(&mut self) -> eipkit_client::Result<Bytes> {
        let delay = self.state().receive_delay;
        if let Some(delay) = delay {
            thread::sleep(delay);
        }

        let mut state = self.state();
        state.awaiting_reply = false;
        if std::mem::take(&mut state.fail_next_receive) {
            return Err(ClientError::Frame(FrameError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "read timed out",
            ))));
        }
        state
            .outbox
            .pop_front()
            .ok_or(ClientError::Frame(FrameError::ConnectionClosed))
    }
}

impl State {
    fn answer_rr_data(&mut self, body: &Bytes) -> Bytes {
        let packet = CommonPacket::decode(body.clone()).unwrap();
        let wrapped = &packet.packet.items[1].data;
        let (service, path, data) = split_request(wrapped);
        assert_eq!(service, 0x52, "requests arrive in an Unconnected-Send");
        assert_eq!(path, [0x20, 0x06, 0x24, 0x01]);

        let len = u16::from_le_bytes([data[2], data[3]]) as usize;
        let message = Bytes::copy_from_slice(&data[4..4 + len]);
        let route_at = 4 + len + len % 2;
        let route_words = data[route_at] as usize;
        self.routes
            .push(Bytes::copy_from_slice(&data[route_at + 2..route_at + 2 + route_words * 2]));

        self.requests.push(message.clone());
        let reply = self.answer(&message);

        CommonPacket::new(
            0,
            Cpf::new(vec![
                CpfItem::empty(ItemType::UCMM),
                CpfItem::new(ItemType::UNCONNECTED_MESSAGE, reply.to_bytes()),
            ]),
        )
        .to_bytes()
    }

    fn answer(&mut self, request: &[u8]) -> MessageRouterResponse {
        let (service, path, data) = split_request(request);
        match service {
            0x0A => self.answer_batch(&data),
            0x4C => match self.tags.get(&symbol(&path)) {
                Some((type_word, value)) => {
                    let mut out = type_word.to_le_bytes().to_vec();
                    if *type_word & 0x8000 != 0 {
                        out = vec![0xA0, 0x02];
                        out.extend_from_slice(&(*type_word & 0x0FFF).to_le_bytes());
                    }
                    out.extend_from_slice(value);
                    MessageRouterResponse::new(service, 0, out)
                }
                None => MessageRouterResponse::new(service, 0x04, Bytes::new()),
            },
            0x4D => {
                let name = symbol(&path);
                if path.starts_with(&[0x20, 0x6B]) {
                    self.member_writes.push((name, data));
                } else if self.read_only.contains(&name) {
                    return MessageRouterResponse::new(service, 0x0F, Bytes::new());
                } else {
                    let type_word = u16::from_le_bytes([data[0], data[1]]);
                    self.tags.insert(name, (type_word, data[4..].to_vec()));
                }
                MessageRouterResponse::new(service, 0, Bytes::new())
            }
            0x55 => {
                self.page_starts.push(instance(&path));
                let (status, records) = self.pages.pop_front().unwrap_or((0, Vec::new()));
                MessageRouterResponse::new(service, status, records)
            }
            _ => MessageRouterResponse::new(service, 0x08, Bytes::new()),
        }
    }

    fn answer_batch(&mut self, data: &[u8]) -> MessageRouterResponse {
        let count = u16::from_le_bytes([data[0], data[1]]) as usize;
        let offsets: Vec<usize> = (0..count)
            .map(|i| u16::from_le_bytes([data[2 + 2 * i], data[3 + 2 * i]]) as usize)
            .collect();
        let replies: Vec<MessageRouterResponse> = offsets
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = offsets.get(i + 1).copied().unwrap_or(data.len());
                self.answer(&data[start..end])
            })
            .collect();

        let status = if replies.iter().all(|r| r.general_status == 0) { 0 } else { 0x1E };
        let mut packed = pack_responses(&replies).unwrap().to_vec();
        if let Some(count) = self.batch_count_override {
            packed[..2].copy_from_slice(&count.to_le_bytes());
        }
        MessageRouterResponse::new(0x0A, status, packed)
    }
}

/// (service, path, data) of an encoded router request.
pub fn split_request(raw: &[u8]) -> (u8, Vec<u8>, Vec<u8>) {
    let words = raw[1] as usize;
    (raw[0], raw[2..2 + words * 2].to_vec(), raw[2 + words * 2..].to_vec())
}

/// Dotted name from the symbol segments of `path`; logical segments are
/// skipped.
pub fn symbol(path: &[u8]) -> String {
    let mut names = Vec::new();
    let mut i = 0;
    while i < path.len() {
        match path[i] {
            0x91 => {
                let len = path[i + 1] as usize;
                names.push(String::from_utf8_lossy(&path[i + 2..i + 2 + len]).into_owned());
                i += 2 + len + len % 2;
            }
            0x20 | 0x24 => i += 2,
            0x25 => i += 4,
            0x26 => i += 6,
            other => panic!("unexpected segment {other:#04x}"),
        }
    }
    names.join(".")
}

/// Instance id of a Symbol-class logical path.
pub fn instance(path: &[u8]) -> u32 {
    match path[2] {
        0x24 => path[3] as u32,
        0x25 => u16::from_le_bytes([path[4], path[5]]) as u32,
        0x26 => u32::from_le_bytes([path[4], path[5], path[6], path[7]]),
        other => panic!("unexpected instance segment {other:#04x}"),
    }
}

pub fn record(instance_id: u32, name: &str, type_word: u16, dims: [u32; 3]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&instance_id.to_le_bytes());
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&type_word.to_le_bytes());
    for dim in dims {
        out.extend_from_slice(&dim.to_le_bytes());
    }
    out
}
