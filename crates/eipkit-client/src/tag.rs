use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::{BufMut, Bytes, BytesMut};
use eipkit_cip::service::{class, READ_TAG, WRITE_TAG};
use eipkit_cip::{
    data, join, logical_address, symbolic_path, DataSubtype, MessageRouterRequest,
    MessageRouterResponse, TypeCode,
};
use eipkit_frame::BufExt;

use crate::batch::exchange_batch;
use crate::discovery::SymbolRecord;
use crate::error::{ClientError, Result};
use crate::notify::{spawn_hook, ChangeHook, TagChange};
use crate::session::{lock, Session};

/// Longest CIP STRING payload a controller string tag holds.
pub const MAX_STRING_LEN: u32 = 88;

/// A controller tag bound to a session.
///
/// Cloning is cheap; clones share the cached value, the pending write and
/// the change hook. The tag lock guards that state and is never held while
/// a request is on the wire.
#[derive(Clone)]
pub struct Tag {
    inner: Arc<TagInner>,
}

struct TagInner {
    session: Session,
    instance_id: u32,
    name: Bytes,
    dims: [u32; 3],
    state: Mutex<TagState>,
}

#[derive(Default)]
struct TagState {
    type_code: TypeCode,
    value: Bytes,
    pending: Option<Bytes>,
    changed: bool,
    read_request: Option<MessageRouterRequest>,
    hook: Option<ChangeHook>,
}

/// A pending value captured for writing, with the requests that write it.
pub(crate) struct WriteSnapshot {
    pub(crate) value: Bytes,
    pub(crate) requests: Vec<MessageRouterRequest>,
}

impl Tag {
    /// A tag addressed by name, typed INT with `count` elements.
    pub fn new(session: &Session, name: impl Into<Bytes>, count: u32) -> Self {
        Self::build(session, 0, name.into(), TypeCode::INT, [count, 0, 0])
    }

    pub(crate) fn from_record(session: &Session, record: SymbolRecord) -> Self {
        Self::build(
            session,
            record.instance_id,
            record.name,
            record.type_code,
            record.dims,
        )
    }

    fn build(session: &Session, instance_id: u32, name: Bytes, type_code: TypeCode, dims: [u32; 3]) -> Self {
        Self {
            inner: Arc::new(TagInner {
                session: session.clone(),
                instance_id,
                name,
                dims,
                state: Mutex::new(TagState {
                    type_code,
                    ..TagState::default()
                }),
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Symbol instance id, 0 for tags created by name.
    pub fn instance_id(&self) -> u32 {
        self.inner.instance_id
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.inner.name).into_owned()
    }

    pub fn name_bytes(&self) -> &Bytes {
        &self.inner.name
    }

    pub fn dims(&self) -> [u32; 3] {
        self.inner.dims
    }

    pub fn type_code(&self) -> TypeCode {
        lock(&self.inner.state).type_code
    }

    pub fn set_type(&self, type_code: TypeCode) {
        lock(&self.inner.state).type_code = type_code;
    }

    pub fn is_struct(&self) -> bool {
        self.type_code().is_struct()
    }

    /// e.g. `0x00c4(  DINT) | atomic | 0 dims`
    pub fn type_description(&self) -> String {
        self.type_code().describe()
    }

    /// Product of the non-zero dimensions, 1 for scalars.
    pub fn element_count(&self) -> u32 {
        self.inner
            .dims
            .iter()
            .filter(|d| **d > 0)
            .fold(1u32, |acc, d| acc.saturating_mul(*d))
    }

    fn wire_count(&self) -> Result<u16> {
        let count = self.element_count();
        u16::try_from(count)
            .map_err(|_| ClientError::InvalidValue(format!("element count {count} exceeds u16")))
    }

    /// Register the hook fired when a read observes new value bytes.
    pub fn on_change<F>(&self, hook: F)
    where
        F: Fn(TagChange) + Send + Sync + 'static,
    {
        lock(&self.inner.state).hook = Some(Arc::new(hook));
    }

    pub fn clear_on_change(&self) {
        lock(&self.inner.state).hook = None;
    }

    /// The cached value from the last read or committed write.
    pub fn value(&self) -> Bytes {
        lock(&self.inner.state).value.clone()
    }

    /// The value staged for the next write.
    pub fn pending(&self) -> Option<Bytes> {
        lock(&self.inner.state).pending.clone()
    }

    /// True when a value was staged and no group write has collected it yet.
    pub fn is_changed(&self) -> bool {
        lock(&self.inner.state).changed
    }

    /// Stage raw bytes for the next write.
    pub fn set_value(&self, value: impl Into<Bytes>) {
        let mut state = lock(&self.inner.state);
        state.pending = Some(value.into());
        state.changed = true;
    }

    pub fn set_i32(&self, value: i32) {
        self.set_value(value.to_le_bytes().to_vec());
    }

    /// Stage the string's raw bytes; no length prefix is added.
    pub fn set_string(&self, value: &str) {
        self.set_value(Bytes::copy_from_slice(value.as_bytes()));
    }

    pub fn to_i32(&self) -> Result<i32> {
        decode_i32(&self.value())
    }

    /// Decode the cached value as a CIP STRING (u32 length, then bytes).
    ///
    /// A length beyond [`MAX_STRING_LEN`] yields an empty string.
    pub fn to_string_value(&self) -> Result<String> {
        decode_string(&self.value())
    }

    pub fn pending_or_value_i32(&self) -> Result<i32> {
        match self.pending() {
            Some(pending) if !pending.is_empty() => decode_i32(&pending),
            _ => self.to_i32(),
        }
    }

    /// The staged string (raw bytes) if any, otherwise the cached value
    /// decoded as a CIP STRING.
    pub fn pending_or_value_string(&self) -> Result<String> {
        match self.pending() {
            Some(pending) if !pending.is_empty() => printable(&pending),
            _ => self.to_string_value(),
        }
    }

    /// Read the tag and refresh the cached value.
    pub fn read(&self) -> Result<()> {
        let request = self.read_request()?;
        let reply = self.inner.session.send(&request)?.check_status()?;
        if let Some((hook, change)) = self.apply_read(&reply)? {
            spawn_hook(hook, change);
        }
        Ok(())
    }

    /// Write the pending value, if there is one.
    ///
    /// Atomic tags take one Write Tag request. Structured tags take two,
    /// `LEN` then `DATA`, sent together as one Multiple Service Packet. On
    /// success the written value becomes the cached value.
    pub fn write(&self) -> Result<()> {
        let Some(snapshot) = self.write_snapshot()? else {
            return Ok(());
        };
        for reply in exchange_batch(&self.inner.session, snapshot.requests)? {
            reply.check_status()?;
        }
        self.commit(&snapshot.value);
        Ok(())
    }

    /// The cached read request, built on first use.
    pub(crate) fn read_request(&self) -> Result<MessageRouterRequest> {
        let mut state = lock(&self.inner.state);
        if let Some(request) = &state.read_request {
            return Ok(request.clone());
        }
        let count = self.wire_count()?;
        let request = MessageRouterRequest::new(
            READ_TAG,
            symbolic_path(&self.inner.name)?,
            count.to_le_bytes().to_vec(),
        );
        state.read_request = Some(request.clone());
        Ok(request)
    }

    /// Apply a successful read reply. Returns the hook to fire when the
    /// value bytes changed.
    pub(crate) fn apply_read(
        &self,
        reply: &MessageRouterResponse,
    ) -> Result<Option<(ChangeHook, TagChange)>> {
        let value = parse_read_data(&reply.data)?;

        let mut state = lock(&self.inner.state);
        if state.value == value {
            return Ok(None);
        }
        state.value = value.clone();
        Ok(state.hook.clone().map(|hook| {
            (
                hook,
                TagChange {
                    tag: self.clone(),
                    value,
                },
            )
        }))
    }

    pub(crate) fn write_snapshot(&self) -> Result<Option<WriteSnapshot>> {
        let (value, type_code) = {
            let state = lock(&self.inner.state);
            match &state.pending {
                Some(pending) => (pending.clone(), state.type_code),
                None => return Ok(None),
            }
        };
        let requests = if type_code.is_struct() {
            self.struct_write_requests(&value)?
        } else {
            vec![self.atomic_write_request(type_code, &value)?]
        };
        Ok(Some(WriteSnapshot { value, requests }))
    }

    /// Take the `changed` flag for a group write.
    pub(crate) fn take_changed(&self) -> bool {
        std::mem::take(&mut lock(&self.inner.state).changed)
    }

    pub(crate) fn mark_changed(&self) {
        lock(&self.inner.state).changed = true;
    }

    /// Make `written` the cached value. The pending value is cleared unless
    /// it was replaced while the write was in flight.
    pub(crate) fn commit(&self, written: &Bytes) {
        let mut state = lock(&self.inner.state);
        state.value = written.clone();
        if state.pending.as_ref() == Some(written) {
            state.pending = None;
            state.changed = false;
        }
    }

    fn atomic_write_request(&self, type_code: TypeCode, value: &Bytes) -> Result<MessageRouterRequest> {
        let mut body = BytesMut::with_capacity(4 + value.len());
        body.put_u16_le(type_code.0);
        body.put_u16_le(self.wire_count()?);
        body.put_slice(value);
        Ok(MessageRouterRequest::new(
            WRITE_TAG,
            symbolic_path(&self.inner.name)?,
            body.freeze(),
        ))
    }

    fn struct_write_requests(&self, value: &Bytes) -> Result<Vec<MessageRouterRequest>> {
        let len = u16::try_from(value.len()).map_err(|_| {
            ClientError::InvalidValue(format!("structure value of {} bytes is too long", value.len()))
        })?;
        let instance = logical_address(class::SYMBOL, self.inner.instance_id);

        let mut len_body = BytesMut::with_capacity(8);
        len_body.put_u16_le(TypeCode::DINT.0);
        len_body.put_u16_le(1);
        len_body.put_u32_le(u32::from(len));

        let mut data_body = BytesMut::with_capacity(4 + value.len());
        data_body.put_u16_le(TypeCode::SINT.0);
        data_body.put_u16_le(len);
        data_body.put_slice(value);

        Ok(vec![
            MessageRouterRequest::new(
                WRITE_TAG,
                join([instance.clone(), data(DataSubtype::Symbol, b"LEN")?]),
                len_body.freeze(),
            ),
            MessageRouterRequest::new(
                WRITE_TAG,
                join([instance, data(DataSubtype::Symbol, b"DATA")?]),
                data_body.freeze(),
            ),
        ])
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tag")
            .field("name", &self.name())
            .field("instance_id", &self.inner.instance_id)
            .field("dims", &self.inner.dims)
            .finish_non_exhaustive()
    }
}

/// Strip the type word (and the structure handle after 0x02A0) from a
/// read reply, leaving the value bytes.
fn parse_read_data(data: &Bytes) -> Result<Bytes> {
    let mut src = data.clone();
    let type_word = src.take_u16_le("tag type")?;
    if type_word == TypeCode::STRUCT_MARKER {
        src.take_u16_le("structure handle")?;
    }
    Ok(src)
}

fn decode_i32(value: &[u8]) -> Result<i32> {
    match value.get(..4) {
        Some(raw) => Ok(i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        None => Err(ClientError::InvalidValue(format!(
            "{} value bytes, need 4 for an i32",
            value.len()
        ))),
    }
}

fn decode_string(value: &Bytes) -> Result<String> {
    let mut src = value.clone();
    let len = src.take_u32_le("string length")?;
    if len > MAX_STRING_LEN {
        return Ok(String::new());
    }
    let raw = src.take_bytes(len as usize, "string data")?;
    printable(&raw)
}

fn printable(raw: &[u8]) -> Result<String> {
    if let Some(pos) = raw.iter().position(|b| !(b.is_ascii_graphic() || *b == b' ')) {
        return Err(ClientError::InvalidValue(format!(
            "unprintable byte {:#04x} at {pos}",
            raw[pos]
        )));
    }
    Ok(String::from_utf8_lossy(raw).into_owned())
}
