use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use eipkit_cip::{
    connected_cpf, response_from_cpf, unconnected_cpf, unconnected_send, MessageRouterRequest,
    MessageRouterResponse,
};
use eipkit_frame::{
    decode_message, Command, CommonPacket, Cpf, CpfItem, EncapsulationMessage, FrameError,
};
use eipkit_transport::TcpTransport;
use tracing::{debug, info, trace, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::identity::{Identity, ServiceInfo};
use crate::link::{Link, StreamLink};

/// RegisterSession body: protocol version 1, options 0.
const REGISTER_BODY: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Connected messaging state: connection id plus the rolling sequence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionState {
    pub connection_id: u32,
    pub sequence: u16,
}

/// A registered encapsulation session.
///
/// Cloning is cheap and every clone shares the same link, handle and
/// exchange lock. Exchanges are strictly one at a time: a request is written
/// and its whole reply read before the next request starts.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    /// Exchange lock. `None` once the session is closed.
    link: Mutex<Option<Box<dyn Link>>>,
    handle: AtomicU32,
    connection: Mutex<Option<ConnectionState>>,
    config: ClientConfig,
    udp_addr: Option<SocketAddr>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Discard a link whose stream position is no longer known.
fn drop_link(link: &mut Option<Box<dyn Link>>, command: Command, err: &ClientError) {
    link.take();
    match err {
        // UnRegisterSession is commonly answered by closing the stream.
        ClientError::Frame(FrameError::ConnectionClosed) => {
            debug!(%command, "link closed by target");
        }
        _ => warn!(%command, error = %err, "exchange failed, link dropped"),
    }
}

impl Session {
    /// Wrap an already-open link. The session is not registered yet.
    pub fn new(link: impl Link + 'static, config: ClientConfig) -> Self {
        Self::from_parts(Box::new(link), config, None)
    }

    fn from_parts(link: Box<dyn Link>, config: ClientConfig, udp_addr: Option<SocketAddr>) -> Self {
        Self {
            inner: Arc::new(Inner {
                link: Mutex::new(Some(link)),
                handle: AtomicU32::new(0),
                connection: Mutex::new(None),
                config,
                udp_addr,
            }),
        }
    }

    /// Resolve `host`, open the TCP stream and register a session.
    pub fn connect(host: &str, config: ClientConfig) -> Result<Self> {
        let transport = TcpTransport::resolve(host, config.tcp_port, config.udp_port)?;
        let link = StreamLink::connect(&transport, &config)?;

        let session = Self::from_parts(Box::new(link), config, Some(transport.udp_addr()));
        session.register()?;
        Ok(session)
    }

    /// Current session handle, 0 when unregistered.
    pub fn session_handle(&self) -> u32 {
        self.inner.handle.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The resolved UDP endpoint, when the session was opened by address.
    pub fn udp_addr(&self) -> Option<SocketAddr> {
        self.inner.udp_addr
    }

    /// True when both handles refer to the same session.
    pub fn same_session(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner.link).is_some()
    }

    /// RegisterSession, adopting the handle the target returns.
    pub fn register(&self) -> Result<u32> {
        let reply = self.exchange(Command::REGISTER_SESSION, 0, Bytes::from_static(&REGISTER_BODY))?;
        let handle = reply.header.session_handle;
        self.inner.handle.store(handle, Ordering::Release);
        info!(session = handle, "session registered");
        Ok(handle)
    }

    /// UnRegisterSession, adopting whatever handle comes back.
    ///
    /// Targets commonly close the stream instead of answering; that counts as
    /// unregistered.
    pub fn unregister(&self) -> Result<()> {
        let handle = self.session_handle();
        let returned = match self.exchange(Command::UNREGISTER_SESSION, handle, Bytes::new()) {
            Ok(reply) => reply.header.session_handle,
            Err(ClientError::Frame(FrameError::ConnectionClosed)) => 0,
            Err(err) => return Err(err),
        };
        self.inner.handle.store(returned, Ordering::Release);
        info!(session = handle, "session unregistered");
        Ok(())
    }

    /// Best-effort unregister, then drop the link.
    pub fn close(&self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        if let Err(err) = self.unregister() {
            warn!(error = %err, "unregister failed during close");
        }
        lock(&self.inner.link).take();
        self.clear_connection();
        Ok(())
    }

    /// Send a NOP. Targets never answer one.
    pub fn nop(&self, data: impl Into<Bytes>) -> Result<()> {
        let frame = EncapsulationMessage::new(Command::NOP, self.session_handle(), rand::random(), data)
            .to_bytes()?;
        let mut guard = lock(&self.inner.link);
        let link = guard.as_mut().ok_or(ClientError::NotConnected)?;
        if let Err(err) = link.send(&frame) {
            drop_link(&mut guard, Command::NOP, &err);
            return Err(err);
        }
        Ok(())
    }

    pub fn list_identity(&self) -> Result<Vec<Identity>> {
        let cpf = self.list(Command::LIST_IDENTITY)?;
        cpf.items.iter().map(Identity::decode).collect()
    }

    pub fn list_services(&self) -> Result<Vec<ServiceInfo>> {
        let cpf = self.list(Command::LIST_SERVICES)?;
        cpf.items.iter().map(ServiceInfo::decode).collect()
    }

    /// ListInterfaces items, undecoded.
    pub fn list_interfaces(&self) -> Result<Vec<CpfItem>> {
        Ok(self.list(Command::LIST_INTERFACES)?.items)
    }

    fn list(&self, command: Command) -> Result<Cpf> {
        let reply = self.exchange(command, 0, Bytes::new())?;
        let mut body = reply.body;
        Ok(Cpf::decode(&mut body)?)
    }

    /// SendRRData: an unconnected request/reply exchange.
    pub fn send_rr_data(&self, cpf: Cpf, timeout: u16) -> Result<CommonPacket> {
        let body = CommonPacket::new(timeout, cpf).to_bytes();
        let reply = self.exchange(Command::SEND_RR_DATA, self.session_handle(), body)?;
        Ok(CommonPacket::decode(reply.body)?)
    }

    /// SendUnitData: a connected exchange.
    pub fn send_unit_data(&self, cpf: Cpf) -> Result<CommonPacket> {
        let body = CommonPacket::new(0, cpf).to_bytes();
        let reply = self.exchange(Command::SEND_UNIT_DATA, self.session_handle(), body)?;
        Ok(CommonPacket::decode(reply.body)?)
    }

    /// Send one router request and return the target's reply.
    ///
    /// Without connected state the request is wrapped in an Unconnected-Send
    /// and carried by SendRRData; with it, the request goes out over
    /// SendUnitData with the next sequence number. The reply status is not
    /// checked here.
    pub fn send(&self, request: &MessageRouterRequest) -> Result<MessageRouterResponse> {
        let connected = self.next_sequence();
        let reply = match connected {
            Some(state) => {
                let cpf = connected_cpf(state.connection_id, state.sequence, request)?;
                self.send_unit_data(cpf)?
            }
            None => {
                let wrapped = unconnected_send(request, &self.inner.config.unconnected_send())?;
                let cpf = unconnected_cpf(&wrapped)?;
                self.send_rr_data(cpf, u16::from(self.inner.config.timeout_ticks))?
            }
        };
        Ok(response_from_cpf(&reply.packet, connected.is_some())?)
    }

    fn next_sequence(&self) -> Option<ConnectionState> {
        let mut connection = lock(&self.inner.connection);
        let state = connection.as_mut()?;
        state.sequence = state.sequence.wrapping_add(1);
        Some(*state)
    }

    /// Forward-Open is not implemented: logs and leaves the session
    /// unconnected.
    pub fn forward_open(&self) -> Result<()> {
        debug!(session = self.session_handle(), "forward open not supported, staying unconnected");
        Ok(())
    }

    pub fn forward_close(&self) -> Result<()> {
        debug!(session = self.session_handle(), "forward close not supported");
        Ok(())
    }

    /// Route later requests over SendUnitData on `connection_id`.
    pub fn install_connection(&self, connection_id: u32) {
        *lock(&self.inner.connection) = Some(ConnectionState {
            connection_id,
            sequence: 0,
        });
    }

    pub fn clear_connection(&self) {
        lock(&self.inner.connection).take();
    }

    pub fn connection(&self) -> Option<ConnectionState> {
        *lock(&self.inner.connection)
    }

    /// One encapsulation request/reply exchange under the exchange lock.
    ///
    /// The frame is encoded before the lock is taken, so oversize bodies and
    /// unsupported commands fail without I/O. A send or receive failure drops
    /// the link: the reply may still arrive and would otherwise be read as
    /// the answer to the next request.
    fn exchange(&self, command: Command, handle: u32, body: Bytes) -> Result<EncapsulationMessage> {
        let frame = EncapsulationMessage::new(command, handle, rand::random(), body).to_bytes()?;

        let raw = {
            let mut guard = lock(&self.inner.link);
            let link = guard.as_mut().ok_or(ClientError::NotConnected)?;
            debug!(%command, length = frame.len(), session = handle, "exchange");
            match link.send(&frame).and_then(|()| link.receive()) {
                Ok(raw) => raw,
                Err(err) => {
                    drop_link(&mut guard, command, &err);
                    return Err(err);
                }
            }
        };
        trace!(%command, size = raw.len(), "reply frame");

        let reply = decode_message(raw)?;
        if reply.header.command != command {
            return Err(ClientError::UnexpectedReply {
                expected: command,
                actual: reply.header.command,
            });
        }
        if reply.header.status != 0 {
            return Err(ClientError::EncapsulationStatus {
                command,
                status: reply.header.status,
            });
        }
        Ok(reply)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.session_handle())
            .field("connection", &self.connection())
            .finish_non_exhaustive()
    }
}
