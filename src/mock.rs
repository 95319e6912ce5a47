//! In-memory transport, listener and sink for testing purposes.

use std::{
    cell::RefCell,
    collections::VecDeque,
    future::{self, Future},
    io,
    net::SocketAddr,
    rc::Rc,
};

use crate::{
    ConnectionId, ConnectionStats, Sink,
    transport::{Listener, Transport},
};

#[derive(Debug)]
enum MockRead {
    Data(Vec<u8>),
    Eof,
    Error(io::ErrorKind),
}

#[derive(Debug)]
struct MockState {
    reads: VecDeque<MockRead>,
    written: Vec<u8>,
    write_limit: Option<usize>,
    writes_allowed: usize,
}

/// A scripted transport.
///
/// Clones share state, so a test can keep one handle while the server owns another.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                reads: VecDeque::new(),
                written: Vec::new(),
                write_limit: None,
                writes_allowed: usize::MAX,
            })),
        }
    }

    /// Queues bytes for the next read.
    pub fn push_read(&self, bytes: &[u8]) {
        self.state
            .borrow_mut()
            .reads
            .push_back(MockRead::Data(bytes.to_vec()));
    }

    /// Queues an orderly close.
    pub fn push_eof(&self) {
        self.state.borrow_mut().reads.push_back(MockRead::Eof);
    }

    /// Queues a failing read.
    pub fn push_error(&self, kind: io::ErrorKind) {
        self.state.borrow_mut().reads.push_back(MockRead::Error(kind));
    }

    /// Everything written to the transport so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.borrow().written.clone()
    }

    /// Caps the number of bytes accepted by a single write.
    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.state.borrow_mut().write_limit = limit;
    }

    /// Lets `n` more writes through, then reports `WouldBlock`.
    pub fn block_writes_after(&self, n: usize) {
        self.state.borrow_mut().writes_allowed = n;
    }

    fn has_reads(&self) -> bool {
        !self.state.borrow().reads.is_empty()
    }

    fn can_write(&self) -> bool {
        self.state.borrow().writes_allowed > 0
    }
}

impl Transport for MockTransport {
    fn readable(&self) -> impl Future<Output = io::Result<()>> {
        async move {
            match self.has_reads() {
                true => Ok(()),
                false => future::pending().await,
            }
        }
    }

    fn writable(&self) -> impl Future<Output = io::Result<()>> {
        async move {
            match self.can_write() {
                true => Ok(()),
                false => future::pending().await,
            }
        }
    }

    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();

        match state.reads.pop_front() {
            None => Err(io::ErrorKind::WouldBlock.into()),
            Some(MockRead::Eof) => Ok(0),
            Some(MockRead::Error(kind)) => Err(kind.into()),
            Some(MockRead::Data(mut data)) => {
                let n = data.len().min(buf.len());

                buf[..n].copy_from_slice(&data[..n]);

                if n < data.len() {
                    state.reads.push_front(MockRead::Data(data.split_off(n)));
                }

                Ok(n)
            }
        }
    }

    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();

        if state.writes_allowed == 0 {
            return Err(io::ErrorKind::WouldBlock.into());
        }

        state.writes_allowed = state.writes_allowed.saturating_sub(1);

        let n = state.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));

        state.written.extend_from_slice(&buf[..n]);

        Ok(n)
    }
}

/// A listener handing out queued transports.
#[derive(Debug, Default)]
pub struct MockListener {
    pending: RefCell<VecDeque<MockTransport>>,
}

impl MockListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an incoming connection and returns a handle to it.
    pub fn push(&self) -> MockTransport {
        let transport = MockTransport::new();

        self.pending.borrow_mut().push_back(transport.clone());

        transport
    }
}

impl Listener for MockListener {
    type Transport = MockTransport;

    fn accept(&self) -> impl Future<Output = io::Result<(Self::Transport, SocketAddr)>> {
        async move {
            let next = self.pending.borrow_mut().pop_front();

            match next {
                Some(transport) => Ok((transport, SocketAddr::from(([127, 0, 0, 1], 0)))),
                None => future::pending().await,
            }
        }
    }
}

/// A sink that remembers everything it is told.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub payloads: Vec<(ConnectionId, Vec<u8>)>,
    pub boundaries: Vec<ConnectionId>,
    pub closed: Vec<(ConnectionId, ConnectionStats, Vec<u8>)>,
}

impl RecordingSink {
    /// All payload bytes delivered for `id`, concatenated.
    pub fn payload_of(&self, id: ConnectionId) -> Vec<u8> {
        self.payloads
            .iter()
            .filter(|(payload_id, _)| *payload_id == id)
            .flat_map(|(_, payload)| payload.iter().copied())
            .collect()
    }

    pub fn closed_stats(&self, id: ConnectionId) -> Option<&ConnectionStats> {
        self.closed
            .iter()
            .find(|(closed_id, _, _)| *closed_id == id)
            .map(|(_, stats, _)| stats)
    }
}

impl Sink for RecordingSink {
    fn on_payload(&mut self, id: ConnectionId, payload: &[u8]) {
        self.payloads.push((id, payload.to_vec()));
    }

    fn on_record_boundary(&mut self, id: ConnectionId) {
        self.boundaries.push(id);
    }

    fn on_connection_closed(&mut self, id: ConnectionId, stats: &ConnectionStats, payload: &[u8]) {
        self.closed.push((id, *stats, payload.to_vec()));
    }
}
