use std::{
    fmt, io,
    time::{Duration, Instant},
};

use tracing::{debug, trace};

use crate::{
    FramesCodec, Reassembler, Records, Sink,
    error::{Error, ProtocolError},
    handshake,
    options::ServerOptions,
    transport::{Outbox, Transport},
};

/// The bytes a connection must start with to be treated as a WebSocket upgrade.
pub const REQUEST_PREFIX: &[u8] = b"GET ";

/// Lifecycle of a connection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Accepted, no bytes seen yet.
    Unclassified,
    /// Started with an HTTP request line, waiting for the full upgrade request.
    Handshaking,
    /// Upgrade answered. Every byte is frame data.
    WebSocket,
    /// Anything else. Every byte is opaque payload.
    Raw,
    /// Torn down. The slot is about to be freed.
    Closed,
}

/// Identifies a connection for its whole lifetime. Slots are reused, serials are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    slot: usize,
    serial: u64,
}

impl ConnectionId {
    pub const fn new(slot: usize, serial: u64) -> Self {
        Self { slot, serial }
    }

    pub const fn slot(&self) -> usize {
        self.slot
    }

    pub const fn serial(&self) -> u64 {
        self.serial
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.serial, self.slot)
    }
}

/// Final statistics of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
    /// The mode the connection was in when it was torn down.
    pub mode: Mode,
    pub total_bytes: u64,
    pub record_count: u64,
    /// Time since the handshake completed, or since accept for non-WebSocket connections.
    pub elapsed: Duration,
}

/// What the server should do with a connection after feeding it bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    Open,
    /// The peer sent a close frame.
    Closed,
}

/// Per connection state. Owned by exactly one server slot.
#[derive(Debug)]
pub struct Connection<T> {
    id: ConnectionId,
    transport: T,
    mode: Mode,
    reassembler: Reassembler,
    records: Records,
    started: Instant,
    outbox: Outbox,
}

impl<T> Connection<T> {
    pub fn new(id: ConnectionId, transport: T, options: &ServerOptions) -> Self {
        Self {
            id,
            transport,
            mode: Mode::Unclassified,
            reassembler: Reassembler::new(options.receive_capacity()),
            records: Records::new(options.payload_capacity(), options.record_delimiter()),
            started: Instant::now(),
            outbox: Outbox::default(),
        }
    }

    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub const fn records(&self) -> &Records {
        &self.records
    }

    /// Bytes received but not consumed yet.
    pub fn buffered(&self) -> &[u8] {
        self.reassembler.buffered()
    }

    pub fn has_pending_output(&self) -> bool {
        !self.outbox.is_empty()
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            mode: self.mode,
            total_bytes: self.records.total_bytes(),
            record_count: self.records.record_count(),
            elapsed: self.started.elapsed(),
        }
    }

    /// Marks the connection closed and returns its final statistics.
    pub(crate) fn close(&mut self) -> ConnectionStats {
        let stats = self.stats();

        self.mode = Mode::Closed;

        stats
    }
}

impl<T: Transport> Connection<T> {
    /// Resolves once the transport is readable, or writable while output is pending.
    pub(crate) async fn ready(&self) -> io::Result<()> {
        if self.outbox.is_empty() {
            return self.transport.readable().await;
        }

        tokio::select! {
            readable = self.transport.readable() => readable,
            writable = self.transport.writable() => writable,
        }
    }

    pub(crate) fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.transport.try_read(buf)
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.outbox.flush(&self.transport)
    }

    /// Dispatches freshly read bytes according to the current mode.
    pub(crate) fn on_bytes<S: Sink + ?Sized>(
        &mut self,
        bytes: &[u8],
        codec: &FramesCodec,
        sink: &mut S,
    ) -> Result<Progress, Error> {
        match self.mode {
            Mode::Unclassified => self.classify(bytes, codec, sink),
            Mode::Handshaking => {
                self.reassembler.append(bytes)?;
                self.handshake(codec, sink)
            }
            Mode::WebSocket => {
                self.reassembler.append(bytes)?;
                self.frames(codec, sink)
            }
            Mode::Raw => {
                self.records.push(self.id, bytes, sink);
                Ok(Progress::Open)
            }
            Mode::Closed => Ok(Progress::Closed),
        }
    }

    /// Decides the mode from the first bytes of the stream.
    ///
    /// Only a strict prefix of [`REQUEST_PREFIX`] is ever held back. Raw bytes go straight to
    /// the records and never enter the receive buffer.
    fn classify<S: Sink + ?Sized>(
        &mut self,
        bytes: &[u8],
        codec: &FramesCodec,
        sink: &mut S,
    ) -> Result<Progress, Error> {
        let held = self.reassembler.buffered().len();
        let take = bytes.len().min(REQUEST_PREFIX.len() - held);

        let mut head = [0u8; REQUEST_PREFIX.len()];
        head[..held].copy_from_slice(self.reassembler.buffered());
        head[held..held + take].copy_from_slice(&bytes[..take]);

        let head = &head[..held + take];

        if head == REQUEST_PREFIX {
            trace!(id = %self.id, "Classified as websocket");

            self.mode = Mode::Handshaking;
            self.reassembler.append(bytes)?;

            return self.handshake(codec, sink);
        }

        // Too short to tell, but could still become a request line.
        if REQUEST_PREFIX.starts_with(head) {
            self.reassembler.append(bytes)?;

            return Ok(Progress::Open);
        }

        debug!(id = %self.id, "Classified as raw");

        self.switch_to_raw(sink);
        self.records.push(self.id, bytes, sink);

        Ok(Progress::Open)
    }

    /// Switches to raw mode, moving any held back prefix into the records.
    fn switch_to_raw<S: Sink + ?Sized>(&mut self, sink: &mut S) {
        self.mode = Mode::Raw;

        let held = self.reassembler.buffered().len();

        if held > 0 {
            self.records.push(self.id, self.reassembler.buffered(), sink);
            self.reassembler.consume(held);
        }
    }

    /// The peer closed its side. A connection still waiting on a partial request line never
    /// sent one, so its bytes count as raw payload.
    pub(crate) fn on_eof<S: Sink + ?Sized>(&mut self, sink: &mut S) {
        if self.mode == Mode::Unclassified && !self.reassembler.is_empty() {
            debug!(id = %self.id, "Classified as raw at end of stream");

            self.switch_to_raw(sink);
        }
    }

    fn handshake<S: Sink + ?Sized>(
        &mut self,
        codec: &FramesCodec,
        sink: &mut S,
    ) -> Result<Progress, Error> {
        let Some(accepted) = handshake::accept(self.reassembler.buffered())? else {
            return Ok(Progress::Open);
        };

        self.reassembler.consume(accepted.consumed());
        self.outbox.push(&accepted.response());
        self.flush()?;

        self.mode = Mode::WebSocket;
        self.records.reset();
        self.started = Instant::now();

        debug!(id = %self.id, "Handshake completed");

        if self.reassembler.is_empty() {
            return Ok(Progress::Open);
        }

        self.frames(codec, sink)
    }

    fn frames<S: Sink + ?Sized>(
        &mut self,
        codec: &FramesCodec,
        sink: &mut S,
    ) -> Result<Progress, Error> {
        let id = self.id;
        let records = &mut self.records;

        let reassembled = self
            .reassembler
            .drain(codec, |frame| {
                if frame.opcode().is_data() {
                    records.push(id, frame.payload(), sink);
                } else {
                    trace!(%id, opcode = ?frame.opcode(), "Skipping control frame");
                }
            })
            .map_err(ProtocolError::from)?;

        trace!(%id, frames = reassembled.frames, consumed = reassembled.consumed, "Reassembled");

        match reassembled.close {
            true => Ok(Progress::Closed),
            false => Ok(Progress::Open),
        }
    }
}
