use std::{fmt, future, io, net::SocketAddr};

use futures_util::{StreamExt, stream::FuturesUnordered};
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::{
    Connection, ConnectionId, FramesCodec, Sink,
    connection::Progress,
    error::{Error, ResourceError},
    options::ServerOptions,
    transport::{Listener, Transport},
};

/// What woke the server up during a [`Server::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// A new connection took a free slot.
    Accepted(ConnectionId),
    /// A new connection arrived while the table was full and was dropped.
    Rejected,
    /// One or more connections were ready.
    Serviced,
    /// The wait timed out with nothing ready.
    Idle,
}

#[derive(Debug)]
enum Close {
    /// The peer closed its side of the stream.
    Eof,
    /// The peer sent a close frame.
    Frame,
    Error(Error),
}

enum Event<T> {
    Accepted(io::Result<(T, SocketAddr)>),
    Ready(usize, io::Result<()>),
}

/// Single threaded connection multiplexer.
///
/// Owns the listener, a fixed-size table of connection slots and the sink. One task drives it
/// through [`Server::tick`] or [`Server::run`]; nothing in it is shared.
pub struct Server<L: Listener, S> {
    listener: L,
    slots: Vec<Option<Connection<L::Transport>>>,
    options: ServerOptions,
    codec: FramesCodec,
    sink: S,
    serial: u64,
    scratch: Vec<u8>,
}

impl<L: Listener, S> fmt::Debug for Server<L, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("options", &self.options)
            .field("active", &self.active())
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}

impl<S: Sink> Server<TcpListener, S> {
    /// Binds a TCP listener on `addr`.
    pub async fn bind<A: ToSocketAddrs>(
        addr: A,
        options: ServerOptions,
        sink: S,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;

        info!(addr = %listener.local_addr()?, "Listening");

        Ok(Self::new(listener, options, sink))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl<L: Listener, S> Server<L, S> {
    pub fn new(listener: L, options: ServerOptions, sink: S) -> Self {
        let slots = (0..options.max_connections()).map(|_| None).collect();
        let codec = FramesCodec::decoder().with_max_payload_len(options.max_payload_len());
        let scratch = vec![0; options.read_chunk()];

        Self {
            listener,
            slots,
            options,
            codec,
            sink,
            serial: 0,
            scratch,
        }
    }

    pub const fn options(&self) -> &ServerOptions {
        &self.options
    }

    pub const fn listener(&self) -> &L {
        &self.listener
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Number of occupied slots.
    pub fn active(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection<L::Transport>> {
        self.slots
            .get(id.slot())
            .and_then(Option::as_ref)
            .filter(|connection| connection.id() == id)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection<L::Transport>> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

impl<L: Listener, S: Sink> Server<L, S> {
    /// Places `transport` into a free slot.
    ///
    /// With every slot taken the transport is dropped, which closes it, and existing
    /// connections are left alone.
    pub fn admit(&mut self, transport: L::Transport) -> Result<ConnectionId, ResourceError> {
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            return Err(ResourceError::TooManyConnections {
                max: self.slots.len(),
            });
        };

        self.serial += 1;

        let id = ConnectionId::new(slot, self.serial);

        self.slots[slot] = Some(Connection::new(id, transport, &self.options));

        Ok(id)
    }

    /// Serves forever.
    pub async fn run(&mut self) {
        loop {
            self.tick().await;
        }
    }

    /// One loop iteration: wait for readiness or a new connection, bounded by the configured
    /// tick, then service every connection that has something to do.
    pub async fn tick(&mut self) -> Tick {
        let Some(event) = self.wait().await else {
            self.flush_pending();

            return Tick::Idle;
        };

        let tick = match event {
            Event::Accepted(Ok((transport, peer))) => match self.admit(transport) {
                Ok(id) => {
                    info!(%id, %peer, active = self.active(), "Connection accepted");

                    Tick::Accepted(id)
                }
                Err(err) => {
                    warn!(%peer, %err, "Connection rejected");

                    Tick::Rejected
                }
            },
            Event::Accepted(Err(err)) => {
                warn!(%err, "Accept failed");

                Tick::Serviced
            }
            Event::Ready(slot, Err(err)) => {
                self.close(slot, Close::Error(err.into()));

                Tick::Serviced
            }
            Event::Ready(_, Ok(())) => Tick::Serviced,
        };

        self.service();

        tick
    }

    async fn wait(&self) -> Option<Event<L::Transport>> {
        let mut ready = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, connection)| connection.as_ref().map(|c| (slot, c)))
            .map(|(slot, connection)| async move { (slot, connection.ready().await) })
            .collect::<FuturesUnordered<_>>();

        let readiness = async {
            match ready.next().await {
                Some(ready) => ready,
                None => future::pending().await,
            }
        };

        let event = async {
            tokio::select! {
                accepted = self.listener.accept() => Event::Accepted(accepted),
                (slot, result) = readiness => Event::Ready(slot, result),
            }
        };

        tokio::time::timeout(self.options.tick(), event).await.ok()
    }

    /// Gives every connection one non-blocking flush and one non-blocking read.
    ///
    /// Connections without data fail the read with `WouldBlock` and are skipped.
    pub fn service(&mut self) {
        for slot in 0..self.slots.len() {
            self.service_slot(slot);
        }
    }

    fn service_slot(&mut self, slot: usize) {
        let Some(connection) = self.slots[slot].as_mut() else {
            return;
        };

        if let Err(err) = connection.flush() {
            self.close(slot, Close::Error(err.into()));

            return;
        }

        match connection.read(&mut self.scratch) {
            Ok(0) => self.close(slot, Close::Eof),
            Ok(n) => match connection.on_bytes(&self.scratch[..n], &self.codec, &mut self.sink) {
                Ok(Progress::Open) => {}
                Ok(Progress::Closed) => self.close(slot, Close::Frame),
                Err(err) => self.close(slot, Close::Error(err)),
            },
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(err) => self.close(slot, Close::Error(err.into())),
        }
    }

    fn flush_pending(&mut self) {
        for slot in 0..self.slots.len() {
            let failed = match self.slots[slot].as_mut() {
                Some(connection) if connection.has_pending_output() => connection.flush().err(),
                _ => None,
            };

            if let Some(err) = failed {
                self.close(slot, Close::Error(err.into()));
            }
        }
    }

    /// Tears down the connection in `slot`, reports it to the sink and frees the slot.
    fn close(&mut self, slot: usize, reason: Close) {
        let Some(mut connection) = self.slots[slot].take() else {
            return;
        };

        let id = connection.id();

        if matches!(reason, Close::Eof) {
            connection.on_eof(&mut self.sink);
        }

        let stats = connection.close();

        match reason {
            Close::Eof => debug!(%id, "Peer closed the stream"),
            Close::Frame => debug!(%id, "Peer sent a close frame"),
            Close::Error(err) => warn!(%id, %err, "Connection failed"),
        }

        self.sink
            .on_connection_closed(id, &stats, connection.records().payload());

        info!(%id, active = self.active(), "Connection closed");
    }
}
