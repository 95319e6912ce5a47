//! The readiness based I/O contract the server is written against.

use std::{future::Future, io, net::SocketAddr};

use tokio::net::{TcpListener, TcpStream};

/// A connected byte stream with readiness notifications and non-blocking reads and writes.
pub trait Transport {
    /// Resolves once the transport may be readable.
    ///
    /// Readiness can be spurious, [`Transport::try_read`] then fails with
    /// [`io::ErrorKind::WouldBlock`].
    fn readable(&self) -> impl Future<Output = io::Result<()>>;

    /// Resolves once the transport may be writable.
    fn writable(&self) -> impl Future<Output = io::Result<()>>;

    /// One non-blocking read. `Ok(0)` is an orderly close by the peer.
    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// One non-blocking write. May write fewer bytes than given.
    fn try_write(&self, buf: &[u8]) -> io::Result<usize>;
}

/// Source of new connections.
pub trait Listener {
    type Transport: Transport;

    fn accept(&self) -> impl Future<Output = io::Result<(Self::Transport, SocketAddr)>>;
}

impl Transport for TcpStream {
    fn readable(&self) -> impl Future<Output = io::Result<()>> {
        TcpStream::readable(self)
    }

    fn writable(&self) -> impl Future<Output = io::Result<()>> {
        TcpStream::writable(self)
    }

    fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        TcpStream::try_read(self, buf)
    }

    fn try_write(&self, buf: &[u8]) -> io::Result<usize> {
        TcpStream::try_write(self, buf)
    }
}

impl Listener for TcpListener {
    type Transport = TcpStream;

    fn accept(&self) -> impl Future<Output = io::Result<(Self::Transport, SocketAddr)>> {
        TcpListener::accept(self)
    }
}

/// Outbound bytes that have not reached the transport yet.
///
/// Short writes keep the unwritten remainder queued; [`Outbox::flush`] continues from there
/// on the next writable readiness.
#[derive(Debug, Default)]
pub struct Outbox {
    buf: Vec<u8>,
    written: usize,
}

impl Outbox {
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.written == self.buf.len()
    }

    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.written..]
    }

    /// Writes as much as the transport accepts without blocking.
    pub fn flush<T: Transport + ?Sized>(&mut self, transport: &T) -> io::Result<()> {
        while !self.is_empty() {
            match transport.try_write(self.remaining()) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => self.written += n,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        self.buf.clear();
        self.written = 0;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;

    #[test]
    fn flush_continues_after_short_write() {
        let transport = MockTransport::new();
        transport.set_write_limit(Some(3));

        let mut outbox = Outbox::default();
        outbox.push(b"HTTP/1.1 101");

        transport.block_writes_after(2);
        outbox.flush(&transport).unwrap();

        assert_eq!(transport.written(), b"HTTP/1");
        assert_eq!(outbox.remaining(), b".1 101");

        transport.block_writes_after(usize::MAX);
        outbox.flush(&transport).unwrap();

        assert!(outbox.is_empty());
        assert_eq!(transport.written(), b"HTTP/1.1 101");
    }

    #[test]
    fn write_zero_is_an_error() {
        let transport = MockTransport::new();
        transport.set_write_limit(Some(0));

        let mut outbox = Outbox::default();
        outbox.push(b"data");

        let error = outbox.flush(&transport).unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::WriteZero);
    }
}
