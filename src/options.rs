use std::time::Duration;

use crate::http::Header;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    max_connections: usize,
    receive_capacity: usize,
    read_chunk: usize,
    payload_capacity: usize,
    max_payload_len: Option<usize>,
    record_delimiter: u8,
    tick: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerOptions {
    pub const fn new() -> Self {
        Self {
            max_connections: 30,
            receive_capacity: 102400,
            read_chunk: 2048,
            payload_capacity: 102400,
            max_payload_len: None,
            record_delimiter: b'\n',
            tick: Duration::from_secs(1),
        }
    }

    /// Size of the connection table. Connections beyond it are rejected.
    pub const fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub const fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Capacity of each connection's receive accumulator.
    pub const fn receive_capacity(&self) -> usize {
        self.receive_capacity
    }

    pub const fn with_receive_capacity(mut self, receive_capacity: usize) -> Self {
        self.receive_capacity = receive_capacity;
        self
    }

    /// Maximum number of bytes taken from a transport per read.
    pub const fn read_chunk(&self) -> usize {
        self.read_chunk
    }

    pub const fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk;
        self
    }

    /// Initial capacity of each connection's reconstructed payload.
    pub const fn payload_capacity(&self) -> usize {
        self.payload_capacity
    }

    pub const fn with_payload_capacity(mut self, payload_capacity: usize) -> Self {
        self.payload_capacity = payload_capacity;
        self
    }

    /// Largest frame payload accepted. Defaults to the receive capacity, since a larger frame
    /// could never be buffered whole.
    pub const fn max_payload_len(&self) -> usize {
        match self.max_payload_len {
            Some(max) => max,
            None => self.receive_capacity,
        }
    }

    pub const fn with_max_payload_len(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = Some(max_payload_len);
        self
    }

    /// Byte that ends a record.
    pub const fn record_delimiter(&self) -> u8 {
        self.record_delimiter
    }

    pub const fn with_record_delimiter(mut self, record_delimiter: u8) -> Self {
        self.record_delimiter = record_delimiter;
        self
    }

    /// Upper bound on a single readiness wait.
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    pub const fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }
}

#[derive(Debug)]
pub struct ConnectOptions<'a, 'b> {
    pub path: &'a str,
    pub host: &'a str,
    pub headers: &'a [Header<'b>],
}

impl<'a, 'b> Default for ConnectOptions<'a, 'b> {
    fn default() -> Self {
        Self::default()
    }
}

impl<'a, 'b> ConnectOptions<'a, 'b> {
    pub const fn path(&self) -> &str {
        self.path
    }

    pub const fn with_path(mut self, path: &'a str) -> Self {
        self.path = path;
        self
    }

    pub const fn host(&self) -> &str {
        self.host
    }

    pub const fn with_host(mut self, host: &'a str) -> Self {
        self.host = host;
        self
    }

    pub const fn headers(&self) -> &[Header<'b>] {
        self.headers
    }

    /// Additional headers sent with the upgrade request.
    pub const fn with_headers(mut self, headers: &'a [Header<'b>]) -> Self {
        self.headers = headers;
        self
    }

    const fn default() -> Self {
        Self {
            path: "/",
            host: "localhost",
            headers: &[],
        }
    }
}
