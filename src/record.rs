use crate::{ConnectionId, PayloadBuffer, Sink};

/// Everything a connection has delivered so far: the reconstructed payload and its counters.
#[derive(Debug)]
pub struct Records {
    payload: PayloadBuffer,
    total_bytes: u64,
    record_count: u64,
    delimiter: u8,
}

impl Records {
    pub fn new(capacity: usize, delimiter: u8) -> Self {
        Self {
            payload: PayloadBuffer::with_capacity(capacity),
            total_bytes: 0,
            record_count: 0,
            delimiter,
        }
    }

    /// Appends `bytes`, forwards them to `sink` and reports every delimiter among them as a
    /// record boundary.
    pub fn push<S: Sink + ?Sized>(&mut self, id: ConnectionId, bytes: &[u8], sink: &mut S) {
        self.payload.push(bytes);
        self.total_bytes += bytes.len() as u64;

        sink.on_payload(id, bytes);

        for _ in bytes.iter().filter(|&&b| b == self.delimiter) {
            self.record_count += 1;
            sink.on_record_boundary(id);
        }
    }

    pub fn reset(&mut self) {
        self.payload.clear();
        self.total_bytes = 0;
        self.record_count = 0;
    }

    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub const fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn payload(&self) -> &[u8] {
        self.payload.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingSink;

    #[test]
    fn counts_delimiters() {
        let id = ConnectionId::new(0, 1);
        let mut sink = RecordingSink::default();
        let mut records = Records::new(16, b'\n');

        records.push(id, b"one\ntwo\n", &mut sink);
        records.push(id, b"thr", &mut sink);
        records.push(id, b"ee\n", &mut sink);

        assert_eq!(records.total_bytes(), 14);
        assert_eq!(records.record_count(), 3);
        assert_eq!(records.payload(), b"one\ntwo\nthree\n");
        assert_eq!(sink.boundaries, vec![id; 3]);
        assert_eq!(sink.payloads.len(), 3);
    }

    #[test]
    fn reset() {
        let id = ConnectionId::new(0, 1);
        let mut records = Records::new(16, b'\n');

        records.push(id, b"GET ", &mut RecordingSink::default());
        records.reset();

        assert_eq!(records.total_bytes(), 0);
        assert_eq!(records.record_count(), 0);
        assert!(records.payload().is_empty());
    }
}
