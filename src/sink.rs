use tracing::info;

use crate::{ConnectionId, ConnectionStats};

/// Consumer of everything the server reassembles.
///
/// All methods default to doing nothing.
pub trait Sink {
    /// Called with every decoded frame payload, or every raw chunk for raw connections.
    fn on_payload(&mut self, id: ConnectionId, payload: &[u8]) {
        let _ = (id, payload);
    }

    /// Called once per record delimiter seen in the payload.
    fn on_record_boundary(&mut self, id: ConnectionId) {
        let _ = id;
    }

    /// Called once when a connection is torn down, with its final statistics and the full
    /// reconstructed payload.
    fn on_connection_closed(&mut self, id: ConnectionId, stats: &ConnectionStats, payload: &[u8]) {
        let _ = (id, stats, payload);
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn on_payload(&mut self, id: ConnectionId, payload: &[u8]) {
        (**self).on_payload(id, payload)
    }

    fn on_record_boundary(&mut self, id: ConnectionId) {
        (**self).on_record_boundary(id)
    }

    fn on_connection_closed(&mut self, id: ConnectionId, stats: &ConnectionStats, payload: &[u8]) {
        (**self).on_connection_closed(id, stats, payload)
    }
}

/// Reports the final statistics of every connection through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Sink for LogSink {
    fn on_connection_closed(&mut self, id: ConnectionId, stats: &ConnectionStats, _payload: &[u8]) {
        info!(
            %id,
            mode = ?stats.mode,
            total_bytes = stats.total_bytes,
            record_count = stats.record_count,
            elapsed = stats.elapsed.as_secs_f64(),
            "Connection finished"
        );
    }
}
