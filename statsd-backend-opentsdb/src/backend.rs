use std::sync::Arc;

use statsd_backend_core::{Backend, MetricsSnapshot};
use tracing::debug;

use crate::{forwarder::ForwarderHandle, health::DeliveryHealth, writer::PayloadWriter};

/// A statsd backend that exports each flush to OpenTSDB.
///
/// Built by [`OpenTsdbBuilder`](crate::OpenTsdbBuilder) and driven by the
/// daemon through the [`Backend`] trait.  Each flush renders the snapshot
/// and hands the payload to the delivery thread; nothing here waits on the
/// network, and no delivery failure propagates back to the daemon.
pub struct OpenTsdbBackend {
    writer: PayloadWriter,
    forwarder: Option<ForwarderHandle>,
    health: Arc<DeliveryHealth>,
    debug: bool,
}

impl OpenTsdbBackend {
    pub(crate) fn new(
        writer: PayloadWriter,
        forwarder: Option<ForwarderHandle>,
        health: Arc<DeliveryHealth>,
        debug: bool,
    ) -> OpenTsdbBackend {
        OpenTsdbBackend { writer, forwarder, health, debug }
    }

    /// Returns a handle to the delivery-health state.
    pub fn health(&self) -> Arc<DeliveryHealth> {
        Arc::clone(&self.health)
    }
}

impl Backend for OpenTsdbBackend {
    fn flush(&mut self, timestamp: u64, snapshot: &MetricsSnapshot) {
        let rendered = self.writer.render(timestamp, snapshot);
        if self.debug {
            debug!(
                num_stats = rendered.num_stats,
                payload = %rendered.text,
                "rendered flush payload"
            );
        }

        // Without a configured host the flush is a silent no-op on the
        // network side.
        if let Some(forwarder) = &self.forwarder {
            forwarder.deliver(rendered.text);
        }
    }

    fn status(&self, write: &mut dyn FnMut(&str, &str, u64)) {
        write("opentsdb", "last_flush", self.health.last_flush());
        write("opentsdb", "last_exception", self.health.last_exception());
    }
}
