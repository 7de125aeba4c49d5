use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery-health state shared between the delivery path and the status
/// handler.
///
/// Two unix-second timestamps, both initialized to the daemon's startup
/// time.  Only the delivery path writes them; the status handler (or any
/// other observer holding the `Arc`) may read them at any time.  Sustained
/// delivery failure shows up as `last_exception` advancing every cycle
/// while `last_flush` stalls.
#[derive(Debug)]
pub struct DeliveryHealth {
    last_flush: AtomicU64,
    last_exception: AtomicU64,
}

impl DeliveryHealth {
    /// Creates the health state with both fields set to the startup time.
    pub fn new(startup_time: u64) -> DeliveryHealth {
        DeliveryHealth {
            last_flush: AtomicU64::new(startup_time),
            last_exception: AtomicU64::new(startup_time),
        }
    }

    /// Timestamp of the last successful delivery.
    pub fn last_flush(&self) -> u64 {
        self.last_flush.load(Ordering::Acquire)
    }

    /// Timestamp of the last failed delivery attempt.
    pub fn last_exception(&self) -> u64 {
        self.last_exception.load(Ordering::Acquire)
    }

    /// Records a successful delivery.
    pub fn record_success(&self, timestamp: u64) {
        self.last_flush.store(timestamp, Ordering::Release);
    }

    /// Records a failed delivery attempt.
    pub fn record_failure(&self, timestamp: u64) {
        self.last_exception.store(timestamp, Ordering::Release);
    }
}
