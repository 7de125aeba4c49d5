//! Foundational types and traits for statsd daemon backend adapters.
//!
//! A statsd-style daemon aggregates raw samples into counters, timers,
//! gauges, and sets, and periodically hands the aggregated view to one or
//! more *backends* for export.  This crate defines that seam:
//!
//! - [`MetricsSnapshot`]: the read-only, per-interval view of everything the
//!   daemon aggregated, keyed by metric name.
//! - [`Value`]: a numeric metric value that preserves the distinction
//!   between integer and floating-point representations.
//! - [`Backend`]: the trait a backend implements to receive flushes and
//!   answer status queries.
//! - [`Events`]: the registry the daemon drives, fanning each flush and
//!   status request out to every registered backend.
//!
//! Backends are expected to be fire-and-forget from the daemon's point of
//! view: a flush must never block the daemon's next cycle, and no delivery
//! error may propagate back through [`Backend::flush`].

mod backend;
pub use self::backend::{Backend, Events};

mod snapshot;
pub use self::snapshot::MetricsSnapshot;

mod value;
pub use self::value::Value;
