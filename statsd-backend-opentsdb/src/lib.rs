//! A statsd daemon backend that exports flushed metrics to [OpenTSDB][opentsdb].
//!
//! Once per flush interval the daemon hands the backend a
//! [`MetricsSnapshot`][statsd_backend_core::MetricsSnapshot]; the backend
//! renders it into OpenTSDB's line-oriented `put` protocol and delivers the
//! payload over a single transient TCP connection, then closes it.  Delivery
//! is fire-and-forget: there is no retry, no cross-cycle buffering, and no
//! failure ever propagates back into the daemon's flush cycle.  The only
//! record of delivery health is a pair of timestamps (`last_flush`,
//! `last_exception`) exposed through the status query.
//!
//! # Usage
//!
//! ```no_run
//! use statsd_backend_core::{Events, MetricsSnapshot};
//! use statsd_backend_opentsdb::{init, OpenTsdbConfig};
//!
//! let mut config = OpenTsdbConfig::default();
//! config.host = Some("tsdb.example.com".to_string());
//!
//! let mut events = Events::new();
//! assert!(init(1700000000, &config, &mut events));
//!
//! // Once per flush interval:
//! let snapshot = MetricsSnapshot::new();
//! events.flush(1700000010, &snapshot);
//! ```
//!
//! # Payload format
//!
//! One command per line, ASCII, newline-terminated:
//!
//! ```text
//! put <dotted.key.path> <unix-seconds> <value> [<tag>=<value> ...] <source-tag>
//! ```
//!
//! Key paths are namespaced per metric kind, either with the fixed legacy
//! scheme or composed from the configured prefixes.  Metric names may carry
//! embedded tag segments (marked by the configured tag-prefix token), which
//! are stripped from the key and emitted as `key=value` tags.  Every line
//! ends with `source=statsd`, or `instance=<name>` when an instance name is
//! configured.
//!
//! # Delivery semantics
//!
//! The backend renders on the daemon's thread but never connects there: the
//! payload is handed to a background thread that drives a nonblocking
//! connect-write-close sequence.  Connection failures are absorbed, recorded
//! in the health state, and traced when debug logging is enabled.  Without a
//! configured host, flushes render and are then discarded silently.
//!
//! [opentsdb]: http://opentsdb.net/
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod backend;
pub use self::backend::OpenTsdbBackend;

mod builder;
pub use self::builder::{init, BuildError, OpenTsdbBuilder};

mod config;
pub use self::config::{OpenTsdbConfig, OpenTsdbOptions};

mod filter;
pub use self::filter::MetricFilter;

mod forwarder;

mod health;
pub use self::health::DeliveryHealth;

mod namespace;
pub use self::namespace::Namespaces;

mod tags;
pub use self::tags::extract_tags;

mod writer;
pub use self::writer::{PayloadWriter, RenderedPayload};
