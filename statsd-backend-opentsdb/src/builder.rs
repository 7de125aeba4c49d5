use std::net::ToSocketAddrs;
use std::sync::Arc;

use statsd_backend_core::Events;
use thiserror::Error;
use tracing::error;

use crate::{
    backend::OpenTsdbBackend,
    config::{OpenTsdbConfig, OpenTsdbOptions},
    forwarder::{self, TrailerKeys},
    health::DeliveryHealth,
    namespace::Namespaces,
    writer::PayloadWriter,
};

/// Default OpenTSDB telnet-style ingestion port.
const DEFAULT_PORT: u16 = 4242;

/// Errors that could occur while building or installing the backend.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The configured host and port could not be resolved to an address.
    #[error("invalid remote address: {reason}")]
    InvalidRemoteAddress {
        /// Details about the resolution failure.
        reason: String,
    },

    /// Failed to spawn the background delivery thread.
    #[error("failed to spawn background delivery thread")]
    Backend,
}

/// Builder for the OpenTSDB backend.
///
/// Usually constructed from the daemon's parsed configuration with
/// [`OpenTsdbBuilder::from_config`]; the `with_*` methods exist for
/// programmatic setups and tests.
pub struct OpenTsdbBuilder {
    config: OpenTsdbConfig,
}

impl OpenTsdbBuilder {
    /// Creates a builder with an empty configuration: no host (delivery
    /// disabled), legacy namespaces, no tag extraction, no filtering.
    pub fn new() -> OpenTsdbBuilder {
        OpenTsdbBuilder { config: OpenTsdbConfig::default() }
    }

    /// Creates a builder from the backend's slice of the daemon config.
    pub fn from_config(config: &OpenTsdbConfig) -> OpenTsdbBuilder {
        OpenTsdbBuilder { config: config.clone() }
    }

    /// Sets the OpenTSDB host to deliver to.
    #[must_use]
    pub fn with_host<H: Into<String>>(mut self, host: H) -> OpenTsdbBuilder {
        self.config.host = Some(host.into());
        self
    }

    /// Sets the OpenTSDB port.
    ///
    /// Defaults to 4242.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> OpenTsdbBuilder {
        self.config.port = Some(port);
        self
    }

    /// Sets the token marking embedded tag segments in metric names.
    #[must_use]
    pub fn with_tag_prefix<P: Into<String>>(mut self, tag_prefix: P) -> OpenTsdbBuilder {
        self.config.tag_prefix = Some(tag_prefix.into());
        self
    }

    /// Sets the instance identifier used to tag every emitted line.
    #[must_use]
    pub fn with_instance_name<N: Into<String>>(mut self, instance_name: N) -> OpenTsdbBuilder {
        self.config.instance_name = Some(instance_name.into());
        self
    }

    /// Replaces the nested options group.
    #[must_use]
    pub fn with_options(mut self, options: OpenTsdbOptions) -> OpenTsdbBuilder {
        self.config.opentsdb = options;
        self
    }

    /// Builds the backend.
    ///
    /// `startup_time` (unix seconds) seeds both delivery-health timestamps.
    /// When a host is configured it is resolved here and the background
    /// delivery thread is spawned; without one, the backend renders every
    /// flush but never touches the network.
    pub fn build(self, startup_time: u64) -> Result<OpenTsdbBackend, BuildError> {
        let namespaces = Namespaces::resolve(&self.config.opentsdb);
        let writer = PayloadWriter::new(namespaces.clone(), &self.config);
        let health = Arc::new(DeliveryHealth::new(startup_time));

        let forwarder = match &self.config.host {
            None => None,
            Some(host) => {
                let port = self.config.port.unwrap_or(DEFAULT_PORT);
                let addr = (host.as_str(), port)
                    .to_socket_addrs()
                    .map_err(|e| BuildError::InvalidRemoteAddress { reason: e.to_string() })?
                    .next()
                    .ok_or_else(|| BuildError::InvalidRemoteAddress {
                        reason: format!("no addresses resolved for {}:{}", host, port),
                    })?;

                let trailer = TrailerKeys::from_namespaces(&namespaces);
                let handle = forwarder::spawn(addr, trailer, Arc::clone(&health))
                    .map_err(|_| BuildError::Backend)?;
                Some(handle)
            }
        };

        Ok(OpenTsdbBackend::new(writer, forwarder, health, self.config.debug))
    }

    /// Builds the backend and registers it with the daemon's event bus.
    pub fn install(self, startup_time: u64, events: &mut Events) -> Result<(), BuildError> {
        let backend = self.build(startup_time)?;
        events.register(Box::new(backend));
        Ok(())
    }
}

impl Default for OpenTsdbBuilder {
    fn default() -> Self {
        OpenTsdbBuilder::new()
    }
}

/// One-time setup entry point called by the host daemon.
///
/// Builds the backend from `config` and registers its flush and status
/// handlers with `events`.  Returns `false` with an error trace when the
/// backend could not be built; the daemon keeps running either way.
pub fn init(startup_time: u64, config: &OpenTsdbConfig, events: &mut Events) -> bool {
    match OpenTsdbBuilder::from_config(config).install(startup_time, events) {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "failed to initialize opentsdb backend");
            false
        }
    }
}
