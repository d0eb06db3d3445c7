//! Connector builder pattern

use std::sync::Arc;
use std::time::Duration;
use xpconnect_core::{Clock, SystemClock};

use crate::config::ConnectorConfig;
use crate::{Result, XPlaneConnector};

/// Builder for [`XPlaneConnector`]
pub struct XPlaneConnectorBuilder {
    config: ConnectorConfig,
    clock: Arc<dyn Clock>,
}

impl Default for XPlaneConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XPlaneConnectorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: ConnectorConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: ConnectorConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    /// Set the simulator IP
    pub fn host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    /// Set the simulator port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the local bind address
    pub fn bind_addr(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Set the staleness threshold
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.config.max_age = max_age;
        self
    }

    /// Set the staleness scan period
    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.config.check_interval = interval;
        self
    }

    /// Set the pause between repeated command sends
    pub fn command_interval(mut self, interval: Duration) -> Self {
        self.config.command_interval = interval;
        self
    }

    /// Set the receive buffer size
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = size;
        self
    }

    /// Make unknown ids fatal to the receive loop
    pub fn strict_decode(mut self, strict: bool) -> Self {
        self.config.strict_decode = strict;
        self
    }

    /// Measure staleness against a custom clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the connector (does not open the socket)
    pub fn build(self) -> Result<XPlaneConnector> {
        XPlaneConnector::with_clock(self.config, self.clock)
    }
}
