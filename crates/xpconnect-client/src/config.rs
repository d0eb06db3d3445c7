//! Connector configuration

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use xpconnect_core::DEFAULT_XPLANE_PORT;

use crate::error::{ClientError, Result};

/// Connector settings
///
/// Deserializable from TOML; durations are given in milliseconds
/// (`max_age_ms`, `check_interval_ms`, `command_interval_ms`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// IP of the machine running X-Plane
    pub host: String,
    /// Port X-Plane listens on
    pub port: u16,
    /// Local bind address (ephemeral port by default)
    pub bind_addr: String,
    /// Age after which a dataref is requested again
    #[serde(rename = "max_age_ms", with = "millis")]
    pub max_age: Duration,
    /// Period of the staleness scan
    #[serde(rename = "check_interval_ms", with = "millis")]
    pub check_interval: Duration,
    /// Pause between repeated command sends; zero sends back-to-back
    #[serde(rename = "command_interval_ms", with = "millis")]
    pub command_interval: Duration,
    /// Receive buffer size
    pub recv_buffer_size: usize,
    /// Treat values for unknown ids as fatal to the receive loop
    pub strict_decode: bool,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_XPLANE_PORT,
            bind_addr: "0.0.0.0:0".to_string(),
            max_age: Duration::from_secs(5),
            check_interval: Duration::from_millis(1000),
            command_interval: Duration::from_millis(10),
            recv_buffer_size: 65536,
            strict_decode: false,
        }
    }
}

impl ConnectorConfig {
    /// Simulator endpoint
    pub fn remote_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            ClientError::InvalidArgument(format!("host {:?} is not an IP address", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.remote_addr()?;
        if self.check_interval.is_zero() {
            return Err(ClientError::InvalidArgument(
                "check interval must be non-zero".to_string(),
            ));
        }
        if self.recv_buffer_size == 0 {
            return Err(ClientError::InvalidArgument(
                "receive buffer size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
