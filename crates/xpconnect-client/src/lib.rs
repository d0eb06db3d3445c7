//! XPConnect Client Library
//!
//! Async connector for the X-Plane UDP dataref protocol.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use xpconnect_client::XPlaneConnector;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let xp = Arc::new(XPlaneConnector::builder().host("127.0.0.1").build()?);
//!
//!     xp.subscribe_path("sim/cockpit2/gauges/indicators/compass_heading_deg_mag", 5, |e, v| {
//!         println!("{} = {}", e.path(), v);
//!     })?;
//!
//!     let runner = xp.clone();
//!     tokio::spawn(async move { runner.start().await });
//!
//!     tokio::time::sleep(Duration::from_secs(10)).await;
//!     xp.stop(Duration::from_secs(5)).await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod command;
pub mod config;
pub mod connector;
pub mod error;
pub mod transport;

pub use builder::XPlaneConnectorBuilder;
pub use command::{Command, CommandHandle};
pub use config::ConnectorConfig;
pub use connector::{ConnectorState, XPlaneConnector};
pub use error::{ClientError, Result};
pub use transport::{DatagramSink, UdpTransport};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::XPlaneConnectorBuilder;
    pub use crate::command::{Command, CommandHandle};
    pub use crate::config::ConnectorConfig;
    pub use crate::connector::{ConnectorState, XPlaneConnector};
    pub use crate::error::{ClientError, Result};
    pub use xpconnect_core::{DataRefElement, DataRefValue, StringDataRefElement};
}
