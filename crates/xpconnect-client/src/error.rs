//! Client error types

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A send was attempted while no socket is open
    #[error("not ready: {0} requires a running connector")]
    NotReady(&'static str),

    #[error("connector already running")]
    AlreadyRunning,

    /// Background loops did not finish within the grace period
    #[error("shutdown timeout: loops still running after {timeout:?}")]
    ShutdownTimeout { timeout: Duration },

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("protocol error: {0}")]
    Protocol(#[source] xpconnect_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<xpconnect_core::Error> for ClientError {
    fn from(e: xpconnect_core::Error) -> Self {
        match e {
            xpconnect_core::Error::InvalidArgument(msg) => ClientError::InvalidArgument(msg),
            other => ClientError::Protocol(other),
        }
    }
}

impl ClientError {
    /// Id of the unknown element, if this is a protocol violation
    pub fn violating_id(&self) -> Option<i32> {
        match self {
            ClientError::Protocol(xpconnect_core::Error::ProtocolViolation { id }) => Some(*id),
            _ => None,
        }
    }
}
