//! Error types for XPConnect

use thiserror::Error;

/// Result type alias for XPConnect core operations
pub type Result<T> = std::result::Result<T, Error>;

/// XPConnect core error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed input on a subscribe/unsubscribe/send call
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Inbound datagram referenced an id that is not registered
    #[error("protocol violation: id {id} not found in registry")]
    ProtocolViolation { id: i32 },

    /// Inbound datagram could not be parsed
    #[error("decode error: {0}")]
    Decode(String),

    /// Encoded content does not fit the fixed datagram length
    #[error("payload too large: {needed} bytes (limit {limit})")]
    PayloadTooLarge { needed: usize, limit: usize },

    /// String field cannot be carried as a null-terminated string
    #[error("invalid string field: {0:?}")]
    InvalidString(String),
}
