//! XPConnect Core
//!
//! Wire format and subscription bookkeeping for the X-Plane UDP dataref protocol.
//!
//! This crate provides:
//! - Datagram encoding/decoding ([`Message`], [`codec`])
//! - Scalar and string dataref elements ([`DataRefElement`], [`StringDataRefElement`])
//! - The id-keyed subscription registry ([`Registry`])
//! - An injectable time source ([`Clock`])

pub mod codec;
pub mod element;
pub mod error;
pub mod registry;
pub mod string_element;
pub mod time;

pub use codec::{
    decode, decode_values, encode, DataRefValue, Datagram, InboundValues, Message, ValueUpdate,
};
pub use element::{DataRefElement, ValueListener};
pub use error::{Error, Result};
pub use registry::Registry;
pub use string_element::{StringDataRefElement, StringListener};
pub use time::{Clock, ManualClock, SystemClock};

/// Default UDP port X-Plane listens on
pub const DEFAULT_XPLANE_PORT: u16 = 49000;

/// Default update rate requested for a dataref (updates per second)
pub const DEFAULT_FREQUENCY: i32 = 1;
