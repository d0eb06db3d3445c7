//! X-Plane Datagram Codec
//!
//! Fixed-layout binary packets exchanged with the simulator over UDP.
//!
//! Every packet starts with a 4-byte ASCII header followed by typed fields:
//! little-endian `i32`, little-endian IEEE-754 `f32`, or null-terminated
//! strings. Request and value-set packets are zero-padded to a fixed total
//! length the simulator expects; commands and control packets are sent as-is.

use crate::{Error, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Packet headers
pub mod header {
    pub const RREF: &[u8; 4] = b"RREF";
    pub const DREF: &[u8; 4] = b"DREF";
    pub const CMND: &[u8; 4] = b"CMND";
    pub const QUIT: &[u8; 4] = b"QUIT";
    pub const FAIL: &[u8; 4] = b"FAIL";
    pub const RECO: &[u8; 4] = b"RECO";
}

/// Header length in bytes
pub const HEADER_LEN: usize = 4;

/// Bytes skipped before the first `(id, value)` pair of an inbound RREF
/// (header plus one separator byte)
pub const RREF_PREFIX_LEN: usize = 5;

/// Size of one inbound `(id, value)` pair
pub const RREF_PAIR_LEN: usize = 8;

/// Total length of an outbound RREF request
pub const RREF_REQUEST_LEN: usize = 413;

/// Total length of an outbound DREF value-set
pub const DREF_LEN: usize = 509;

// ============================================================================
// MESSAGES
// ============================================================================

/// Value carried by a DREF packet
#[derive(Debug, Clone, PartialEq)]
pub enum DataRefValue {
    Float(f32),
    String(String),
}

impl From<f32> for DataRefValue {
    fn from(v: f32) -> Self {
        DataRefValue::Float(v)
    }
}

impl From<String> for DataRefValue {
    fn from(v: String) -> Self {
        DataRefValue::String(v)
    }
}

impl From<&str> for DataRefValue {
    fn from(v: &str) -> Self {
        DataRefValue::String(v.to_string())
    }
}

/// Outbound packets
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Start (or with `frequency == 0`, stop) streaming a dataref under `id`
    Request { frequency: i32, id: i32, path: String },
    /// Set a dataref
    SetValue { path: String, value: DataRefValue },
    /// Issue a simulator command
    Command { command: String },
    /// Ask the simulator to shut down
    Quit,
    /// Fail a simulated system
    Fail { system: i32 },
    /// Recover a simulated system
    Recover { system: i32 },
}

impl Message {
    /// Stop-streaming request for `id`
    pub fn stop_request(id: i32, path: impl Into<String>) -> Self {
        Message::Request {
            frequency: 0,
            id,
            path: path.into(),
        }
    }

    /// 4-byte header this message is sent under
    pub fn header(&self) -> &'static [u8; 4] {
        match self {
            Message::Request { .. } => header::RREF,
            Message::SetValue { .. } => header::DREF,
            Message::Command { .. } => header::CMND,
            Message::Quit => header::QUIT,
            Message::Fail { .. } => header::FAIL,
            Message::Recover { .. } => header::RECO,
        }
    }

    /// Fixed total length, if this message kind is padded
    pub fn padded_len(&self) -> Option<usize> {
        match self {
            Message::Request { .. } => Some(RREF_REQUEST_LEN),
            Message::SetValue { .. } => Some(DREF_LEN),
            _ => None,
        }
    }
}

/// One streamed value from an inbound RREF packet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueUpdate {
    pub id: i32,
    pub value: f32,
}

// ============================================================================
// DATAGRAM BUILDER
// ============================================================================

/// Outbound packet under construction
#[derive(Debug, Clone)]
pub struct Datagram {
    buf: BytesMut,
}

impl Datagram {
    /// Start a packet with the given header
    pub fn new(header: &[u8; 4]) -> Self {
        let mut buf = BytesMut::with_capacity(DREF_LEN);
        buf.put_slice(header);
        Self { buf }
    }

    /// Append a little-endian `i32`
    pub fn put_i32(&mut self, v: i32) -> &mut Self {
        self.buf.put_i32_le(v);
        self
    }

    /// Append a little-endian `f32`
    pub fn put_f32(&mut self, v: f32) -> &mut Self {
        self.buf.put_f32_le(v);
        self
    }

    /// Append a null-terminated string
    pub fn put_str(&mut self, s: &str) -> Result<&mut Self> {
        if s.as_bytes().contains(&0) {
            return Err(Error::InvalidString(s.to_string()));
        }
        self.buf.put_slice(s.as_bytes());
        self.buf.put_u8(0);
        Ok(self)
    }

    /// Zero-pad to exactly `len` bytes
    pub fn fill_to(&mut self, len: usize) -> Result<&mut Self> {
        if self.buf.len() > len {
            return Err(Error::PayloadTooLarge {
                needed: self.buf.len(),
                limit: len,
            });
        }
        self.buf.resize(len, 0);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish the packet
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Encode an outbound message
pub fn encode(message: &Message) -> Result<Bytes> {
    let mut dg = Datagram::new(message.header());

    match message {
        Message::Request {
            frequency,
            id,
            path,
        } => {
            dg.put_i32(*frequency).put_i32(*id).put_str(path)?;
        }
        Message::SetValue { path, value } => {
            match value {
                DataRefValue::Float(v) => {
                    dg.put_f32(*v);
                }
                DataRefValue::String(s) => {
                    dg.put_str(s)?;
                }
            }
            dg.put_str(path)?;
        }
        Message::Command { command } => {
            dg.put_str(command)?;
        }
        Message::Quit => {}
        Message::Fail { system } | Message::Recover { system } => {
            dg.put_str(&system.to_string())?;
        }
    }

    if let Some(len) = message.padded_len() {
        dg.fill_to(len)?;
    }

    Ok(dg.freeze())
}

/// Pairs read from an inbound RREF packet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InboundValues {
    /// Every complete `(id, value)` pair, in packet order
    pub updates: Vec<ValueUpdate>,
    /// Bytes left after the last complete pair
    pub trailing: usize,
}

impl InboundValues {
    /// Fails if the packet ended in a partial pair
    pub fn check_complete(&self) -> Result<()> {
        if self.trailing == 0 {
            return Ok(());
        }
        Err(Error::Decode(format!(
            "RREF body ends in a partial (id, value) pair: {} trailing bytes after {} pairs",
            self.trailing,
            self.updates.len()
        )))
    }
}

/// Read the complete pairs of an inbound datagram
///
/// Returns `None` for anything that is not an RREF packet. A truncated tail
/// is not an error here; it is left in `trailing` so the complete pairs
/// before it can still be applied.
pub fn decode_values(bytes: &[u8]) -> Option<InboundValues> {
    if bytes.len() < HEADER_LEN || &bytes[..HEADER_LEN] != header::RREF {
        return None;
    }

    let mut body = bytes.get(RREF_PREFIX_LEN..).unwrap_or_default();
    let mut updates = Vec::with_capacity(body.len() / RREF_PAIR_LEN);
    while body.remaining() >= RREF_PAIR_LEN {
        let id = body.get_i32_le();
        let value = body.get_f32_le();
        updates.push(ValueUpdate { id, value });
    }

    Some(InboundValues {
        updates,
        trailing: body.remaining(),
    })
}

/// Decode an inbound datagram
///
/// Returns `Ok(None)` for anything that is not an RREF packet; those are
/// ignored rather than treated as errors. A body that is not a whole number
/// of pairs is a [`Error::Decode`].
pub fn decode(bytes: &[u8]) -> Result<Option<Vec<ValueUpdate>>> {
    match decode_values(bytes) {
        Some(values) => {
            values.check_complete()?;
            Ok(Some(values.updates))
        }
        None => Ok(None),
    }
}
