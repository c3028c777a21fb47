//! Shared types, error enum, and decoded vessel values for ais-core.

use serde::Serialize;
use thiserror::Error;

/// All errors produced by ais-core.
#[derive(Debug, Error)]
pub enum AisError {
    #[error("malformed sentence: {0}")]
    MalformedSentence(String),
    #[error("invalid armor character 0x{ch:02X} at payload offset {position}")]
    InvalidArmorChar { ch: u8, position: usize },
    #[error("no position fields in layout for message type {message_type}")]
    MissingFieldSpec { message_type: u32 },
    #[error("layout table error: {0}")]
    Layout(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AisError>;

/// Maritime Mobile Service Identity. 30 bits on the wire.
pub type Mmsi = u32;

/// Whole seconds on a monotonic clock.
pub type Timestamp = u64;

// ---------------------------------------------------------------------------
// Field positions
// ---------------------------------------------------------------------------

/// Bit offset and width of the message type field.
pub const MESSAGE_TYPE_FIELD: (usize, usize) = (0, 6);

/// Bit offset and width of the MMSI field (after the 2-bit repeat indicator).
pub const MMSI_FIELD: (usize, usize) = (8, 30);

/// Payload is the sixth comma-separated field of a sentence.
pub const PAYLOAD_FIELD_INDEX: usize = 5;

/// Fewest comma-separated fields a sentence may have and still carry a payload.
pub const MIN_SENTENCE_FIELDS: usize = PAYLOAD_FIELD_INDEX + 1;

// ---------------------------------------------------------------------------
// Decoded vessel
// ---------------------------------------------------------------------------

/// One position report decoded from a single sentence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Vessel {
    pub message_type: u32,
    pub mmsi: Mmsi,
    pub latitude: f64,
    pub longitude: f64,
}

impl Vessel {
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl std::fmt::Display for Vessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "type={} mmsi={} lat={:.6} lon={:.6}",
            self.message_type, self.mmsi, self.latitude, self.longitude
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
