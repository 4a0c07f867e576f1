//! Line-level wire protocol: decode and encode
//!
//! A complete line (as produced by [`FrameCodec`](crate::protocol::FrameCodec))
//! decodes into exactly one [`DecodedEvent`]. Decoding never fails as an
//! error: anything the protocol cannot interpret becomes a
//! [`DecodedEvent::Malformed`] carrying the raw line and a reason, and the
//! dispatcher decides what to do with it. Incoming lines are always
//! interpreted against the inbound (report) ID space.
//!
//! No scaling is applied at decode time; values are handed on exactly as
//! the controller printed them.

use crate::protocol::ids::{CommandId, ReportId, LOG_ID, TELEMETRY_RANGE};
use crate::protocol::telemetry::{decode_telemetry, RemoteTelemetry};
use crate::protocol::frame::encode_frame;

/// Why a line failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeReason {
    /// The line had no ID byte at all
    Empty,
    /// The payload of a numeric channel did not parse as a float
    NotNumeric,
    /// The leading byte is not an ID the controller emits
    UnknownChannel,
}

impl std::fmt::Display for DecodeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeReason::Empty => write!(f, "empty line"),
            DecodeReason::NotNumeric => write!(f, "payload not numeric"),
            DecodeReason::UnknownChannel => write!(f, "unknown channel id"),
        }
    }
}

/// One decoded inbound line
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// A numeric report on one channel
    NumericSample {
        /// The report channel
        channel: ReportId,
        /// The decoded value, unscaled
        value: f64,
    },
    /// Controller log text, forwarded verbatim
    LogText {
        /// The log message
        text: String,
    },
    /// A remote-control diagnostic packet
    RemoteTelemetry(RemoteTelemetry),
    /// A line the protocol could not interpret
    Malformed {
        /// The raw line bytes, without the newline
        raw_line: Vec<u8>,
        /// Why decoding failed
        reason: DecodeReason,
    },
}

/// Decode one complete line (without its newline) into an event
pub fn decode_line(line: &[u8]) -> DecodedEvent {
    let Some((&id, payload)) = line.split_first() else {
        return DecodedEvent::Malformed {
            raw_line: Vec::new(),
            reason: DecodeReason::Empty,
        };
    };

    if id == LOG_ID {
        return DecodedEvent::LogText {
            text: String::from_utf8_lossy(payload).into_owned(),
        };
    }

    if TELEMETRY_RANGE.contains(&id) {
        return DecodedEvent::RemoteTelemetry(decode_telemetry(id, payload));
    }

    let Some(channel) = ReportId::from_u8(id) else {
        return DecodedEvent::Malformed {
            raw_line: line.to_vec(),
            reason: DecodeReason::UnknownChannel,
        };
    };

    // Firmware numeric payloads are plain ASCII decimals, possibly with a
    // stray carriage return before the newline
    let parsed = std::str::from_utf8(payload)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok());

    match parsed {
        Some(value) => DecodedEvent::NumericSample { channel, value },
        None => DecodedEvent::Malformed {
            raw_line: line.to_vec(),
            reason: DecodeReason::NotNumeric,
        },
    }
}

/// Encode an outbound command as a complete wire frame
///
/// Gain and setpoint writes carry `value` formatted as a plain decimal
/// string (optional sign, optional fractional part), which is what the
/// firmware's numeric parser accepts. Toggles and requests are encoded
/// bare.
pub fn encode_command(command: CommandId, value: Option<f64>) -> Vec<u8> {
    debug_assert_eq!(command.takes_value(), value.is_some());
    let payload = value.map(|v| v.to_string());
    encode_frame(command.as_u8(), payload.as_deref())
}
