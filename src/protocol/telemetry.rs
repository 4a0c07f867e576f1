//! Remote-control telemetry sub-decoder
//!
//! The controller forwards diagnostic packets from its handheld remote on
//! the inbound ID range 100-120. These are a debugging aid: they are
//! logged for the operator but never enter the sample store. Packet
//! payloads are raw bytes rather than ASCII numbers, so they get their
//! own decoder instead of the numeric path.

use std::ops::RangeInclusive;

/// Remote log text forwarded verbatim
pub const REMOTE_LOG: u8 = 100;
/// Packed button/direction control byte
pub const REMOTE_CONTROL_BYTE: u8 = 101;
/// Joystick X axis, one raw byte
pub const REMOTE_X_DATA: u8 = 102;
/// Joystick Y axis, one raw byte
pub const REMOTE_Y_DATA: u8 = 103;
/// C button state, one raw byte
pub const REMOTE_C_BTN: u8 = 104;
/// Z button state, one raw byte
pub const REMOTE_Z_BTN: u8 = 105;

/// The full inbound ID range reserved for remote telemetry
pub const REMOTE_RANGE: RangeInclusive<u8> = 100..=120;

/// Bit-field contents of a control-byte packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlByte {
    /// C button pressed
    pub btn_c: bool,
    /// Z button pressed
    pub btn_z: bool,
    /// Stick pushed left
    pub left: bool,
    /// Stick pushed right
    pub right: bool,
    /// Stick pushed up
    pub up: bool,
    /// Stick pushed down
    pub down: bool,
}

impl ControlByte {
    /// Unpack the six control bits from a raw packet byte
    pub fn from_byte(byte: u8) -> Self {
        Self {
            btn_c: byte & 0x01 != 0,
            btn_z: byte & 0x02 != 0,
            left: byte & 0x04 != 0,
            right: byte & 0x08 != 0,
            up: byte & 0x10 != 0,
            down: byte & 0x20 != 0,
        }
    }
}

/// A decoded remote-telemetry diagnostic packet
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteTelemetry {
    /// Log text from the remote
    Log(String),
    /// Packed button/direction state
    Control(ControlByte),
    /// Joystick X axis value
    AxisX(u8),
    /// Joystick Y axis value
    AxisY(u8),
    /// C button value
    ButtonC(u8),
    /// Z button value
    ButtonZ(u8),
    /// A packet in the telemetry range with an unassigned sub-ID
    Unknown {
        /// The sub-ID byte
        id: u8,
        /// First payload byte, zero if the payload was empty
        raw: u8,
    },
}

/// Decode a telemetry packet from its sub-ID and payload bytes
///
/// `id` must already be within [`REMOTE_RANGE`]; the caller performs the
/// range check as part of line decoding.
pub fn decode_telemetry(id: u8, payload: &[u8]) -> RemoteTelemetry {
    let raw = payload.first().copied().unwrap_or(0);
    match id {
        REMOTE_LOG => RemoteTelemetry::Log(String::from_utf8_lossy(payload).into_owned()),
        REMOTE_CONTROL_BYTE => RemoteTelemetry::Control(ControlByte::from_byte(raw)),
        REMOTE_X_DATA => RemoteTelemetry::AxisX(raw),
        REMOTE_Y_DATA => RemoteTelemetry::AxisY(raw),
        REMOTE_C_BTN => RemoteTelemetry::ButtonC(raw),
        REMOTE_Z_BTN => RemoteTelemetry::ButtonZ(raw),
        _ => RemoteTelemetry::Unknown { id, raw },
    }
}

impl std::fmt::Display for RemoteTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteTelemetry::Log(text) => write!(f, "remote log: {}", text),
            RemoteTelemetry::Control(c) => write!(
                f,
                "BtnC: {} BtnZ: {} Left: {} Right: {} Up: {} Dn: {}",
                c.btn_c as u8, c.btn_z as u8, c.left as u8, c.right as u8, c.up as u8, c.down as u8
            ),
            RemoteTelemetry::AxisX(v) => write!(f, "remote X: {}", v),
            RemoteTelemetry::AxisY(v) => write!(f, "remote Y: {}", v),
            RemoteTelemetry::ButtonC(v) => write!(f, "remote BtnC: {}", v),
            RemoteTelemetry::ButtonZ(v) => write!(f, "remote BtnZ: {}", v),
            RemoteTelemetry::Unknown { id, raw } => {
                write!(f, "remote packet {}: {}", id, raw)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_byte_bits() {
        let all = ControlByte::from_byte(0x3F);
        assert!(all.btn_c && all.btn_z && all.left && all.right && all.up && all.down);

        let none = ControlByte::from_byte(0x00);
        assert_eq!(
            none,
            ControlByte {
                btn_c: false,
                btn_z: false,
                left: false,
                right: false,
                up: false,
                down: false
            }
        );

        let c_and_up = ControlByte::from_byte(0x11);
        assert!(c_and_up.btn_c && c_and_up.up);
        assert!(!c_and_up.btn_z && !c_and_up.left && !c_and_up.right && !c_and_up.down);
    }

    #[test]
    fn test_decode_axis_packets() {
        assert_eq!(decode_telemetry(REMOTE_X_DATA, &[200]), RemoteTelemetry::AxisX(200));
        assert_eq!(decode_telemetry(REMOTE_Y_DATA, &[17]), RemoteTelemetry::AxisY(17));
        assert_eq!(decode_telemetry(REMOTE_C_BTN, &[1]), RemoteTelemetry::ButtonC(1));
        assert_eq!(decode_telemetry(REMOTE_Z_BTN, &[]), RemoteTelemetry::ButtonZ(0));
    }

    #[test]
    fn test_decode_remote_log() {
        let event = decode_telemetry(REMOTE_LOG, b"pairing ok");
        assert_eq!(event, RemoteTelemetry::Log("pairing ok".to_string()));
    }

    #[test]
    fn test_unassigned_sub_id() {
        let event = decode_telemetry(117, &[42]);
        assert_eq!(event, RemoteTelemetry::Unknown { id: 117, raw: 42 });
    }
}
