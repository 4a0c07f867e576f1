//! Wire command and channel identifiers
//!
//! The protocol uses a single leading byte to identify each frame, but
//! the byte means different things depending on direction: the same
//! numeric value names a report when it arrives from the controller and a
//! command when it is sent to it. The two ID spaces are therefore kept as
//! two distinct enums, [`ReportId`] (inbound) and [`CommandId`]
//! (outbound), so a frame can never be interpreted against the wrong
//! direction.
//!
//! # Reserved bytes
//!
//! ID 0 and the newline byte (10) are frame delimiters and are absent
//! from both spaces. IDs 100-120 inbound are the remote-telemetry
//! diagnostic range, handled by the telemetry sub-decoder rather than
//! this enum.

use crate::types::{GainField, GainTerm, PidLoop};
use std::ops::RangeInclusive;

/// Inbound ID of controller log text frames
pub const LOG_ID: u8 = 255;

/// Inbound ID range reserved for remote-telemetry diagnostic packets
pub const TELEMETRY_RANGE: RangeInclusive<u8> = 100..=120;

/// The frame delimiter byte; never a valid leading ID
pub const FRAME_DELIMITER: u8 = b'\n';

/// An inbound channel: a report sent by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReportId {
    /// PID1 process variable
    Pid1Input = 1,
    /// PID1 controller output
    Pid1Output = 2,
    /// PID1 setpoint
    Pid1Setpoint = 3,
    /// PID2 process variable
    Pid2Input = 4,
    /// PID2 controller output
    Pid2Output = 5,
    /// PID2 setpoint
    Pid2Setpoint = 6,
    /// PID3 process variable
    Pid3Input = 7,
    /// PID3 controller output
    Pid3Output = 8,
    /// PID3 setpoint
    Pid3Setpoint = 9,
    // 10 is the newline delimiter
    /// PID1 proportional gain
    Pid1Kp = 11,
    /// PID1 integral gain
    Pid1Ki = 12,
    /// PID1 derivative gain
    Pid1Kd = 13,
    /// PID2 proportional gain
    Pid2Kp = 14,
    /// PID2 integral gain
    Pid2Ki = 15,
    /// PID2 derivative gain
    Pid2Kd = 16,
    /// PID3 proportional gain
    Pid3Kp = 17,
    /// PID3 integral gain
    Pid3Ki = 18,
    /// PID3 derivative gain
    Pid3Kd = 19,
    /// Main loop cycle time report
    NormalLoopTime = 20,
    /// Serial loop cycle time report
    SerialLoopTime = 21,
    /// Controller log text
    Log = 255,
}

impl ReportId {
    /// Decode a leading ID byte into a report channel
    ///
    /// Returns `None` for the reserved delimiter bytes, the telemetry
    /// range and any value the controller does not emit.
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            1 => ReportId::Pid1Input,
            2 => ReportId::Pid1Output,
            3 => ReportId::Pid1Setpoint,
            4 => ReportId::Pid2Input,
            5 => ReportId::Pid2Output,
            6 => ReportId::Pid2Setpoint,
            7 => ReportId::Pid3Input,
            8 => ReportId::Pid3Output,
            9 => ReportId::Pid3Setpoint,
            11 => ReportId::Pid1Kp,
            12 => ReportId::Pid1Ki,
            13 => ReportId::Pid1Kd,
            14 => ReportId::Pid2Kp,
            15 => ReportId::Pid2Ki,
            16 => ReportId::Pid2Kd,
            17 => ReportId::Pid3Kp,
            18 => ReportId::Pid3Ki,
            19 => ReportId::Pid3Kd,
            20 => ReportId::NormalLoopTime,
            21 => ReportId::SerialLoopTime,
            255 => ReportId::Log,
            _ => return None,
        })
    }

    /// The wire byte for this channel
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Which loop this channel belongs to, if any
    pub fn pid_loop(&self) -> Option<PidLoop> {
        match self.as_u8() {
            1..=3 | 11..=13 => Some(PidLoop::Pid1),
            4..=6 | 14..=16 => Some(PidLoop::Pid2),
            7..=9 | 17..=19 => Some(PidLoop::Pid3),
            _ => None,
        }
    }

    /// The gain-mirror field this channel updates, if any
    ///
    /// This is the single channel-to-field lookup that replaces the
    /// original console's per-widget ID matching: setpoint and gain
    /// reports feed the mirror, input/output and timing reports do not.
    pub fn gain_target(&self) -> Option<(PidLoop, GainField)> {
        let field = match self {
            ReportId::Pid1Setpoint | ReportId::Pid2Setpoint | ReportId::Pid3Setpoint => {
                GainField::Setpoint
            }
            ReportId::Pid1Kp | ReportId::Pid2Kp | ReportId::Pid3Kp => GainField::Kp,
            ReportId::Pid1Ki | ReportId::Pid2Ki | ReportId::Pid3Ki => GainField::Ki,
            ReportId::Pid1Kd | ReportId::Pid2Kd | ReportId::Pid3Kd => GainField::Kd,
            _ => return None,
        };
        self.pid_loop().map(|pid| (pid, field))
    }
}

impl TryFrom<u8> for ReportId {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        ReportId::from_u8(byte).ok_or(byte)
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReportId::Pid1Input => "PID1 input",
            ReportId::Pid1Output => "PID1 output",
            ReportId::Pid1Setpoint => "PID1 setpoint",
            ReportId::Pid2Input => "PID2 input",
            ReportId::Pid2Output => "PID2 output",
            ReportId::Pid2Setpoint => "PID2 setpoint",
            ReportId::Pid3Input => "PID3 input",
            ReportId::Pid3Output => "PID3 output",
            ReportId::Pid3Setpoint => "PID3 setpoint",
            ReportId::Pid1Kp => "PID1 Kp",
            ReportId::Pid1Ki => "PID1 Ki",
            ReportId::Pid1Kd => "PID1 Kd",
            ReportId::Pid2Kp => "PID2 Kp",
            ReportId::Pid2Ki => "PID2 Ki",
            ReportId::Pid2Kd => "PID2 Kd",
            ReportId::Pid3Kp => "PID3 Kp",
            ReportId::Pid3Ki => "PID3 Ki",
            ReportId::Pid3Kd => "PID3 Kd",
            ReportId::NormalLoopTime => "main loop time",
            ReportId::SerialLoopTime => "serial loop time",
            ReportId::Log => "log",
        };
        write!(f, "{}", name)
    }
}

/// An outbound channel: a command sent to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    /// Set PID1 proportional gain
    Pid1Kp = 1,
    /// Set PID1 integral gain
    Pid1Ki = 2,
    /// Set PID1 derivative gain
    Pid1Kd = 3,
    /// Set PID2 proportional gain
    Pid2Kp = 4,
    /// Set PID2 integral gain
    Pid2Ki = 5,
    /// Set PID2 derivative gain
    Pid2Kd = 6,
    /// Set PID3 proportional gain
    Pid3Kp = 7,
    /// Set PID3 integral gain
    Pid3Ki = 8,
    /// Set PID3 derivative gain
    Pid3Kd = 9,
    // 10 is the newline delimiter
    /// Set PID1 setpoint
    Pid1Setpoint = 11,
    /// Set PID2 setpoint
    Pid2Setpoint = 12,
    /// Set PID3 setpoint
    Pid3Setpoint = 13,
    /// Enable PID1 telemetry prints
    Pid1PrintsOn = 20,
    /// Disable PID1 telemetry prints
    Pid1PrintsOff = 21,
    /// Enable PID2 telemetry prints
    Pid2PrintsOn = 22,
    /// Disable PID2 telemetry prints
    Pid2PrintsOff = 23,
    /// Enable PID3 telemetry prints
    Pid3PrintsOn = 24,
    /// Disable PID3 telemetry prints
    Pid3PrintsOff = 25,
    /// Route gyro output to the motors
    GyroToMotorOn = 26,
    /// Stop routing gyro output to the motors
    GyroToMotorOff = 27,
    /// Request a full dump of all PID configurations
    GetAllPidConfigs = 28,
    /// Persist the current configuration to controller storage
    SaveToEeprom = 30,
    /// Request the controller uptime
    GetUptime = 31,
    /// Enable cycle-time diagnostic prints
    CycleTimePrintsOn = 32,
    /// Disable cycle-time diagnostic prints
    CycleTimePrintsOff = 33,
}

impl CommandId {
    /// The wire byte for this command
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Whether this command carries a numeric payload
    ///
    /// Gain and setpoint writes do; toggles and requests are bare.
    pub fn takes_value(&self) -> bool {
        matches!(self.as_u8(), 1..=9 | 11..=13)
    }

    /// The gain-write command for one loop and term
    pub fn gain(pid: PidLoop, term: GainTerm) -> Self {
        match (pid, term) {
            (PidLoop::Pid1, GainTerm::Kp) => CommandId::Pid1Kp,
            (PidLoop::Pid1, GainTerm::Ki) => CommandId::Pid1Ki,
            (PidLoop::Pid1, GainTerm::Kd) => CommandId::Pid1Kd,
            (PidLoop::Pid2, GainTerm::Kp) => CommandId::Pid2Kp,
            (PidLoop::Pid2, GainTerm::Ki) => CommandId::Pid2Ki,
            (PidLoop::Pid2, GainTerm::Kd) => CommandId::Pid2Kd,
            (PidLoop::Pid3, GainTerm::Kp) => CommandId::Pid3Kp,
            (PidLoop::Pid3, GainTerm::Ki) => CommandId::Pid3Ki,
            (PidLoop::Pid3, GainTerm::Kd) => CommandId::Pid3Kd,
        }
    }

    /// The setpoint-write command for one loop
    pub fn setpoint(pid: PidLoop) -> Self {
        match pid {
            PidLoop::Pid1 => CommandId::Pid1Setpoint,
            PidLoop::Pid2 => CommandId::Pid2Setpoint,
            PidLoop::Pid3 => CommandId::Pid3Setpoint,
        }
    }

    /// The telemetry-print toggle for one loop
    pub fn prints(pid: PidLoop, enabled: bool) -> Self {
        match (pid, enabled) {
            (PidLoop::Pid1, true) => CommandId::Pid1PrintsOn,
            (PidLoop::Pid1, false) => CommandId::Pid1PrintsOff,
            (PidLoop::Pid2, true) => CommandId::Pid2PrintsOn,
            (PidLoop::Pid2, false) => CommandId::Pid2PrintsOff,
            (PidLoop::Pid3, true) => CommandId::Pid3PrintsOn,
            (PidLoop::Pid3, false) => CommandId::Pid3PrintsOff,
        }
    }

    /// The gyro-to-motor mode toggle
    pub fn gyro_to_motor(enabled: bool) -> Self {
        if enabled {
            CommandId::GyroToMotorOn
        } else {
            CommandId::GyroToMotorOff
        }
    }

    /// The cycle-time diagnostic print toggle
    pub fn cycle_time_prints(enabled: bool) -> Self {
        if enabled {
            CommandId::CycleTimePrintsOn
        } else {
            CommandId::CycleTimePrintsOff
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_id_round_trips() {
        for byte in 0..=255u8 {
            if let Some(id) = ReportId::from_u8(byte) {
                assert_eq!(id.as_u8(), byte);
            }
        }
    }

    #[test]
    fn test_reserved_bytes_rejected() {
        assert!(ReportId::from_u8(0).is_none());
        assert!(ReportId::from_u8(FRAME_DELIMITER).is_none());
        assert_eq!(FRAME_DELIMITER, 10);
    }

    #[test]
    fn test_telemetry_range_not_reports() {
        for byte in TELEMETRY_RANGE {
            assert!(ReportId::from_u8(byte).is_none());
        }
    }

    #[test]
    fn test_gain_target_lookup() {
        assert_eq!(
            ReportId::Pid1Kp.gain_target(),
            Some((PidLoop::Pid1, GainField::Kp))
        );
        assert_eq!(
            ReportId::Pid3Setpoint.gain_target(),
            Some((PidLoop::Pid3, GainField::Setpoint))
        );
        assert_eq!(ReportId::Pid2Input.gain_target(), None);
        assert_eq!(ReportId::NormalLoopTime.gain_target(), None);
        assert_eq!(ReportId::Log.gain_target(), None);
    }

    #[test]
    fn test_loop_membership() {
        assert_eq!(ReportId::Pid2Output.pid_loop(), Some(PidLoop::Pid2));
        assert_eq!(ReportId::Pid3Ki.pid_loop(), Some(PidLoop::Pid3));
        assert_eq!(ReportId::SerialLoopTime.pid_loop(), None);
    }

    #[test]
    fn test_command_constructors() {
        assert_eq!(CommandId::gain(PidLoop::Pid2, GainTerm::Kd), CommandId::Pid2Kd);
        assert_eq!(CommandId::setpoint(PidLoop::Pid3), CommandId::Pid3Setpoint);
        assert_eq!(CommandId::prints(PidLoop::Pid1, false), CommandId::Pid1PrintsOff);
        assert_eq!(CommandId::gyro_to_motor(true), CommandId::GyroToMotorOn);
        assert_eq!(
            CommandId::cycle_time_prints(false),
            CommandId::CycleTimePrintsOff
        );
    }

    #[test]
    fn test_command_payload_rule() {
        assert!(CommandId::Pid1Kp.takes_value());
        assert!(CommandId::Pid3Setpoint.takes_value());
        assert!(!CommandId::GetAllPidConfigs.takes_value());
        assert!(!CommandId::SaveToEeprom.takes_value());
        assert!(!CommandId::Pid2PrintsOn.takes_value());
    }
}
