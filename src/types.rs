//! Core data types for the PID link layer
//!
//! This module contains the fundamental data structures used throughout
//! the crate for representing loops, samples, link state and serial
//! parameters.
//!
//! # Main Types
//!
//! - [`PidLoop`] / [`GainTerm`] - Identify one of the three control loops
//!   and one of its tunable terms
//! - [`PidGainSet`] / [`PidGains`] - Local mirror of the firmware's gain
//!   and setpoint values, filled in opportunistically from received samples
//! - [`Sample`] - A single timestamped channel value
//! - [`LinkState`] - Connection lifecycle state of the serial session
//! - [`LinkStats`] - Running counters for link activity and discards
//! - [`SessionClock`] - Session-scoped monotonic clock used to timestamp
//!   incoming samples
//! - [`SerialSettings`] - Port parameters (baud, data bits, parity, stop bits)

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Standard baud rates offered to the connection UI, highest-common first
pub const STANDARD_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115_200, 128_000, 153_600, 230_400, 250_000,
    256_000, 460_800, 921_600,
];

/// Default baud rate for the controller link
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// One of the three independent PID control loops on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PidLoop {
    /// First loop
    Pid1,
    /// Second loop
    Pid2,
    /// Third loop
    Pid3,
}

impl PidLoop {
    /// All loops, in wire order
    pub const ALL: [PidLoop; 3] = [PidLoop::Pid1, PidLoop::Pid2, PidLoop::Pid3];

    /// Zero-based index of this loop
    pub fn index(&self) -> usize {
        match self {
            PidLoop::Pid1 => 0,
            PidLoop::Pid2 => 1,
            PidLoop::Pid3 => 2,
        }
    }
}

impl std::fmt::Display for PidLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PidLoop::Pid1 => write!(f, "PID1"),
            PidLoop::Pid2 => write!(f, "PID2"),
            PidLoop::Pid3 => write!(f, "PID3"),
        }
    }
}

/// A tunable gain term of a PID loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GainTerm {
    /// Proportional gain
    Kp,
    /// Integral gain
    Ki,
    /// Derivative gain
    Kd,
}

impl std::fmt::Display for GainTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainTerm::Kp => write!(f, "Kp"),
            GainTerm::Ki => write!(f, "Ki"),
            GainTerm::Kd => write!(f, "Kd"),
        }
    }
}

/// A field of the per-loop gain mirror that a report channel can update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GainField {
    /// Proportional gain
    Kp,
    /// Integral gain
    Ki,
    /// Derivative gain
    Kd,
    /// Loop setpoint
    Setpoint,
}

/// Mirrored tuning values for one loop
///
/// Fields are `None` until the corresponding report has been received at
/// least once this session. The mirror is never validated beyond the
/// dispatcher's numeric range check.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidGainSet {
    /// Proportional gain
    pub kp: Option<f64>,
    /// Integral gain
    pub ki: Option<f64>,
    /// Derivative gain
    pub kd: Option<f64>,
    /// Loop setpoint
    pub setpoint: Option<f64>,
}

impl PidGainSet {
    /// Update one field, returning true if the stored value changed
    pub fn set(&mut self, field: GainField, value: f64) -> bool {
        let slot = match field {
            GainField::Kp => &mut self.kp,
            GainField::Ki => &mut self.ki,
            GainField::Kd => &mut self.kd,
            GainField::Setpoint => &mut self.setpoint,
        };
        if *slot == Some(value) {
            false
        } else {
            *slot = Some(value);
            true
        }
    }
}

/// Gain mirrors for all three loops
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidGains {
    loops: [PidGainSet; 3],
}

impl PidGains {
    /// Get the mirror for one loop
    pub fn get(&self, pid: PidLoop) -> &PidGainSet {
        &self.loops[pid.index()]
    }

    /// Get a mutable mirror for one loop
    pub fn get_mut(&mut self, pid: PidLoop) -> &mut PidGainSet {
        &mut self.loops[pid.index()]
    }

    /// Update one field of one loop, returning true if anything changed
    pub fn set(&mut self, pid: PidLoop, field: GainField, value: f64) -> bool {
        self.loops[pid.index()].set(field, value)
    }

    /// Forget all mirrored values (used on reconnect)
    pub fn clear(&mut self) {
        self.loops = [PidGainSet::default(); 3];
    }
}

/// A single timestamped value on one channel
///
/// Timestamps are seconds since session start, taken from the
/// [`SessionClock`] at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Decoded channel value
    pub value: f64,
    /// Seconds since session start
    pub timestamp: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(value: f64, timestamp: f64) -> Self {
        Self { value, timestamp }
    }
}

/// Connection lifecycle state of the link session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// No port is open
    #[default]
    Disconnected,
    /// A port open is in progress
    Connecting,
    /// The port is open and the link is live
    Connected,
    /// A disconnect was requested and the port is being torn down
    Closing,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Disconnected => write!(f, "Disconnected"),
            LinkState::Connecting => write!(f, "Connecting"),
            LinkState::Connected => write!(f, "Connected"),
            LinkState::Closing => write!(f, "Closing"),
        }
    }
}

/// Running counters for link activity
///
/// Sent to the presentation side periodically while connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Raw bytes read from the transport
    pub bytes_read: u64,
    /// Complete lines produced by the framer
    pub lines_decoded: u64,
    /// Overlong lines dropped during resynchronization
    pub frames_too_long: u64,
    /// Samples accepted into the sample store
    pub samples_stored: u64,
    /// Numeric values rejected by the range filter
    pub glitches_discarded: u64,
    /// Lines that failed to decode
    pub malformed_lines: u64,
    /// Controller log lines received
    pub log_lines: u64,
    /// Remote-telemetry diagnostic packets received
    pub telemetry_packets: u64,
    /// Frames written to the transport
    pub frames_sent: u64,
    /// Sends rejected or failed
    pub send_errors: u64,
    /// Events dropped because the event channel was full
    pub dropped_events: u64,
}

impl LinkStats {
    /// Fraction of decoded lines that produced a stored sample
    pub fn accept_rate(&self) -> f64 {
        if self.lines_decoded == 0 {
            1.0
        } else {
            self.samples_stored as f64 / self.lines_decoded as f64
        }
    }
}

/// Session-scoped monotonic clock
///
/// Replaces the original's hidden free-running static timer: the clock is
/// created per session, passed to the dispatcher explicitly, and reset on
/// reconnect so timestamps always count from the start of the current
/// session.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    /// Start a new clock at the current instant
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds elapsed since the session started
    pub fn now_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Restart the clock (on reconnect)
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataBits {
    /// 8 data bits
    #[default]
    Eight,
    /// 7 data bits
    Seven,
}

/// Parity checking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits
    Two,
}

/// Serial port parameters for a connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialSettings {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl std::fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = match self.data_bits {
            DataBits::Eight => '8',
            DataBits::Seven => '7',
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
        };
        let stop = match self.stop_bits {
            StopBits::One => '1',
            StopBits::Two => '2',
        };
        write!(f, "{} {}{}{}", self.baud_rate, data, parity, stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_set_tracks_changes() {
        let mut gains = PidGainSet::default();
        assert!(gains.set(GainField::Kp, 1.5));
        assert!(!gains.set(GainField::Kp, 1.5));
        assert!(gains.set(GainField::Kp, 2.0));
        assert_eq!(gains.kp, Some(2.0));
        assert_eq!(gains.ki, None);
    }

    #[test]
    fn test_pid_gains_per_loop() {
        let mut mirror = PidGains::default();
        mirror.set(PidLoop::Pid2, GainField::Setpoint, 3.25);

        assert_eq!(mirror.get(PidLoop::Pid2).setpoint, Some(3.25));
        assert_eq!(mirror.get(PidLoop::Pid1).setpoint, None);

        mirror.clear();
        assert_eq!(mirror.get(PidLoop::Pid2).setpoint, None);
    }

    #[test]
    fn test_session_clock_monotonic() {
        let clock = SessionClock::new();
        let a = clock.now_secs();
        let b = clock.now_secs();
        assert!(b >= a);
        assert!(a >= 0.0);
    }

    #[test]
    fn test_serial_settings_display() {
        assert_eq!(SerialSettings::default().to_string(), "115200 8N1");

        let odd = SerialSettings {
            baud_rate: 9600,
            data_bits: DataBits::Seven,
            parity: Parity::Odd,
            stop_bits: StopBits::Two,
        };
        assert_eq!(odd.to_string(), "9600 7O2");
    }

    #[test]
    fn test_accept_rate() {
        let mut stats = LinkStats::default();
        assert_eq!(stats.accept_rate(), 1.0);

        stats.lines_decoded = 10;
        stats.samples_stored = 8;
        assert!((stats.accept_rate() - 0.8).abs() < f64::EPSILON);
    }
}
