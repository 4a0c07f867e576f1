//! Mock transport for testing without hardware
//!
//! `MockLink` simulates enough of the controller firmware to exercise the
//! whole link stack: it answers a config-dump command with one gain
//! report per loop and term, can generate a continuous sine pattern of
//! PID samples, and can be scripted to fail opens or reads.
//!
//! The mock is `Clone`; clones share state, so a test can keep a handle
//! for scripting and inspection after moving the other clone into the
//! worker.
//!
//! # Enabling
//!
//! Available to unit tests unconditionally and to dependents when the
//! `mock-link` feature is enabled:
//!
//! ```bash
//! cargo test --features mock-link
//! ```

use crate::error::{PidLinkError, Result};
use crate::protocol::{CommandId, ReportId};
use crate::types::SerialSettings;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::transport::SerialLink;

/// Amplitude of the generated sample pattern, well inside the glitch window
const PATTERN_AMPLITUDE: f64 = 2.5;

/// Phase advance per generated sample round
const PATTERN_STEP: f64 = 0.1;

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    fail_open: Option<String>,
    fail_next_read: bool,
    sample_pattern: bool,
    phase: f64,
    inbound: VecDeque<u8>,
    written: Vec<Vec<u8>>,
}

impl MockState {
    fn push_line(&mut self, id: u8, payload: &str) {
        self.inbound.push_back(id);
        self.inbound.extend(payload.as_bytes());
        self.inbound.push_back(b'\n');
    }

    /// One gain report per loop and term, like the firmware's config dump
    fn queue_config_dump(&mut self) {
        let gains = [
            (ReportId::Pid1Kp, ReportId::Pid1Ki, ReportId::Pid1Kd, ReportId::Pid1Setpoint),
            (ReportId::Pid2Kp, ReportId::Pid2Ki, ReportId::Pid2Kd, ReportId::Pid2Setpoint),
            (ReportId::Pid3Kp, ReportId::Pid3Ki, ReportId::Pid3Kd, ReportId::Pid3Setpoint),
        ];
        for (i, (kp, ki, kd, setpoint)) in gains.into_iter().enumerate() {
            let loop_offset = i as f64;
            self.push_line(kp.as_u8(), &(4.5 + loop_offset).to_string());
            self.push_line(ki.as_u8(), &0.25.to_string());
            self.push_line(kd.as_u8(), &1.75.to_string());
            self.push_line(setpoint.as_u8(), &(1.0 + loop_offset).to_string());
        }
    }

    /// One input/output/setpoint round per loop
    fn queue_sample_round(&mut self) {
        let channels = [
            (ReportId::Pid1Input, ReportId::Pid1Output, ReportId::Pid1Setpoint),
            (ReportId::Pid2Input, ReportId::Pid2Output, ReportId::Pid2Setpoint),
            (ReportId::Pid3Input, ReportId::Pid3Output, ReportId::Pid3Setpoint),
        ];
        for (i, (input, output, setpoint)) in channels.into_iter().enumerate() {
            let phase = self.phase + i as f64 * 0.5;
            self.push_line(input.as_u8(), &(PATTERN_AMPLITUDE * phase.sin()).to_string());
            self.push_line(output.as_u8(), &(PATTERN_AMPLITUDE * phase.cos()).to_string());
            self.push_line(setpoint.as_u8(), &(1.0 + i as f64).to_string());
        }
        self.phase += PATTERN_STEP;
    }
}

/// Simulated firmware endpoint implementing [`SerialLink`]
#[derive(Clone, Default)]
pub struct MockLink {
    state: Arc<Mutex<MockState>>,
}

impl MockLink {
    /// Create a silent mock (no generated samples)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that continuously generates PID sample lines
    pub fn with_sample_pattern() -> Self {
        let link = Self::new();
        link.set_sample_pattern(true);
        link
    }

    /// Enable or disable continuous sample generation
    pub fn set_sample_pattern(&self, enabled: bool) {
        self.lock().sample_pattern = enabled;
    }

    /// Make the next `open` call fail with the given reason
    pub fn set_fail_open(&self, reason: impl Into<String>) {
        self.lock().fail_open = Some(reason.into());
    }

    /// Make the next `read` call fail (simulates cable pull)
    pub fn set_fail_next_read(&self) {
        self.lock().fail_next_read = true;
    }

    /// Queue one inbound line (newline appended)
    pub fn push_line(&self, line: &[u8]) {
        let mut state = self.lock();
        state.inbound.extend(line);
        state.inbound.push_back(b'\n');
    }

    /// Queue raw inbound bytes with no framing added
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.lock().inbound.extend(bytes);
    }

    /// All frames written to the mock so far
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SerialLink for MockLink {
    fn open(&mut self, _port: &str, _settings: &SerialSettings, _read_timeout: Duration) -> Result<()> {
        let mut state = self.lock();
        if let Some(reason) = state.fail_open.take() {
            return Err(PidLinkError::PortUnavailable(reason));
        }
        state.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.lock().open = false;
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.lock();
        if !state.open {
            return Err(PidLinkError::NotConnected);
        }
        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "mock read failure").into());
        }
        if state.inbound.is_empty() && state.sample_pattern {
            state.queue_sample_round();
        }

        let n = buf.len().min(state.inbound.len());
        for slot in buf.iter_mut().take(n) {
            // n is bounded by the queue length
            *slot = state.inbound.pop_front().unwrap_or_default();
        }
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if !state.open {
            return Err(PidLinkError::NotConnected);
        }
        if bytes.first() == Some(&CommandId::GetAllPidConfigs.as_u8()) {
            state.queue_config_dump();
        }
        state.written.push(bytes.to_vec());
        Ok(())
    }
}
