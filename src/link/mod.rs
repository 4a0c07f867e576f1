//! Link module for serial communication with the controller
//!
//! This module handles all serial I/O in a separate thread to keep the
//! operator console responsive. It uses crossbeam channels for
//! thread-safe communication with the presentation side.
//!
//! # Architecture
//!
//! The link worker runs in its own thread, communicating via channels:
//!
//! - [`LinkCommand`] - Messages sent to the worker (connect, send, clear, etc.)
//! - [`LinkEvent`] - Messages sent from the worker (state, gains, diagnostics)
//! - [`LinkHandle`] - Caller-side handle for sending commands and receiving events
//! - [`SerialBackend`] - Entry point that owns the channels and runs the worker
//!
//! High-rate sample data does not travel on the event channel: the worker
//! appends accepted samples to the shared [`SampleStore`](crate::store::SampleStore)
//! and the consumer drains it with [`LinkHandle::take_samples`].
//!
//! # Components
//!
//! - [`SerialLink`] - Transport trait over a raw byte stream
//! - [`SerialPortLink`] - Real serial port transport
//! - `MockLink` - Simulated controller for testing (feature-gated)
//!
//! # Example
//!
//! ```ignore
//! use pidlink_rs::config::LinkConfig;
//! use pidlink_rs::link::{LinkEvent, SerialBackend};
//! use pidlink_rs::types::{PidLoop, GainTerm, SerialSettings};
//!
//! let config = LinkConfig::default();
//! let (backend, handle) = SerialBackend::new(config);
//!
//! // Spawn the worker thread
//! std::thread::spawn(move || backend.run());
//!
//! handle.connect("/dev/ttyUSB0", SerialSettings::default());
//! handle.set_gain(PidLoop::Pid1, GainTerm::Kp, 4.5);
//!
//! for event in handle.drain() {
//!     match event {
//!         LinkEvent::Gains(gains) => {
//!             // Update the tuning display
//!         }
//!         _ => {}
//!     }
//! }
//!
//! // Accepted samples accumulate in the shared store
//! let batch = handle.take_samples();
//! ```

#[cfg(any(test, feature = "mock-link"))]
pub mod mock;
pub mod transport;
pub(crate) mod worker;

#[cfg(feature = "mock-link")]
pub use mock::MockLink;
pub use transport::{list_ports, SerialLink, SerialPortLink};

use crate::config::{LinkConfig, ValueBounds};
use crate::error::{PidLinkError, Result};
use crate::protocol::{CommandId, DecodeReason, RemoteTelemetry, ReportId};
use crate::store::{SampleBatch, SampleStore, SharedSampleStore};
use crate::types::{GainTerm, LinkState, LinkStats, PidGains, PidLoop, SerialSettings};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use worker::LinkWorker;

/// Message sent to the link worker
#[derive(Debug, Clone)]
pub enum LinkCommand {
    /// Open a serial port and start the session
    Connect {
        /// Port name, as returned by [`list_ports`]
        port: String,
        /// Port parameters for this connection
        settings: SerialSettings,
    },
    /// Close the current port
    Disconnect,
    /// Write one command frame to the controller
    Send {
        /// The command to send
        command: CommandId,
        /// Numeric payload for gain and setpoint writes, `None` otherwise
        value: Option<f64>,
    },
    /// Change the accepted value range for one channel, or the default
    /// range when `channel` is `None`
    SetGlitchBounds {
        /// The channel to override, or `None` for the default
        channel: Option<ReportId>,
        /// The new accepted range
        bounds: ValueBounds,
    },
    /// Drop buffered samples and restart the session clock
    ClearData,
    /// Request a fresh serial port list (answered with [`LinkEvent::PortList`])
    RefreshPorts,
    /// Request an immediate stats snapshot
    RequestStats,
    /// Stop the worker
    Shutdown,
    /// Swap the transport for a simulated controller (only available with
    /// the mock-link feature)
    #[cfg(any(test, feature = "mock-link"))]
    UseMockLink(bool),
}

/// Message sent from the link worker
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Connection lifecycle state changed
    LinkState(LinkState),
    /// A connect attempt failed
    OpenFailed(String),
    /// A send was rejected or failed
    SendError(String),
    /// Controller log text
    LogLine(String),
    /// Remote-control diagnostic packet
    Telemetry(RemoteTelemetry),
    /// A numeric value was rejected by the range filter
    GlitchDiscarded {
        /// The channel the value arrived on
        channel: ReportId,
        /// The rejected value
        value: f64,
    },
    /// A line could not be decoded
    Malformed {
        /// The offending line, lossily decoded for display
        line: String,
        /// Why decoding failed
        reason: DecodeReason,
    },
    /// The gain mirror changed
    Gains(PidGains),
    /// Periodic stats snapshot
    Stats(LinkStats),
    /// Serial port list (response to [`LinkCommand::RefreshPorts`])
    PortList(Vec<String>),
    /// The worker is shutting down
    Shutdown,
}

/// Caller-side handle for the link worker
pub struct LinkHandle {
    /// Receiver for worker events
    pub receiver: Receiver<LinkEvent>,
    /// Sender for commands to the worker
    pub command_sender: Sender<LinkCommand>,
    /// Shared sample store drained by [`take_samples`](Self::take_samples)
    store: SharedSampleStore,
}

impl LinkHandle {
    /// Try to receive one event without blocking
    pub fn try_recv(&self) -> Option<LinkEvent> {
        self.receiver.try_recv().ok()
    }

    /// Block for the next event, up to `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Result<LinkEvent> {
        self.receiver
            .recv_timeout(timeout)
            .map_err(|e| PidLinkError::Channel(e.to_string()))
    }

    /// Receive all pending events
    pub fn drain(&self) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Send a command to the worker
    pub fn send_command(&self, command: LinkCommand) -> bool {
        self.command_sender.send(command).is_ok()
    }

    /// Atomically take everything accumulated since the last call
    pub fn take_samples(&self) -> SampleBatch {
        self.store.snapshot_and_clear()
    }

    /// The shared sample store
    pub fn store(&self) -> &SharedSampleStore {
        &self.store
    }

    /// Request a connection
    pub fn connect(&self, port: impl Into<String>, settings: SerialSettings) {
        let _ = self.command_sender.send(LinkCommand::Connect {
            port: port.into(),
            settings,
        });
    }

    /// Request disconnection
    pub fn disconnect(&self) {
        let _ = self.command_sender.send(LinkCommand::Disconnect);
    }

    /// Send one command frame
    pub fn send(&self, command: CommandId, value: Option<f64>) {
        let _ = self.command_sender.send(LinkCommand::Send { command, value });
    }

    /// Write one gain term of one loop
    pub fn set_gain(&self, pid: PidLoop, term: GainTerm, value: f64) {
        self.send(CommandId::gain(pid, term), Some(value));
    }

    /// Write the setpoint of one loop
    pub fn set_setpoint(&self, pid: PidLoop, value: f64) {
        self.send(CommandId::setpoint(pid), Some(value));
    }

    /// Toggle telemetry prints for one loop
    pub fn set_prints_enabled(&self, pid: PidLoop, enabled: bool) {
        self.send(CommandId::prints(pid, enabled), None);
    }

    /// Toggle gyro-to-motor routing
    pub fn set_gyro_to_motor(&self, enabled: bool) {
        self.send(CommandId::gyro_to_motor(enabled), None);
    }

    /// Toggle cycle-time diagnostic prints
    pub fn set_cycle_time_prints(&self, enabled: bool) {
        self.send(CommandId::cycle_time_prints(enabled), None);
    }

    /// Request a full dump of the controller's PID configuration
    pub fn request_config_dump(&self) {
        self.send(CommandId::GetAllPidConfigs, None);
    }

    /// Persist the controller's configuration to its storage
    pub fn save_to_eeprom(&self) {
        self.send(CommandId::SaveToEeprom, None);
    }

    /// Request the controller uptime
    pub fn request_uptime(&self) {
        self.send(CommandId::GetUptime, None);
    }

    /// Change the accepted value range for one channel (or the default)
    pub fn set_glitch_bounds(&self, channel: Option<ReportId>, bounds: ValueBounds) {
        let _ = self
            .command_sender
            .send(LinkCommand::SetGlitchBounds { channel, bounds });
    }

    /// Drop buffered samples and restart the session clock
    pub fn clear_data(&self) {
        let _ = self.command_sender.send(LinkCommand::ClearData);
    }

    /// Request a fresh serial port list
    pub fn refresh_ports(&self) {
        let _ = self.command_sender.send(LinkCommand::RefreshPorts);
    }

    /// Request an immediate stats snapshot
    pub fn request_stats(&self) {
        let _ = self.command_sender.send(LinkCommand::RequestStats);
    }

    /// Set whether to use the simulated controller (only available with
    /// the mock-link feature)
    #[cfg(any(test, feature = "mock-link"))]
    pub fn use_mock_link(&self, use_mock: bool) {
        let _ = self.command_sender.send(LinkCommand::UseMockLink(use_mock));
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(LinkCommand::Shutdown);
    }
}

/// The serial link backend that runs in a separate thread
pub struct SerialBackend {
    /// Configuration
    config: LinkConfig,
    /// Receiver for commands from the caller
    command_receiver: Receiver<LinkCommand>,
    /// Sender for events to the caller
    event_sender: Sender<LinkEvent>,
    /// Shared sample store
    store: SharedSampleStore,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl SerialBackend {
    /// Create a new backend with communication channels
    pub fn new(config: LinkConfig) -> (Self, LinkHandle) {
        let (command_tx, command_rx) = bounded(256);
        // Bounded for backpressure; at the controller's print rates a few
        // thousand events covers several seconds of consumer stall
        let (event_tx, event_rx) = bounded(10_000);
        let store = SampleStore::shared();

        let backend = Self {
            config,
            command_receiver: command_rx,
            event_sender: event_tx,
            store: store.clone(),
            running: Arc::new(AtomicBool::new(true)),
        };

        let handle = LinkHandle {
            receiver: event_rx,
            command_sender: command_tx,
            store,
        };

        (backend, handle)
    }

    /// Run the worker loop; blocks until shutdown
    pub fn run(self) {
        let worker = LinkWorker::new(
            self.config,
            self.command_receiver,
            self.event_sender,
            self.store,
            self.running,
        );
        worker.run();
    }

    /// Get a handle to stop the backend
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};

    #[test]
    fn test_backend_creation() {
        let (backend, handle) = SerialBackend::new(LinkConfig::default());

        assert!(backend.running.load(Ordering::SeqCst));
        assert!(handle.send_command(LinkCommand::Shutdown));
    }

    #[test]
    fn test_handle_commands_never_block() {
        let (_backend, handle) = SerialBackend::new(LinkConfig::default());

        handle.connect("/dev/ttyUSB0", SerialSettings::default());
        handle.set_gain(PidLoop::Pid1, GainTerm::Kp, 4.5);
        handle.set_setpoint(PidLoop::Pid2, -3.0);
        handle.set_prints_enabled(PidLoop::Pid3, true);
        handle.request_config_dump();
        handle.clear_data();
        handle.disconnect();
        handle.shutdown();
    }

    #[test]
    fn test_mock_session_end_to_end() {
        let (backend, handle) = SerialBackend::new(LinkConfig::default());
        let thread = std::thread::spawn(move || backend.run());

        handle.use_mock_link(true);
        handle.connect("mock0", SerialSettings::default());

        // The mock generates samples continuously once connected
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut connected = false;
        let mut got_gains = false;
        let mut got_samples = false;
        while Instant::now() < deadline && !(connected && got_gains && got_samples) {
            for event in handle.drain() {
                match event {
                    LinkEvent::LinkState(LinkState::Connected) => connected = true,
                    LinkEvent::Gains(_) => got_gains = true,
                    _ => {}
                }
            }
            if !handle.take_samples().is_empty() {
                got_samples = true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(connected, "mock link never connected");
        assert!(got_gains, "gain mirror never published");
        assert!(got_samples, "no samples reached the store");

        handle.disconnect();
        handle.shutdown();
        thread.join().unwrap();
    }
}
