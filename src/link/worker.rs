//! The link worker thread
//!
//! All serial I/O happens here. The worker owns the transport, the frame
//! codec and the dispatcher; the rest of the process talks to it only
//! through the command and event channels, so no lock is ever held
//! across a port operation.
//!
//! One pass of the main loop drains pending commands, pumps the
//! transport if connected, publishes gain-mirror updates, and emits a
//! stats snapshot at the configured cadence. While disconnected the loop
//! parks on the command channel instead of spinning.

use crate::config::{LinkConfig, ValueBounds};
use crate::dispatch::Dispatcher;
use crate::protocol::{decode_line, encode_command, CommandId, FrameCodec, ReportId};
use crate::store::SharedSampleStore;
use crate::types::{LinkState, SerialSettings, SessionClock};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(any(test, feature = "mock-link"))]
use super::mock::MockLink;
use super::transport::{list_ports, SerialLink, SerialPortLink};
use super::{LinkCommand, LinkEvent};

/// Transport read chunk size, matching the frame length limit
const READ_CHUNK: usize = 1024;

/// How long to park on the command channel while disconnected
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// The state machine driven by [`run`](LinkWorker::run)
pub(super) struct LinkWorker {
    config: LinkConfig,
    command_rx: Receiver<LinkCommand>,
    event_tx: Sender<LinkEvent>,
    running: Arc<AtomicBool>,
    link: Box<dyn SerialLink>,
    codec: FrameCodec,
    dispatcher: Dispatcher,
    store: SharedSampleStore,
    state: LinkState,
    clock: SessionClock,
    last_stats: Instant,
    read_buf: [u8; READ_CHUNK],
}

impl LinkWorker {
    pub(super) fn new(
        config: LinkConfig,
        command_rx: Receiver<LinkCommand>,
        event_tx: Sender<LinkEvent>,
        store: SharedSampleStore,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self::with_link(
            config,
            command_rx,
            event_tx,
            store,
            running,
            Box::new(SerialPortLink::new()),
        )
    }

    fn with_link(
        config: LinkConfig,
        command_rx: Receiver<LinkCommand>,
        event_tx: Sender<LinkEvent>,
        store: SharedSampleStore,
        running: Arc<AtomicBool>,
        link: Box<dyn SerialLink>,
    ) -> Self {
        let codec = FrameCodec::with_max_frame_len(config.link.max_frame_len);
        let dispatcher = Dispatcher::new(&config, store.clone(), event_tx.clone());
        Self {
            config,
            command_rx,
            event_tx,
            running,
            link,
            codec,
            dispatcher,
            store,
            state: LinkState::Disconnected,
            clock: SessionClock::new(),
            last_stats: Instant::now(),
            read_buf: [0; READ_CHUNK],
        }
    }

    /// Main worker loop; returns when asked to shut down or when the
    /// event receiver goes away
    pub(super) fn run(mut self) {
        tracing::info!("Link worker started");

        while self.running.load(Ordering::Relaxed) {
            if !self.process_commands() {
                break;
            }

            if self.state == LinkState::Connected {
                self.pump_reads();
                self.publish_updates();
            } else {
                // Nothing to pump; park until a command arrives
                match self.command_rx.recv_timeout(IDLE_WAIT) {
                    Ok(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        }

        if self.link.is_open() {
            self.link.close();
        }
        self.set_state(LinkState::Disconnected);
        let _ = self.event_tx.send(LinkEvent::Shutdown);
        tracing::info!("Link worker stopped");
    }

    /// Drain all pending commands; false means stop the loop
    fn process_commands(&mut self) -> bool {
        while let Ok(command) = self.command_rx.try_recv() {
            if !self.handle_command(command) {
                return false;
            }
        }
        true
    }

    fn handle_command(&mut self, command: LinkCommand) -> bool {
        match command {
            LinkCommand::Connect { port, settings } => self.handle_connect(&port, settings),
            LinkCommand::Disconnect => self.handle_disconnect(),
            LinkCommand::Send { command, value } => self.handle_send(command, value),
            LinkCommand::SetGlitchBounds { channel, bounds } => {
                self.handle_set_bounds(channel, bounds)
            }
            LinkCommand::ClearData => self.handle_clear_data(),
            LinkCommand::RefreshPorts => {
                self.send_event(LinkEvent::PortList(list_ports()));
            }
            LinkCommand::RequestStats => {
                self.send_event(LinkEvent::Stats(*self.dispatcher.stats()));
            }
            LinkCommand::Shutdown => return false,
            #[cfg(any(test, feature = "mock-link"))]
            LinkCommand::UseMockLink(enabled) => self.handle_use_mock(enabled),
        }
        true
    }

    fn handle_connect(&mut self, port: &str, settings: SerialSettings) {
        if self.link.is_open() {
            self.handle_disconnect();
        }
        self.set_state(LinkState::Connecting);

        let timeout = Duration::from_millis(self.config.link.read_timeout_ms);
        match self.link.open(port, &settings, timeout) {
            Ok(()) => {
                self.codec.reset();
                self.clock.reset();
                self.dispatcher.begin_session();
                self.last_stats = Instant::now();
                self.set_state(LinkState::Connected);
                tracing::info!("Connected to {} at {}", port, settings);

                // Prime the gain mirror immediately, like the original
                // console did on every connect
                self.write_frame(encode_command(CommandId::GetAllPidConfigs, None));
            }
            Err(e) => {
                tracing::warn!("Failed to open {}: {}", port, e);
                self.set_state(LinkState::Disconnected);
                self.send_event(LinkEvent::OpenFailed(e.to_string()));
            }
        }
    }

    fn handle_disconnect(&mut self) {
        if self.state == LinkState::Connected {
            self.set_state(LinkState::Closing);
        }
        self.link.close();
        self.store.clear();
        self.codec.reset();
        // Always announce, even when already disconnected, so the caller
        // can re-enable its connection controls unconditionally
        self.state = LinkState::Disconnected;
        self.send_event(LinkEvent::LinkState(LinkState::Disconnected));
    }

    fn handle_send(&mut self, command: CommandId, value: Option<f64>) {
        if self.state != LinkState::Connected {
            self.reject_send(format!("Cannot send {:?}: link is {}", command, self.state));
            return;
        }
        if command.takes_value() != value.is_some() {
            self.reject_send(format!(
                "Payload mismatch for {:?}: takes_value={}, value given={}",
                command,
                command.takes_value(),
                value.is_some()
            ));
            return;
        }
        self.write_frame(encode_command(command, value));
    }

    fn handle_set_bounds(&mut self, channel: Option<ReportId>, bounds: ValueBounds) {
        self.dispatcher.set_bounds(channel, bounds);
        match channel {
            Some(channel) => tracing::debug!(
                "Glitch bounds for {} set to [{}, {}]",
                channel,
                bounds.min,
                bounds.max
            ),
            None => tracing::debug!(
                "Default glitch bounds set to [{}, {}]",
                bounds.min,
                bounds.max
            ),
        }
    }

    fn handle_clear_data(&mut self) {
        self.clock.reset();
        self.dispatcher.begin_session();
    }

    #[cfg(any(test, feature = "mock-link"))]
    fn handle_use_mock(&mut self, enabled: bool) {
        if self.link.is_open() {
            self.handle_disconnect();
        }
        self.link = if enabled {
            tracing::info!("Switching to mock link");
            Box::new(MockLink::with_sample_pattern())
        } else {
            Box::new(SerialPortLink::new())
        };
    }

    /// Read and dispatch everything the transport has for us
    fn pump_reads(&mut self) {
        let n = match self.link.read(&mut self.read_buf) {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) => {
                // Unsolicited close: cable pulled or port vanished
                tracing::warn!("Transport read failed, closing link: {}", e);
                self.link.close();
                self.store.clear();
                self.codec.reset();
                self.set_state(LinkState::Disconnected);
                return;
            }
        };

        self.dispatcher.stats_mut().bytes_read += n as u64;
        let now = self.clock.now_secs();

        for line in self.codec.feed(&self.read_buf[..n]) {
            match line {
                Ok(line) => {
                    self.dispatcher.stats_mut().lines_decoded += 1;
                    self.dispatcher.dispatch(decode_line(&line), now);
                }
                Err(e) => {
                    self.dispatcher.stats_mut().frames_too_long += 1;
                    tracing::warn!("Resynchronizing: {}", e);
                }
            }
        }
    }

    /// Publish the gain mirror when it changed and stats at the
    /// configured cadence
    fn publish_updates(&mut self) {
        if let Some(gains) = self.dispatcher.take_mirror_update() {
            self.send_event(LinkEvent::Gains(gains));
        }

        let interval = Duration::from_millis(self.config.link.stats_interval_ms);
        if self.last_stats.elapsed() >= interval {
            self.last_stats = Instant::now();
            self.send_event(LinkEvent::Stats(*self.dispatcher.stats()));
        }
    }

    fn write_frame(&mut self, frame: Vec<u8>) {
        match self.link.write_all(&frame) {
            Ok(()) => self.dispatcher.stats_mut().frames_sent += 1,
            Err(e) => {
                tracing::warn!("Frame write failed: {}", e);
                self.reject_send(e.to_string());
            }
        }
    }

    fn reject_send(&mut self, reason: String) {
        self.dispatcher.stats_mut().send_errors += 1;
        self.send_event(LinkEvent::SendError(reason));
    }

    /// Record and announce a state change; no-op if the state is unchanged
    fn set_state(&mut self, state: LinkState) {
        if self.state == state {
            return;
        }
        tracing::debug!("Link state: {} -> {}", self.state, state);
        self.state = state;
        self.send_event(LinkEvent::LinkState(state));
    }

    fn send_event(&mut self, event: LinkEvent) {
        if self.event_tx.send(event).is_err() {
            // Receiver gone; let the loop wind down
            self.running.store(false, Ordering::Relaxed);
        }
    }
}
