//! Event dispatch and validation
//!
//! The dispatcher is the single routing point between the wire protocol
//! and the rest of the system. Every decoded line passes through
//! [`Dispatcher::dispatch`], which:
//!
//! - appends accepted numeric samples to the shared [`SampleStore`]
//! - opportunistically updates the local gain/setpoint mirror when a
//!   sample lands on a tuning channel
//! - applies the glitch policy: values outside a channel's accepted
//!   range are discarded with a diagnostic, never an error
//! - forwards log text, telemetry packets and malformed lines to the
//!   event channel so the operator console can show them
//!
//! Nothing here is fatal. The wire format has no checksum, so implausible
//! values and unparseable lines are an expected operating condition and
//! the defined recovery is to log and drop.

use crate::config::{LinkConfig, ValueBounds};
use crate::link::LinkEvent;
use crate::protocol::{DecodedEvent, ReportId};
use crate::store::SharedSampleStore;
use crate::types::{LinkStats, PidGains, Sample};
use crossbeam_channel::Sender;
use std::collections::HashMap;

/// Routes decoded events to the sample store, gain mirror and sinks
pub struct Dispatcher {
    /// Shared sample buffer consumed by the presentation layer
    store: SharedSampleStore,
    /// Link-side mirror of the firmware's gains and setpoints
    mirror: PidGains,
    /// Set when the mirror changed since it was last published
    mirror_dirty: bool,
    /// Range applied to channels without an override
    default_bounds: ValueBounds,
    /// Per-channel range overrides
    overrides: HashMap<u8, ValueBounds>,
    /// Diagnostic and log sink
    events: Sender<LinkEvent>,
    /// Running counters
    stats: LinkStats,
}

impl Dispatcher {
    /// Create a dispatcher from the link configuration
    pub fn new(config: &LinkConfig, store: SharedSampleStore, events: Sender<LinkEvent>) -> Self {
        Self {
            store,
            mirror: PidGains::default(),
            mirror_dirty: false,
            default_bounds: config.dispatch.default_bounds,
            overrides: config.bounds_table(),
            events,
            stats: LinkStats::default(),
        }
    }

    /// Route one decoded event, timestamping samples with `now` (seconds
    /// since session start)
    pub fn dispatch(&mut self, event: DecodedEvent, now: f64) {
        match event {
            DecodedEvent::NumericSample { channel, value } => {
                self.dispatch_sample(channel, value, now);
            }
            DecodedEvent::LogText { text } => {
                self.stats.log_lines += 1;
                tracing::debug!("controller: {}", text);
                self.try_send_event(LinkEvent::LogLine(text));
            }
            DecodedEvent::RemoteTelemetry(telemetry) => {
                // Diagnostic path only; never reaches the sample store
                self.stats.telemetry_packets += 1;
                tracing::debug!("{}", telemetry);
                self.try_send_event(LinkEvent::Telemetry(telemetry));
            }
            DecodedEvent::Malformed { raw_line, reason } => {
                self.stats.malformed_lines += 1;
                let line = String::from_utf8_lossy(&raw_line).into_owned();
                tracing::warn!("Dropping malformed line ({}): {:?}", reason, line);
                self.try_send_event(LinkEvent::Malformed { line, reason });
            }
        }
    }

    fn dispatch_sample(&mut self, channel: ReportId, value: f64, now: f64) {
        let bounds = self.bounds_for(channel);
        if !bounds.contains(value) {
            self.stats.glitches_discarded += 1;
            tracing::debug!("Discarding glitch on {}: {}", channel, value);
            self.try_send_event(LinkEvent::GlitchDiscarded { channel, value });
            return;
        }

        self.store.append(channel, Sample::new(value, now));
        self.stats.samples_stored += 1;

        if let Some((pid, field)) = channel.gain_target() {
            if self.mirror.set(pid, field, value) {
                self.mirror_dirty = true;
            }
        }
    }

    /// The accepted range for one channel
    pub fn bounds_for(&self, channel: ReportId) -> ValueBounds {
        self.overrides
            .get(&channel.as_u8())
            .copied()
            .unwrap_or(self.default_bounds)
    }

    /// Change the accepted range for one channel, or the default range
    /// when `channel` is `None`
    pub fn set_bounds(&mut self, channel: Option<ReportId>, bounds: ValueBounds) {
        match channel {
            Some(channel) => {
                self.overrides.insert(channel.as_u8(), bounds);
            }
            None => self.default_bounds = bounds,
        }
    }

    /// The current gain mirror
    pub fn mirror(&self) -> &PidGains {
        &self.mirror
    }

    /// Take the mirror for publication if it changed since the last call
    pub fn take_mirror_update(&mut self) -> Option<PidGains> {
        if self.mirror_dirty {
            self.mirror_dirty = false;
            Some(self.mirror)
        } else {
            None
        }
    }

    /// Running counters
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Mutable access to the counters (for transport-level fields)
    pub fn stats_mut(&mut self) -> &mut LinkStats {
        &mut self.stats
    }

    /// Reset per-session state: mirror, counters and buffered samples
    pub fn begin_session(&mut self) {
        self.mirror.clear();
        self.mirror_dirty = false;
        self.stats = LinkStats::default();
        self.store.clear();
    }

    /// Try to send an event, counting it as dropped if the channel is full
    fn try_send_event(&mut self, event: LinkEvent) {
        if self.events.try_send(event).is_err() {
            self.stats.dropped_events += 1;
        }
    }
}
