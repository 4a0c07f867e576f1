//! # PidLink-RS: Serial PID Tuning Link
//!
//! The protocol and transport layer that links an operator console to an
//! embedded controller running three PID loops over a serial line. The
//! architecture separates the serial worker from the presentation
//! consumer: all I/O happens on a dedicated thread, and the two sides
//! share only channels and one sample store.
//!
//! ## Architecture
//!
//! - **Protocol**: Newline framing and the one-byte-ID wire format,
//!   decoded into typed events
//! - **Link**: The worker thread that owns the serial port, plus the
//!   command/event channels around it
//! - **Dispatch**: Glitch filtering, the gain mirror and routing of
//!   decoded events
//! - **Store**: The lock-guarded per-channel sample buffer the consumer
//!   drains on its own schedule
//!
//! ## Example
//!
//! ```ignore
//! use pidlink_rs::{
//!     config::LinkConfig,
//!     link::{LinkEvent, SerialBackend},
//!     types::{GainTerm, PidLoop, SerialSettings},
//! };
//!
//! let config = LinkConfig::load("link.toml").unwrap_or_default();
//! let (backend, handle) = SerialBackend::new(config);
//!
//! std::thread::spawn(move || backend.run());
//!
//! handle.refresh_ports();
//! handle.connect("/dev/ttyUSB0", SerialSettings::default());
//! handle.set_gain(PidLoop::Pid1, GainTerm::Kp, 4.5);
//!
//! loop {
//!     for event in handle.drain() {
//!         match event {
//!             LinkEvent::Gains(gains) => { /* update tuning display */ }
//!             LinkEvent::LogLine(text) => println!("controller: {}", text),
//!             _ => {}
//!         }
//!     }
//!     for (channel, samples) in handle.take_samples() {
//!         // append to plots
//!     }
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod link;
pub mod protocol;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{LinkConfig, ValueBounds};
pub use error::{PidLinkError, Result};
pub use link::{LinkCommand, LinkEvent, LinkHandle, SerialBackend};
pub use protocol::{CommandId, DecodedEvent, ReportId};
pub use store::{SampleBatch, SampleStore, SharedSampleStore};
pub use types::{GainTerm, LinkState, LinkStats, PidGains, PidLoop, Sample, SerialSettings};
