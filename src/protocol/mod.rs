//! Serial wire protocol for the controller link
//!
//! The controller multiplexes many numeric channels, log text and
//! remote-control telemetry over one byte stream using a minimal line
//! protocol: `<1-byte ID><ASCII payload><'\n'>`, with no length prefix,
//! checksum or escaping.
//!
//! # Layers
//!
//! - [`frame`] - byte stream to complete lines and back; owns no
//!   protocol semantics
//! - [`ids`] - the two direction-specific ID spaces ([`ReportId`] in,
//!   [`CommandId`] out)
//! - [`wire`] - line to [`DecodedEvent`] and command to frame
//! - [`telemetry`] - sub-decoder for the remote-control diagnostic range
//!
//! Decoding is total: malformed input becomes a
//! [`DecodedEvent::Malformed`] value, never a panic or error return.

pub mod frame;
pub mod ids;
pub mod telemetry;
pub mod wire;

pub use frame::{encode_frame, FrameCodec, DEFAULT_MAX_FRAME_LEN};
pub use ids::{CommandId, ReportId, FRAME_DELIMITER, LOG_ID, TELEMETRY_RANGE};
pub use telemetry::{ControlByte, RemoteTelemetry};
pub use wire::{decode_line, encode_command, DecodeReason, DecodedEvent};
