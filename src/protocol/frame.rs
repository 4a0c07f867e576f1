//! Newline framing for the serial byte stream
//!
//! The wire format is one logical frame per line: a leading ID byte,
//! ASCII payload bytes, and a terminating newline. This module owns no
//! protocol semantics; it only turns an arbitrarily-chunked byte stream
//! into complete lines and back.
//!
//! # Resynchronization
//!
//! Incomplete trailing bytes are retained until the next [`FrameCodec::feed`]
//! call. If the retained prefix grows past the frame length limit without
//! a newline, the codec reports [`PidLinkError::FrameTooLong`] once,
//! discards the buffered prefix, and then drops everything up to and
//! including the next newline so the stream re-aligns on a frame
//! boundary. Partial frames are never handed downstream.

use crate::error::PidLinkError;
use crate::protocol::ids::FRAME_DELIMITER;

/// Default maximum frame length in bytes, matching the original console's
/// fixed read buffer
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024;

/// Stateful line framer for one link session
#[derive(Debug)]
pub struct FrameCodec {
    /// Bytes received since the last complete line
    buffer: Vec<u8>,
    /// Maximum line length before drop-and-resync
    max_frame_len: usize,
    /// Set after an overlong line until the next newline is consumed
    resyncing: bool,
}

impl FrameCodec {
    /// Create a codec with the default frame length limit
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a codec with a custom frame length limit
    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_len,
            resyncing: false,
        }
    }

    /// Feed raw bytes, returning an iterator over the complete lines they
    /// finish
    ///
    /// Lines are yielded without their trailing newline. The sequence of
    /// lines is independent of how the byte stream is split across `feed`
    /// calls.
    pub fn feed<'a>(&'a mut self, bytes: &[u8]) -> FrameIter<'a> {
        self.buffer.extend_from_slice(bytes);
        FrameIter { codec: self }
    }

    /// Drop all buffered state (on reconnect)
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.resyncing = false;
    }

    /// Number of buffered bytes awaiting a newline
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    fn next_line(&mut self) -> Option<Result<Vec<u8>, PidLinkError>> {
        if self.resyncing {
            match self.buffer.iter().position(|&b| b == FRAME_DELIMITER) {
                Some(pos) => {
                    self.buffer.drain(..=pos);
                    self.resyncing = false;
                }
                None => {
                    // Still inside the oversized frame; keep discarding
                    self.buffer.clear();
                    return None;
                }
            }
        }

        if let Some(pos) = self.buffer.iter().position(|&b| b == FRAME_DELIMITER) {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop(); // delimiter
            if line.len() > self.max_frame_len {
                // The limit applies per line, even when the whole
                // oversized frame arrived in one read
                return Some(Err(PidLinkError::FrameTooLong {
                    max: self.max_frame_len,
                }));
            }
            return Some(Ok(line));
        }

        if self.buffer.len() > self.max_frame_len {
            self.buffer.clear();
            self.resyncing = true;
            return Some(Err(PidLinkError::FrameTooLong {
                max: self.max_frame_len,
            }));
        }

        None
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the lines completed by one `feed` call
pub struct FrameIter<'a> {
    codec: &'a mut FrameCodec,
}

impl Iterator for FrameIter<'_> {
    type Item = Result<Vec<u8>, PidLinkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.codec.next_line()
    }
}

/// Encode one outgoing frame: ID byte, payload bytes, newline
///
/// `payload` is omitted entirely for zero-argument commands. The payload
/// must not itself contain a newline; the wire format has no escaping.
pub fn encode_frame(id: u8, payload: Option<&str>) -> Vec<u8> {
    debug_assert!(id != 0 && id != FRAME_DELIMITER);
    let payload = payload.unwrap_or("");
    debug_assert!(!payload.contains('\n'));

    let mut frame = Vec::with_capacity(1 + payload.len() + 1);
    frame.push(id);
    frame.extend_from_slice(payload.as_bytes());
    frame.push(FRAME_DELIMITER);
    frame
}
