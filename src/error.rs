//! Error handling for the PID link layer
//!
//! This module defines the custom error type and a Result alias for use
//! throughout the crate. Frame-level problems (overlong lines, bad
//! payloads) are recovered locally by the codec and dispatcher and never
//! surface here; this type covers the errors that reach callers, which
//! are mostly resource acquisition and session state.

use thiserror::Error;

/// Main error type for PID link operations
#[derive(Error, Debug)]
pub enum PidLinkError {
    /// The requested serial port could not be opened
    #[error("Serial port unavailable: {0}")]
    PortUnavailable(String),

    /// A send was attempted while the link is not connected
    #[error("Not connected")]
    NotConnected,

    /// A line exceeded the maximum frame length before a newline arrived
    #[error("Frame exceeded {max} bytes before newline")]
    FrameTooLong { max: usize },

    /// Errors related to channel communication between threads
    #[error("Channel error: {0}")]
    Channel(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors from the underlying transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PID link operations
pub type Result<T> = std::result::Result<T, PidLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PidLinkError::PortUnavailable("COM9: no such port".to_string());
        assert_eq!(
            err.to_string(),
            "Serial port unavailable: COM9: no such port"
        );
    }

    #[test]
    fn test_frame_too_long_names_limit() {
        let err = PidLinkError::FrameTooLong { max: 1024 };
        assert!(err.to_string().contains("1024"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: PidLinkError = io.into();
        assert!(matches!(err, PidLinkError::Io(_)));
    }
}
