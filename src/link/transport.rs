//! Serial transport abstraction
//!
//! The worker talks to hardware through the [`SerialLink`] trait so tests
//! can substitute a mock for a real UART. [`SerialPortLink`] is the real
//! implementation over the `serialport` crate.

use crate::error::{PidLinkError, Result};
use crate::types::{DataBits, Parity, SerialSettings, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Byte-stream transport owned by the link worker
///
/// Implementations must be `Send` so the worker thread can own them.
/// `read` returning `Ok(0)` means no data arrived within the timeout, not
/// end of stream; a transport `Err` while connected is treated as an
/// unsolicited close by the caller.
pub trait SerialLink: Send {
    /// Open the named port with the given parameters
    ///
    /// Fails fast with [`PidLinkError::PortUnavailable`] if the port
    /// cannot be opened.
    fn open(&mut self, port: &str, settings: &SerialSettings, read_timeout: Duration)
        -> Result<()>;

    /// Close the port; safe to call when already closed
    fn close(&mut self);

    /// Whether a port is currently open
    fn is_open(&self) -> bool;

    /// Read available bytes, waiting at most the configured timeout
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write one complete frame
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Real serial port transport
#[derive(Default)]
pub struct SerialPortLink {
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialPortLink {
    /// Create a closed transport
    pub fn new() -> Self {
        Self::default()
    }
}

impl SerialLink for SerialPortLink {
    fn open(
        &mut self,
        port: &str,
        settings: &SerialSettings,
        read_timeout: Duration,
    ) -> Result<()> {
        self.close();

        let data_bits = match settings.data_bits {
            DataBits::Eight => serialport::DataBits::Eight,
            DataBits::Seven => serialport::DataBits::Seven,
        };
        let parity = match settings.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };
        let stop_bits = match settings.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        };

        let opened = serialport::new(port, settings.baud_rate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(read_timeout)
            .open()
            .map_err(|e| PidLinkError::PortUnavailable(format!("{}: {}", port, e)))?;

        self.port = Some(opened);
        Ok(())
    }

    fn close(&mut self) {
        self.port = None;
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(PidLinkError::NotConnected)?;
        match port.read(buf) {
            Ok(n) => Ok(n),
            Err(e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(PidLinkError::NotConnected)?;
        port.write_all(bytes)?;
        Ok(())
    }
}

/// List the system's serial port names for the connection UI
pub fn list_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            tracing::warn!("Serial port enumeration failed: {}", e);
            Vec::new()
        }
    }
}
