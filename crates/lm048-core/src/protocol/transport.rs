//! Serial transport
//!
//! Byte-level access to the module, behind a trait so protocol logic can
//! be exercised against a test double instead of real hardware.

use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

use super::{ProtocolError, MAX_LINE_LENGTH};

/// Blocking byte transport to the module.
///
/// Implementations handle the physical link only; command framing and
/// reply parsing are the session's concern. Every read is bounded by the
/// transport's configured timeout and fails with
/// [`ProtocolError::Timeout`] when it expires.
pub trait Transport {
    /// Write all bytes to the module.
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError>;

    /// Read exactly `buf.len()` bytes. A short read within the timeout
    /// window counts as a timeout.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError>;

    /// Read one newline-terminated line of text. The returned string
    /// keeps its trailing newline when one was received.
    fn read_line(&mut self) -> Result<String, ProtocolError>;

    /// Discard any bytes already buffered on the receive side.
    fn clear_input(&mut self) -> Result<(), ProtocolError>;

    /// Release the underlying handle. Subsequent I/O fails with
    /// [`ProtocolError::NotConnected`].
    fn close(&mut self) -> Result<(), ProtocolError>;
}

fn map_io_error(e: std::io::Error) -> ProtocolError {
    match e.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => ProtocolError::Timeout,
        _ => ProtocolError::SerialError(e.to_string()),
    }
}

/// [`Transport`] over a physical (or virtual USB) serial port
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open a serial port for the control dialog.
    ///
    /// The control dialog always runs 8 data bits, no parity, one stop
    /// bit, no flow control; only the baud rate and read timeout vary.
    pub fn open(name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, ProtocolError> {
        let mut port = serialport::new(name, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

        port.set_data_bits(serialport::DataBits::Eight)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        port.set_parity(serialport::Parity::None)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        port.set_stop_bits(serialport::StopBits::One)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
        port.set_flow_control(serialport::FlowControl::None)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))?;

        Ok(Self { port: Some(port) })
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>, ProtocolError> {
        self.port.as_mut().ok_or(ProtocolError::NotConnected)
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.port()?.write_all(data).map_err(map_io_error)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError> {
        self.port()?.read_exact(buf).map_err(map_io_error)
    }

    fn read_line(&mut self) -> Result<String, ProtocolError> {
        let port = self.port()?;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match port.read(&mut byte) {
                // 0 bytes from a serial read means the timeout expired
                Ok(0) => return Err(ProtocolError::Timeout),
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                    if line.len() > MAX_LINE_LENGTH {
                        return Err(ProtocolError::BufferOverflow);
                    }
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    return Err(ProtocolError::Timeout);
                }
                Err(e) => return Err(ProtocolError::SerialError(e.to_string())),
            }
        }

        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        self.port()?
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| ProtocolError::SerialError(e.to_string()))
    }

    fn close(&mut self) -> Result<(), ProtocolError> {
        // Dropping the handle releases the port
        self.port = None;
        Ok(())
    }
}
