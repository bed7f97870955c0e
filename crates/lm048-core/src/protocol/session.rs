//! Session management
//!
//! Handles the session lifecycle with the module: wake handshake,
//! command/reply exchanges, and release of the serial port.

use std::time::Duration;

use tracing::{debug, warn};

use super::{
    Command, ProtocolError, SerialTransport, Setting, Transport, CONTROL_BAUD_RATE, READ_TIMEOUT,
    SETTLE_DELAY, WAKE_ACK, WAKE_PREAMBLE,
};

/// Session configuration
///
/// The defaults are the module's fixed control-session parameters; tests
/// substitute a zero settle delay to run against a simulated transport.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Baud rate of the control dialog itself
    pub control_baud: u32,
    /// Timeout applied to every read
    pub read_timeout: Duration,
    /// Wait between opening the port and sending the wake preamble
    pub settle_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            control_baud: CONTROL_BAUD_RATE,
            read_timeout: READ_TIMEOUT,
            settle_delay: SETTLE_DELAY,
        }
    }
}

/// An open, authenticated control session with one module.
///
/// Created by a successful handshake and exclusively owned by the caller.
/// The module is half-duplex: exchanges are strictly sequential, and a
/// command is atomic once its write begins. Call
/// [`shutdown`](Session::shutdown) (or at least [`close`](Session::close))
/// when done, on error paths too; an open serial port is a leaked
/// resource.
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
}

impl Session<SerialTransport> {
    /// Open a port and perform the handshake with default parameters
    pub fn open(port_name: &str) -> Result<Self, ProtocolError> {
        Self::open_with(port_name, SessionConfig::default())
    }

    /// Open a port and perform the handshake with explicit parameters
    pub fn open_with(port_name: &str, config: SessionConfig) -> Result<Self, ProtocolError> {
        let transport = SerialTransport::open(port_name, config.control_baud, config.read_timeout)?;
        Self::establish(transport, config)
    }
}

impl<T: Transport> Session<T> {
    /// Perform the wake handshake over an already-open transport.
    ///
    /// Steps, none retried: wait the settle delay, write the wake
    /// preamble, read the 2-byte acknowledgement, then verify liveness
    /// with a ping. Any mismatch, short read, or timeout fails the
    /// handshake and closes the transport; the caller decides whether to
    /// try another port.
    pub fn establish(mut transport: T, config: SessionConfig) -> Result<Self, ProtocolError> {
        // The module ignores the wake sequence until it has settled
        std::thread::sleep(config.settle_delay);

        if let Err(e) = Self::wake(&mut transport) {
            let _ = transport.close();
            return Err(e);
        }

        let mut session = Self { transport, config };
        match session.ping() {
            Ok(()) => {
                debug!("handshake complete");
                Ok(session)
            }
            Err(e) => {
                let _ = session.transport.close();
                Err(e)
            }
        }
    }

    fn wake(transport: &mut T) -> Result<(), ProtocolError> {
        debug!("sending wake preamble");
        transport.write_all(&WAKE_PREAMBLE)?;

        let mut ack = [0u8; 2];
        match transport.read_exact(&mut ack) {
            Ok(()) => {}
            Err(ProtocolError::Timeout) => {
                return Err(ProtocolError::HandshakeFailed(
                    "no wake acknowledgement from module".to_string(),
                ));
            }
            Err(e) => return Err(e),
        }

        if ack != WAKE_ACK {
            return Err(ProtocolError::HandshakeFailed(format!(
                "unexpected wake acknowledgement: {ack:02X?}"
            )));
        }
        Ok(())
    }

    fn ping(&mut self) -> Result<(), ProtocolError> {
        let reply = self.send(&Command::ping())?;
        if reply != "OK" {
            return Err(ProtocolError::HandshakeFailed(format!(
                "ping answered {reply:?}, expected \"OK\""
            )));
        }
        Ok(())
    }

    /// Send a command and collect its reply.
    ///
    /// The module echoes the command back as its first line and emits one
    /// trailing prompt line after the payload; both are discarded here.
    /// This framing must be drained completely for every command, or all
    /// later exchanges in the session parse one line off.
    pub fn send(&mut self, command: &Command) -> Result<String, ProtocolError> {
        // Stale bytes from a prior exchange would bleed into this reply
        self.transport.clear_input()?;

        debug!(command = command.text(), "sending command");
        self.transport.write_all(&command.to_bytes())?;

        let echo = self.transport.read_line()?;
        debug!(echo = echo.trim_end(), "discarded echo line");

        let mut reply = String::new();
        for _ in 0..command.reply_lines() {
            reply.push_str(&self.transport.read_line()?);
        }

        let _trailer = self.transport.read_line()?;

        Ok(reply.trim().to_string())
    }

    /// Query the device's human-readable name
    pub fn device_name(&mut self) -> Result<String, ProtocolError> {
        self.send(&Command::device_name())
    }

    /// Read the current value of one setting family
    pub fn read_setting<S: Setting>(&mut self) -> Result<S, ProtocolError> {
        let reply = self.send(&Command::query(S::QUERY))?;
        S::parse(&reply)
    }

    /// Write a setting value and return the module's raw acknowledgement.
    ///
    /// The write is not verified here; callers re-read the setting
    /// afterwards to confirm the value took effect.
    pub fn write_setting<S: Setting>(&mut self, value: S) -> Result<String, ProtocolError> {
        let token = value.token()?;
        self.send(&Command::set(token))
    }

    /// Send `AT+AUTO` to leave command mode, fire-and-forget.
    ///
    /// The reply is ignored and failures are swallowed; the module drops
    /// out of the command dialog either way.
    pub fn return_to_data_mode(&mut self) {
        if let Err(e) = self.send(&Command::return_to_data_mode()) {
            warn!(error = %e, "return to data mode not acknowledged");
        }
    }

    /// The configuration this session was established with
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Release the serial port without leaving command mode
    pub fn close(mut self) -> Result<(), ProtocolError> {
        self.transport.close()
    }

    /// Leave command mode (best effort) and release the serial port
    pub fn shutdown(mut self) -> Result<(), ProtocolError> {
        self.return_to_data_mode();
        self.transport.close()
    }
}
