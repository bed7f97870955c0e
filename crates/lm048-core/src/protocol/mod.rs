//! AT Command Protocol
//!
//! Implements the LM048 control-session protocol: wake handshake, command
//! framing, and the token codec for the module's serial settings.
//!
//! The module is half-duplex and chatty: every command is echoed back,
//! followed by the payload lines and one trailing prompt line. The framing
//! here reproduces that shape exactly; skipping or adding a single line
//! desynchronizes every later exchange in the session.

mod command;
mod error;
mod session;
mod settings;
mod transport;

pub use command::Command;
pub use error::ProtocolError;
pub use session::{Session, SessionConfig};
pub use settings::{BaudRate, FlowControl, Parity, Setting, StopBits};
pub use transport::{SerialTransport, Transport};

use std::time::Duration;

/// Baud rate of the control session itself, independent of the data baud
/// setting being read or written
pub const CONTROL_BAUD_RATE: u32 = 921_600;

/// Read timeout for every control-session read
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between opening the port and sending the wake preamble; the
/// module ignores the wake sequence until it has settled after power-up
pub const SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Wake preamble: eight sentinel bytes followed by a carriage return
pub const WAKE_PREAMBLE: [u8; 9] = [
    0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0x0D,
];

/// Acknowledgement the module sends after a successful wake preamble
pub const WAKE_ACK: [u8; 2] = [0xBB, 0xAA];

/// Maximum accepted length of a single reply line
pub const MAX_LINE_LENGTH: usize = 512;
