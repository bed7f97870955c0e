//! # LM048 Core Library
//!
//! Core functionality for configuring LM048 Bluetooth to serial adapter
//! modules over their AT command dialect.

#![warn(missing_docs)]

//!
//! This library provides:
//! - Session handshake with the module (wake preamble + liveness ping)
//! - AT command framing over a half-duplex serial link
//! - Typed read/write access to the module's serial settings
//!   (baud rate, parity, stop bits, flow control)
//!
//! Port discovery and all interactive prompting belong to the calling
//! shell; the core only ever receives an already-identified port name.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lm048_core::protocol::{BaudRate, Session};
//!
//! // Handshake with the module on a chosen port
//! let mut session = Session::open("/dev/ttyUSB0")?;
//! println!("Connected to device - {}", session.device_name()?);
//!
//! // Read and change the configured data baud rate
//! let baud: BaudRate = session.read_setting()?;
//! session.write_setting(BaudRate::from_bps(115_200)?)?;
//!
//! // Leave command mode and release the port
//! session.shutdown()?;
//! ```

pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{
        BaudRate, Command, FlowControl, Parity, ProtocolError, SerialTransport, Session,
        SessionConfig, Setting, StopBits, Transport,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
