//! Protocol errors

use thiserror::Error;

/// Errors that can occur during protocol communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Read timed out")]
    Timeout,

    #[error("Not connected to module")]
    NotConnected,

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Unrecognized {family} token '{token}' in module reply")]
    UnknownToken { family: &'static str, token: String },

    #[error("Unsupported {family} value: {value}")]
    UnsupportedValue { family: &'static str, value: String },

    #[error("Buffer overflow: reply line too large")]
    BufferOverflow,
}
